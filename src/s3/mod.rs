//! S3 client module with AWS SigV4 signing
//!
//! This module provides:
//! - Endpoint resolution and request building
//! - AWS Signature Version 4 signing
//! - A pluggable HTTP transport (hyper by default)
//! - Bucket operations and streaming object reads
//! - Typed S3 request/response documents

pub mod client;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod response;
pub mod signer;
pub mod stream;
pub mod transport;
pub mod types;
pub mod xml;

// Re-export main types for convenience
pub use client::S3Client;
pub use endpoint::{Endpoint, Scheme};
pub use error::{Result, S3Error};
pub use request::{ByteRange, S3Request};
pub use signer::{Credentials, RequestSigner, S3SignerV4};
pub use stream::ObjectStream;
pub use transport::{ByteStream, HttpRequest, HttpResponse, HyperTransport, Transport};
pub use types::{Acl, Bucket, BucketListing, ErrorResponse, ObjectStat, Owner};
pub use xml::XmlError;
