//! s3mini - small async client for S3-compatible object stores

pub mod cli;
pub mod config;
pub mod s3;

pub use config::{ClientConfig, Config};
pub use s3::{Acl, ByteRange, Credentials, ObjectStream, S3Client, S3Error};
