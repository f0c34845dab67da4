//! S3 types and response structures

use crate::s3::error::{Result, S3Error};
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

/// Canned ACL applied to a bucket via the `x-amz-acl` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Acl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
}

impl Acl {
    /// Header token sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::Private => "private",
            Acl::PublicRead => "public-read",
            Acl::PublicReadWrite => "public-read-write",
            Acl::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Acl {
    type Err = S3Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(Acl::Private),
            "public-read" => Ok(Acl::PublicRead),
            "public-read-write" => Ok(Acl::PublicReadWrite),
            "authenticated-read" => Ok(Acl::AuthenticatedRead),
            other => Err(S3Error::InvalidArgument(format!("unknown ACL: {}", other))),
        }
    }
}

/// Bucket owner as reported by ListBuckets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    /// Canonical user ID
    pub id: String,
    /// Display name (may be empty on S3-compatible servers)
    pub display_name: String,
}

/// Single entry of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    /// Creation date exactly as sent by the service
    pub creation_date: String,
}

/// Result of ListBuckets (`ListAllMyBucketsResult`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketListing {
    pub owner: Option<Owner>,
    /// Buckets in the order the service returned them
    pub buckets: Vec<Bucket>,
}

impl BucketListing {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.name.as_str())
    }
}

/// Object metadata derived from the headers of a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    /// Object key
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Raw `Last-Modified` header value
    pub last_modified: Option<String>,
    /// ETag with surrounding quotes removed
    pub etag: String,
}

impl ObjectStat {
    /// Create a new ObjectStat
    pub fn new(key: String, size: u64) -> Self {
        Self {
            key,
            size,
            last_modified: None,
            etag: String::new(),
        }
    }

    /// Parsed last-modified timestamp.
    ///
    /// The header is kept verbatim; no date format is assumed until the
    /// service's wire format is pinned down.
    pub fn last_modified_time(&self) -> Result<chrono::DateTime<chrono::Utc>> {
        Err(S3Error::Unimplemented("last-modified parsing"))
    }
}

/// Decoded `<Error>` body returned by the service on failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error code (e.g. `NoSuchBucket`)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Resource the error refers to
    pub resource: Option<String>,
    /// Request ID assigned by the service
    pub request_id: Option<String>,
    /// Host ID assigned by the service
    pub host_id: Option<String>,
    /// The body as text, for logging
    pub raw_xml: String,
    /// The body exactly as received
    pub raw_body: Bytes,
}

/// Body of a PUT bucket request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateBucketConfiguration {
    pub location_constraint: String,
}

impl CreateBucketConfiguration {
    pub fn new(location_constraint: impl Into<String>) -> Self {
        Self {
            location_constraint: location_constraint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_tokens() {
        for acl in [
            Acl::Private,
            Acl::PublicRead,
            Acl::PublicReadWrite,
            Acl::AuthenticatedRead,
        ] {
            assert_eq!(acl.as_str().parse::<Acl>().unwrap(), acl);
        }
        assert_eq!(Acl::default(), Acl::Private);
        assert_eq!(Acl::PublicRead.to_string(), "public-read");
        assert!("world-writable".parse::<Acl>().is_err());
    }

    #[test]
    fn test_last_modified_time_is_unimplemented() {
        let mut stat = ObjectStat::new("key".to_string(), 1);
        stat.last_modified = Some("Wed, 12 Oct 2009 17:50:00 GMT".to_string());
        assert!(matches!(
            stat.last_modified_time(),
            Err(S3Error::Unimplemented(_))
        ));
    }

    #[test]
    fn test_listing_names() {
        let listing = BucketListing {
            owner: None,
            buckets: vec![
                Bucket {
                    name: "alpha".to_string(),
                    creation_date: String::new(),
                },
                Bucket {
                    name: "beta".to_string(),
                    creation_date: String::new(),
                },
            ],
        };
        assert_eq!(listing.names().collect::<Vec<_>>(), vec!["alpha", "beta"]);
    }
}
