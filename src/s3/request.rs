//! Outbound request construction
//!
//! An [`S3Request`] describes one operation in S3 terms (bucket, key,
//! sub-resource, headers, body). [`S3Request::into_http`] turns it into an
//! absolute-URL [`HttpRequest`] against a resolved endpoint, ready for
//! signing and transmission.

use crate::s3::endpoint::Endpoint;
use crate::s3::error::{Result, S3Error};
use crate::s3::transport::HttpRequest;
use bytes::Bytes;
use hyper::Method;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Hex lookup table for URI encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Byte range of an object read, mapped onto the HTTP `Range` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    offset: u64,
    length: Option<u64>,
}

impl ByteRange {
    /// Everything from `offset` to the end of the object
    pub fn from_offset(offset: u64) -> Self {
        Self {
            offset,
            length: None,
        }
    }

    /// `length` bytes starting at `offset`
    pub fn new(offset: u64, length: u64) -> Result<Self> {
        if length == 0 {
            return Err(S3Error::InvalidArgument(
                "range length must be greater than zero".to_string(),
            ));
        }
        if offset.checked_add(length - 1).is_none() {
            return Err(S3Error::InvalidArgument(format!(
                "range {}+{} overflows u64",
                offset, length
            )));
        }
        Ok(Self {
            offset,
            length: Some(length),
        })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Inclusive upper bound, if the range is bounded
    pub fn last_byte(&self) -> Option<u64> {
        // length > 0 and no overflow are checked in `new`
        self.length.map(|len| self.offset + (len - 1))
    }

    /// Value of the `Range` header
    pub fn header_value(&self) -> String {
        match self.last_byte() {
            Some(last) => format!("bytes={}-{}", self.offset, last),
            None => format!("bytes={}-", self.offset),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

/// One S3 operation before it is bound to an endpoint
#[derive(Debug, Clone)]
pub struct S3Request {
    method: Method,
    bucket: Option<String>,
    key: Option<String>,
    subresource: Option<&'static str>,
    headers: BTreeMap<String, String>,
    body: Bytes,
}

impl S3Request {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            bucket: None,
            key: None,
            subresource: None,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_string());
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Value-less query sub-resource such as `acl`
    pub fn subresource(mut self, name: &'static str) -> Self {
        self.subresource = Some(name);
        self
    }

    /// Add a header; names are stored lowercase
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn range(self, range: Option<ByteRange>) -> Self {
        match range {
            Some(range) => self.header("range", range.header_value()),
            None => self,
        }
    }

    /// Attach a body along with its content type and length
    pub fn body(self, body: impl Into<Bytes>, content_type: &str) -> Self {
        let body = body.into();
        let mut req = self
            .header("content-type", content_type)
            .header("content-length", body.len().to_string());
        req.body = body;
        req
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// `/`, `/{bucket}` or `/{bucket}/{key}`, segments percent-encoded
    pub fn path(&self) -> String {
        let mut path = String::with_capacity(64);
        path.push('/');
        if let Some(bucket) = &self.bucket {
            path.push_str(&encode_path_segment(bucket));
            if let Some(key) = &self.key {
                path.push('/');
                path.push_str(&encode_path_segment(key));
            }
        }
        path
    }

    /// Path plus sub-resource query
    pub fn path_and_query(&self) -> String {
        let mut path = self.path();
        if let Some(sub) = self.subresource {
            path.push('?');
            path.push_str(sub);
        }
        path
    }

    /// Reject names that would address a different resource: an empty
    /// bucket or key, a bucket containing `/`, or a key starting with `/`
    pub fn validate(&self) -> Result<()> {
        if let Some(bucket) = &self.bucket {
            if bucket.is_empty() {
                return Err(S3Error::InvalidArgument("bucket name must not be empty".to_string()));
            }
            if bucket.contains('/') {
                return Err(S3Error::InvalidArgument(format!(
                    "bucket name must not contain '/': {}",
                    bucket
                )));
            }
        }
        if let Some(key) = &self.key {
            if key.is_empty() {
                return Err(S3Error::InvalidArgument("object key must not be empty".to_string()));
            }
            if key.starts_with('/') {
                return Err(S3Error::InvalidArgument(format!(
                    "object key must not start with '/': {}",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Validate and bind the request to an endpoint
    pub fn into_http(self, endpoint: &Endpoint) -> Result<HttpRequest> {
        self.validate()?;
        let url = endpoint.url_for(&self.path_and_query());
        Ok(HttpRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// Encode a bucket or key segment, preserving forward slashes.
/// Returns Cow::Borrowed when no encoding is needed.
pub fn encode_path_segment(segment: &str) -> Cow<'_, str> {
    let needs_encoding = segment
        .bytes()
        .any(|b| !matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/'));

    if !needs_encoding {
        return Cow::Borrowed(segment);
    }

    let mut result = String::with_capacity(segment.len() + 32);
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                result.push(byte as char);
            }
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
            }
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::resolve("http://localhost:9000").unwrap()
    }

    #[test]
    fn test_open_range() {
        let range = ByteRange::from_offset(100);
        assert_eq!(range.header_value(), "bytes=100-");
        assert_eq!(range.last_byte(), None);
    }

    #[test]
    fn test_bounded_range() {
        let range = ByteRange::new(100, 50).unwrap();
        assert_eq!(range.header_value(), "bytes=100-149");
        assert_eq!(range.last_byte(), Some(149));

        assert_eq!(ByteRange::new(0, 1).unwrap().header_value(), "bytes=0-0");
        assert_eq!(
            ByteRange::new(u64::MAX, 1).unwrap().header_value(),
            format!("bytes={}-{}", u64::MAX, u64::MAX)
        );
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(ByteRange::new(10, 0), Err(S3Error::InvalidArgument(_))));
        assert!(matches!(ByteRange::new(u64::MAX, 2), Err(S3Error::InvalidArgument(_))));
    }

    #[test]
    fn test_paths() {
        assert_eq!(S3Request::new(Method::GET).path(), "/");
        assert_eq!(S3Request::new(Method::HEAD).bucket("photos").path(), "/photos");
        assert_eq!(
            S3Request::new(Method::GET).bucket("photos").key("2024/cat.jpg").path(),
            "/photos/2024/cat.jpg"
        );
        assert_eq!(
            S3Request::new(Method::GET)
                .bucket("photos")
                .subresource("acl")
                .path_and_query(),
            "/photos?acl"
        );
    }

    #[test]
    fn test_into_http() {
        let http = S3Request::new(Method::GET)
            .bucket("photos")
            .key("cat.jpg")
            .range(Some(ByteRange::from_offset(100)))
            .into_http(&endpoint())
            .unwrap();
        assert_eq!(http.method, Method::GET);
        assert_eq!(http.url, "http://localhost:9000/photos/cat.jpg");
        assert_eq!(http.headers.get("range").map(String::as_str), Some("bytes=100-"));
        assert!(http.body.is_empty());
    }

    #[test]
    fn test_rejects_names_that_change_the_target() {
        let empty_bucket = S3Request::new(Method::HEAD).bucket("").into_http(&endpoint());
        assert!(matches!(empty_bucket, Err(S3Error::InvalidArgument(_))));

        let slash_bucket = S3Request::new(Method::HEAD).bucket("photos/2024").into_http(&endpoint());
        assert!(matches!(slash_bucket, Err(S3Error::InvalidArgument(_))));

        let empty_key = S3Request::new(Method::GET).bucket("photos").key("").into_http(&endpoint());
        assert!(matches!(empty_key, Err(S3Error::InvalidArgument(_))));

        let rooted_key = S3Request::new(Method::GET)
            .bucket("photos")
            .key("/cat.jpg")
            .into_http(&endpoint());
        assert!(matches!(rooted_key, Err(S3Error::InvalidArgument(_))));

        // Inner slashes in keys are fine
        let nested = S3Request::new(Method::GET)
            .bucket("photos")
            .key("2024/07/cat.jpg")
            .into_http(&endpoint())
            .unwrap();
        assert_eq!(nested.url, "http://localhost:9000/photos/2024/07/cat.jpg");

        // Listing the service root has no bucket at all
        assert!(S3Request::new(Method::GET).validate().is_ok());
    }

    #[test]
    fn test_body_sets_content_headers() {
        let req = S3Request::new(Method::PUT)
            .bucket("b")
            .header("X-Amz-Acl", "private")
            .body(b"<xml/>".to_vec(), "application/xml");
        assert_eq!(req.headers().get("x-amz-acl").map(String::as_str), Some("private"));
        assert_eq!(req.headers().get("content-type").map(String::as_str), Some("application/xml"));
        assert_eq!(req.headers().get("content-length").map(String::as_str), Some("6"));
    }

    #[test]
    fn test_encode_path_segment() {
        assert!(matches!(encode_path_segment("path/to/file.txt"), Cow::Borrowed(_)));
        assert_eq!(
            encode_path_segment("path/to/file with spaces.txt"),
            "path/to/file%20with%20spaces.txt"
        );
        assert_eq!(encode_path_segment("a+b?c"), "a%2Bb%3Fc");
    }
}
