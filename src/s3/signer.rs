//! Request signing
//!
//! [`RequestSigner`] is the only thing request construction knows about
//! authentication. [`S3SignerV4`] implements AWS Signature Version 4:
//! - Daily signing key cache (avoids 4 HMAC operations per request)
//! - Constant empty payload hash (avoids SHA256 for empty bodies)
//! - Zero-allocation URI encoding (hex lookup table, no format!())
//! - Fixed-size [u8; 32] arrays instead of Vec<u8> for HMAC results

use crate::s3::error::Result;
use crate::s3::transport::HttpRequest;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

type HmacSha256 = Hmac<Sha256>;

/// Hex lookup table for zero-allocation percent encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Pre-computed SHA256 hash of empty payload (avoids hashing empty body on every GET/HEAD/DELETE)
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Access/secret key pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Turns an unsigned request into an authenticated one.
///
/// Implementations add headers only; method, URL and body pass through.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: HttpRequest, credentials: &Credentials) -> Result<HttpRequest>;
}

struct CachedSigningKey {
    date_stamp: String,
    access_key: String,
    /// SHA-256 of the secret the key was derived from
    secret_digest: [u8; 32],
    key: [u8; 32],
}

/// AWS Signature Version 4 signer
pub struct S3SignerV4 {
    region: String,
    service: String,
    /// Cached signing key, valid for one date and one credential pair.
    /// The signing key only changes daily, so caching saves 4 HMAC operations per request.
    cached_signing_key: Mutex<Option<CachedSigningKey>>,
}

impl Clone for S3SignerV4 {
    fn clone(&self) -> Self {
        Self {
            region: self.region.clone(),
            service: self.service.clone(),
            // Each clone gets its own cache (populated on first use)
            cached_signing_key: Mutex::new(None),
        }
    }
}

impl fmt::Debug for S3SignerV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3SignerV4")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl RequestSigner for S3SignerV4 {
    fn sign(&self, request: HttpRequest, credentials: &Credentials) -> Result<HttpRequest> {
        Ok(self.sign_at(request, credentials, Utc::now()))
    }
}

impl S3SignerV4 {
    /// Create a new S3 signer for `region`
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: "s3".to_string(),
            cached_signing_key: Mutex::new(None),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign with an explicit timestamp. Same inputs give the same headers.
    pub fn sign_at(
        &self,
        mut request: HttpRequest,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> HttpRequest {
        let payload_hash = if request.body.is_empty() {
            EMPTY_SHA256.to_string()
        } else {
            hex::encode(Sha256::digest(&request.body))
        };

        let headers = std::mem::take(&mut request.headers);
        request.headers = self.sign_headers(
            request.method.as_str(),
            &request.url,
            headers,
            &payload_hash,
            credentials,
            now,
        );
        request
    }

    fn sign_headers(
        &self,
        method: &str,
        url: &str,
        mut headers: BTreeMap<String, String>,
        payload_hash: &str,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        let (host, path, query) = Self::parse_url_fast(url);

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        // Required headers (all lowercase for canonical form)
        headers.insert("host".to_string(), host.to_string());
        headers.insert("x-amz-date".to_string(), amz_date.clone());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.to_string());

        let canonical_query = Self::create_canonical_query_string(query);
        let canonical_headers = Self::create_canonical_headers(&headers);
        let signed_headers = Self::create_signed_headers(&headers);

        // Path is already URI-encoded by the request builder
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, path, canonical_query, canonical_headers, signed_headers, payload_hash
        );

        tracing::trace!(
            method,
            url,
            canonical_request = %canonical_request,
            "sigv4 canonical request"
        );

        let credential_scope =
            format!("{}/{}/{}/aws4_request", date_stamp, self.region, self.service);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM, amz_date, credential_scope, canonical_request_hash
        );

        let signature = self.calculate_signature(&date_stamp, credentials, &string_to_sign);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key, credential_scope, signed_headers, signature
        );
        headers.insert("authorization".to_string(), authorization);

        headers
    }

    /// Fast URL component extraction without heap allocation.
    ///
    /// Returns (host_with_port, path, query) as `&str` slices into the original URL.
    /// Strips default ports (:443 for https, :80 for http) from the host.
    fn parse_url_fast(url: &str) -> (&str, &str, &str) {
        let after_scheme = if let Some(rest) = url.strip_prefix("https://") {
            rest
        } else if let Some(rest) = url.strip_prefix("http://") {
            rest
        } else {
            url
        };

        let (authority, path_and_query) = match after_scheme.find('/') {
            Some(pos) => (&after_scheme[..pos], &after_scheme[pos..]),
            None => (after_scheme, "/"),
        };

        let (path, query) = match path_and_query.find('?') {
            Some(pos) => (&path_and_query[..pos], &path_and_query[pos + 1..]),
            None => (path_and_query, ""),
        };

        let host = if url.starts_with("https") {
            authority.strip_suffix(":443").unwrap_or(authority)
        } else {
            authority.strip_suffix(":80").unwrap_or(authority)
        };

        (host, path, query)
    }

    /// Create canonical query string (sorted by parameter name)
    ///
    /// Fast path: already canonical, sorted, and every param has `=`.
    /// Value-less sub-resources like `?acl` take the slow path and become `acl=`.
    fn create_canonical_query_string(query: &str) -> String {
        if query.is_empty() {
            return String::new();
        }

        let all_canonical = query.bytes().all(|b| matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
            | b'-' | b'_' | b'.' | b'~'
            | b'=' | b'&' | b'%'
        ));

        if all_canonical {
            let mut sorted = true;
            let mut all_have_equals = true;
            let mut last_key: &str = "";
            for pair in query.split('&') {
                let key = match pair.find('=') {
                    Some(pos) => &pair[..pos],
                    None => {
                        all_have_equals = false;
                        pair
                    }
                };
                if key < last_key {
                    sorted = false;
                    break;
                }
                last_key = key;
            }
            if sorted && all_have_equals {
                return query.to_string();
            }
        }

        // Slow path: decode, re-encode, sort
        let mut params: Vec<(String, String)> = Vec::new();
        for pair in query.split('&') {
            if let Some(pos) = pair.find('=') {
                let key = &pair[..pos];
                let value = &pair[pos + 1..];
                let decoded_key = urlencoding::decode(key).unwrap_or_else(|_| key.into());
                let decoded_value = urlencoding::decode(value).unwrap_or_else(|_| value.into());
                params.push((
                    Self::uri_encode(&decoded_key, true),
                    Self::uri_encode(&decoded_value, true),
                ));
            } else {
                let decoded = urlencoding::decode(pair).unwrap_or_else(|_| pair.into());
                params.push((Self::uri_encode(&decoded, true), String::new()));
            }
        }

        params.sort_unstable();

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Canonical headers - keys are already lowercase and sorted by BTreeMap
    fn create_canonical_headers(headers: &BTreeMap<String, String>) -> String {
        let mut result = String::with_capacity(headers.len() * 64);
        for (k, v) in headers {
            result.push_str(k);
            result.push(':');
            result.push_str(v.trim());
            result.push('\n');
        }
        result
    }

    fn create_signed_headers(headers: &BTreeMap<String, String>) -> String {
        headers.keys().map(String::as_str).collect::<Vec<_>>().join(";")
    }

    fn calculate_signature(
        &self,
        date_stamp: &str,
        credentials: &Credentials,
        string_to_sign: &str,
    ) -> String {
        let signing_key = {
            let mut cache = self
                .cached_signing_key
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut secret_digest = [0u8; 32];
            secret_digest.copy_from_slice(&Sha256::digest(credentials.secret_key.as_bytes()));
            match cache.as_ref() {
                Some(cached)
                    if cached.date_stamp == date_stamp
                        && cached.access_key == credentials.access_key
                        && cached.secret_digest == secret_digest =>
                {
                    cached.key
                }
                _ => {
                    let key = self.derive_signing_key(date_stamp, &credentials.secret_key);
                    *cache = Some(CachedSigningKey {
                        date_stamp: date_stamp.to_string(),
                        access_key: credentials.access_key.clone(),
                        secret_digest,
                        key,
                    });
                    key
                }
            }
        };

        hex::encode(Self::hmac_sha256(&signing_key, string_to_sign.as_bytes()))
    }

    /// Derive signing key from date stamp (4 chained HMAC operations)
    fn derive_signing_key(&self, date_stamp: &str, secret_key: &str) -> [u8; 32] {
        let aws4_key = format!("AWS4{}", secret_key);
        let k_date = Self::hmac_sha256(aws4_key.as_bytes(), date_stamp.as_bytes());
        let k_region = Self::hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = Self::hmac_sha256(&k_region, self.service.as_bytes());
        Self::hmac_sha256(&k_service, b"aws4_request")
    }

    /// HMAC-SHA256 returning fixed-size array (no heap allocation)
    fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(msg);
        let result = mac.finalize().into_bytes();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        output
    }

    /// URI encode a string (RFC 3986) using hex lookup table
    fn uri_encode(s: &str, encode_slash: bool) -> String {
        let mut result = String::with_capacity(s.len() + 16);
        for byte in s.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    result.push(byte as char);
                }
                b'/' if !encode_slash => {
                    result.push('/');
                }
                _ => {
                    result.push('%');
                    result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                    result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
                }
            }
        }
        result
    }
}
