//! Service endpoint validation and normalization

use crate::s3::error::{Result, S3Error};
use std::fmt;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Canonical service root: scheme, host and an explicit port.
///
/// Validated once when the client is built; request paths are appended to
/// it verbatim afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Validate a user-supplied base URL.
    ///
    /// Accepts only `http`/`https` URLs with an empty or `/` path and no
    /// query. Fragments are dropped. Missing ports are filled in with the
    /// scheme default.
    pub fn resolve(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| S3Error::InvalidEndpoint(format!("malformed url '{}': {}", url, e)))?;

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => return Err(S3Error::InvalidEndpoint("unsupported scheme".to_string())),
        };

        if parsed.query().is_some() {
            return Err(S3Error::InvalidEndpoint("unexpected query".to_string()));
        }

        let path = parsed.path();
        if !(path.is_empty() || path == "/") {
            return Err(S3Error::InvalidEndpoint("unexpected path".to_string()));
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| S3Error::InvalidEndpoint("missing host".to_string()))?
            .to_string();

        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| S3Error::InvalidEndpoint("missing port".to_string()))?;

        Ok(Self { scheme, host, port })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `{scheme}://{host}:{port}/`
    pub fn root(&self) -> String {
        let mut root = self.authority_url();
        root.push('/');
        root
    }

    /// Absolute URL for a path that starts with `/`
    pub fn url_for(&self, path_and_query: &str) -> String {
        let mut url = self.authority_url();
        url.reserve(path_and_query.len());
        url.push_str(path_and_query);
        url
    }

    fn authority_url(&self) -> String {
        let mut url = String::with_capacity(self.scheme.as_str().len() + self.host.len() + 10);
        url.push_str(self.scheme.as_str());
        url.push_str("://");
        url.push_str(&self.host);
        url.push(':');
        url.push_str(&self.port.to_string());
        url
    }
}

impl FromStr for Endpoint {
    type Err = S3Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root())
    }
}
