//! HTTP transport for signed S3 requests
//!
//! [`Transport`] is the seam between request construction and the wire.
//! [`HyperTransport`] is the production implementation:
//! - HTTP/1.1 only
//! - Pooled idle connections (size and timeout from [`ClientConfig`])
//! - TCP_NODELAY and TCP keepalive
//! - native-tls (OpenSSL) for TLS
//! - Response bodies are handed back as a lazy byte stream, never buffered here
//!
//! No retries happen at this layer; a request is sent exactly once.

use crate::config::ClientConfig;
use crate::s3::error::{Result, S3Error};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use http_body_util::{BodyStream, Full};
use hyper::header::HeaderMap;
use hyper::{Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

/// Lazy, finite, single-pass sequence of body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A request bound to an absolute URL. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

/// Raw response: status, header multimap and a streaming body
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl HttpResponse {
    /// Response with an in-memory body
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let chunks = if body.is_empty() { None } else { Some(Ok(body)) };
        Self {
            status,
            headers,
            body: Box::pin(stream::iter(chunks)),
        }
    }

    /// First value of a header, if present and valid UTF-8
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Drain the body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        collect_stream(self.body).await
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

pub(crate) async fn collect_stream(mut body: ByteStream) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// Sends one signed request and returns the raw response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// hyper-based transport
///
/// Clone is cheap - the underlying HTTP client uses Arc internally.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = if config.insecure_tls {
            tracing::warn!("INSECURE TLS MODE ENABLED: Certificate verification is disabled!");
            TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
        } else {
            TlsConnector::new()
        }
        .map_err(|e| S3Error::Transport(format!("Failed to build TLS connector: {}", e)))?;

        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .set_host(true)
            .build(https);

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut req = Request::builder().method(request.method).uri(&request.url);
        for (key, value) in request.headers.iter() {
            req = req.header(key, value);
        }
        let req = req.body(Full::new(request.body))?;

        let response = self.client.request(req).await.map_err(|e| {
            if is_canceled(&e) {
                S3Error::Cancelled
            } else {
                S3Error::Transport(format!("Request failed: {}", e))
            }
        })?;

        let (parts, body) = response.into_parts();
        let chunks = BodyStream::new(body).filter_map(|frame| async move {
            match frame {
                Ok(frame) => frame.into_data().ok().map(Ok),
                Err(e) if e.is_canceled() => Some(Err(S3Error::Cancelled)),
                Err(e) => Some(Err(S3Error::Transport(format!("Body error: {}", e)))),
            }
        });

        Ok(HttpResponse {
            status: parts.status,
            headers: parts.headers,
            body: Box::pin(chunks),
        })
    }
}

/// Walk the source chain looking for a canceled hyper error
fn is_canceled(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
            if hyper_err.is_canceled() {
                return true;
            }
        }
        current = e.source();
    }
    false
}
