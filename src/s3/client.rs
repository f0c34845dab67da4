//! S3 client implementation with bucket and object operations
//!
//! Each operation builds one [`S3Request`], signs it when credentials are
//! configured, sends it once through the [`Transport`], and interprets the
//! response against that operation's success status.

use crate::config::ClientConfig;
use crate::s3::endpoint::Endpoint;
use crate::s3::error::{Result, S3Error};
use crate::s3::request::{ByteRange, S3Request};
use crate::s3::response::{self, expect_status};
use crate::s3::signer::{Credentials, RequestSigner, S3SignerV4};
use crate::s3::stream::ObjectStream;
use crate::s3::transport::{HttpResponse, HyperTransport, Transport};
use crate::s3::types::{Acl, BucketListing, CreateBucketConfiguration, ObjectStat};
use crate::s3::xml;
use hyper::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Client for an S3-compatible service.
///
/// Endpoint, credentials and configuration are fixed at construction, so a
/// client can be shared freely across tasks. Clone is cheap.
#[derive(Clone)]
pub struct S3Client {
    endpoint: Endpoint,
    credentials: Option<Credentials>,
    config: Arc<ClientConfig>,
    signer: Arc<dyn RequestSigner>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for S3Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Client")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl S3Client {
    /// Create a client with default configuration
    pub fn new(url: &str, credentials: Option<Credentials>) -> Result<Self> {
        Self::with_config(url, credentials, ClientConfig::default())
    }

    /// Create a client that sends unsigned requests
    pub fn anonymous(url: &str) -> Result<Self> {
        Self::new(url, None)
    }

    /// Create a client with explicit configuration
    pub fn with_config(
        url: &str,
        credentials: Option<Credentials>,
        config: ClientConfig,
    ) -> Result<Self> {
        config.validate().map_err(S3Error::InvalidArgument)?;
        let endpoint = Endpoint::resolve(url)?;
        let transport = HyperTransport::new(&config)?;
        let signer = S3SignerV4::new(config.region.clone());

        tracing::debug!(
            endpoint = %endpoint,
            region = %config.region,
            anonymous = credentials.is_none(),
            "s3 client created"
        );

        Ok(Self {
            endpoint,
            credentials,
            config: Arc::new(config),
            signer: Arc::new(signer),
            transport: Arc::new(transport),
        })
    }

    /// Replace the transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the signing scheme
    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = signer;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }

    /// Bind, sign and send one request
    async fn execute(&self, request: S3Request) -> Result<HttpResponse> {
        let request = request.header("user-agent", self.config.user_agent.as_str());
        let mut http = request.into_http(&self.endpoint)?;
        if let Some(credentials) = &self.credentials {
            http = self.signer.sign(http, credentials)?;
        }

        let method = http.method.clone();
        let url = http.url.clone();
        let response = self.transport.send(http).await?;

        tracing::debug!(
            method = %method,
            url = %url,
            status = response.status.as_u16(),
            "s3 request"
        );
        Ok(response)
    }

    /// Whether the bucket exists and is reachable.
    ///
    /// True only for status 200; every other status is `false`. Only
    /// transport failures are returned as errors.
    #[tracing::instrument(name = "s3.bucket_exists", level = "debug", skip(self), err)]
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let response = self
            .execute(S3Request::new(Method::HEAD).bucket(bucket))
            .await?;
        Ok(response.status == StatusCode::OK)
    }

    /// Create a bucket in the configured region with a canned ACL
    #[tracing::instrument(name = "s3.make_bucket", level = "debug", skip(self), err)]
    pub async fn make_bucket(&self, bucket: &str, acl: Acl) -> Result<()> {
        let config = CreateBucketConfiguration::new(self.config.region.clone());
        let body = xml::to_xml(&config)?;

        let request = S3Request::new(Method::PUT)
            .bucket(bucket)
            .header("x-amz-acl", acl.as_str())
            .body(body, "application/xml");

        let response = self.execute(request).await?;
        drain(expect_status(response, &[StatusCode::NO_CONTENT]).await?).await
    }

    /// Create a private bucket
    pub async fn make_bucket_private(&self, bucket: &str) -> Result<()> {
        self.make_bucket(bucket, Acl::Private).await
    }

    /// Delete an empty bucket
    #[tracing::instrument(name = "s3.remove_bucket", level = "debug", skip(self), err)]
    pub async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        let response = self
            .execute(S3Request::new(Method::DELETE).bucket(bucket))
            .await?;
        drain(expect_status(response, &[StatusCode::NO_CONTENT, StatusCode::OK]).await?).await
    }

    /// Fetch the bucket ACL.
    ///
    /// The request is sent and failures are reported, but the ACL document
    /// itself is not parsed yet: a successful response yields
    /// [`S3Error::Unimplemented`].
    #[tracing::instrument(name = "s3.get_bucket_acl", level = "debug", skip(self), err)]
    pub async fn get_bucket_acl(&self, bucket: &str) -> Result<Acl> {
        let request = S3Request::new(Method::GET).bucket(bucket).subresource("acl");
        let response = self.execute(request).await?;
        drain(expect_status(response, &[StatusCode::OK]).await?).await?;
        Err(S3Error::Unimplemented("bucket ACL parsing"))
    }

    /// Apply a canned ACL to a bucket
    #[tracing::instrument(name = "s3.set_bucket_acl", level = "debug", skip(self), err)]
    pub async fn set_bucket_acl(&self, bucket: &str, acl: Acl) -> Result<()> {
        let request = S3Request::new(Method::PUT)
            .bucket(bucket)
            .subresource("acl")
            .header("x-amz-acl", acl.as_str());
        let response = self.execute(request).await?;
        drain(expect_status(response, &[StatusCode::OK]).await?).await
    }

    /// List all buckets owned by the caller
    #[tracing::instrument(name = "s3.list_buckets", level = "debug", skip(self), err)]
    pub async fn list_buckets(&self) -> Result<BucketListing> {
        let response = self.execute(S3Request::new(Method::GET)).await?;
        let response = expect_status(response, &[StatusCode::OK]).await?;
        response::decode_body(response).await
    }

    /// Stream a whole object
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        self.get_object_with_range(bucket, key, None).await
    }

    /// Stream an object from `offset` to its end
    pub async fn get_object_from(&self, bucket: &str, key: &str, offset: u64) -> Result<ObjectStream> {
        self.get_object_with_range(bucket, key, Some(ByteRange::from_offset(offset)))
            .await
    }

    /// Stream `length` bytes of an object starting at `offset`
    pub async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
    ) -> Result<ObjectStream> {
        let range = ByteRange::new(offset, length)?;
        self.get_object_with_range(bucket, key, Some(range)).await
    }

    /// Stream an object, optionally restricted to a byte range.
    ///
    /// A ranged read accepts 206 as well as 200 (servers may ignore `Range`).
    #[tracing::instrument(name = "s3.get_object", level = "debug", skip(self), err)]
    pub async fn get_object_with_range(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> Result<ObjectStream> {
        let request = S3Request::new(Method::GET)
            .bucket(bucket)
            .key(key)
            .range(range);

        let expected: &[StatusCode] = if range.is_some() {
            &[StatusCode::OK, StatusCode::PARTIAL_CONTENT]
        } else {
            &[StatusCode::OK]
        };

        let response = self.execute(request).await?;
        let response = expect_status(response, expected).await?;

        let content_length = response
            .header_str("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok());

        Ok(ObjectStream::new(response.body, content_length, range))
    }

    /// Object metadata from a HEAD request
    #[tracing::instrument(name = "s3.stat_object", level = "debug", skip(self), err)]
    pub async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectStat> {
        let request = S3Request::new(Method::HEAD).bucket(bucket).key(key);
        let response = self.execute(request).await?;
        let response = expect_status(response, &[StatusCode::OK]).await?;

        let size = match response.header_str("content-length") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                S3Error::InvalidResponse(format!("invalid Content-Length: {}", value))
            })?,
            None => 0,
        };

        let mut stat = ObjectStat::new(key.to_string(), size);
        stat.last_modified = response.header_str("last-modified").map(str::to_string);
        stat.etag = response
            .header_str("etag")
            .map(|v| v.trim_matches('"').to_string())
            .unwrap_or_default();

        Ok(stat)
    }
}

/// Drain a success body so the connection can go back to the pool
async fn drain(response: HttpResponse) -> Result<()> {
    response.bytes().await?;
    Ok(())
}
