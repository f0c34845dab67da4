//! Response interpretation
//!
//! Every operation except `bucket_exists` goes through the same two-way
//! split: the response status is checked against the operation's own list
//! of success codes, and anything else becomes a typed failure built from
//! the body.

use crate::s3::error::{Result, S3Error};
use crate::s3::transport::HttpResponse;
use crate::s3::types::ErrorResponse;
use crate::s3::xml::{self, XmlDecode};
use bytes::Bytes;
use hyper::StatusCode;

/// Pass the response through when its status is one of `expected`,
/// otherwise turn it into a failure
pub async fn expect_status(response: HttpResponse, expected: &[StatusCode]) -> Result<HttpResponse> {
    if expected.contains(&response.status) {
        Ok(response)
    } else {
        Err(into_error(response).await)
    }
}

/// Build the failure for a non-success response.
///
/// A decodable `<Error>` body gives [`S3Error::Service`]; anything else
/// (empty, truncated, HTML from a proxy) gives
/// [`S3Error::UndecodableResponse`] with the bytes preserved.
pub async fn into_error(response: HttpResponse) -> S3Error {
    let status = response.status;
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return e,
    };
    error_from_body(status, body)
}

pub fn error_from_body(status: StatusCode, body: Bytes) -> S3Error {
    match xml::from_xml::<ErrorResponse>(&body) {
        Ok(mut error) => {
            error.raw_xml = String::from_utf8_lossy(&body).into_owned();
            error.raw_body = body;
            tracing::debug!(
                status = status.as_u16(),
                code = %error.code,
                request_id = ?error.request_id,
                "s3 service error"
            );
            S3Error::Service { status, error }
        }
        Err(e) => {
            tracing::debug!(
                status = status.as_u16(),
                body_len = body.len(),
                error = %e,
                "undecodable error response"
            );
            S3Error::UndecodableResponse {
                status,
                reason: e.to_string(),
                body,
            }
        }
    }
}

/// Collect a success body and decode it as `T`
pub async fn decode_body<T: XmlDecode>(response: HttpResponse) -> Result<T> {
    let status = response.status;
    let body = response.bytes().await?;
    xml::from_xml::<T>(&body).map_err(|e| S3Error::UndecodableResponse {
        status,
        reason: e.to_string(),
        body,
    })
}
