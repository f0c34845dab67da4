//! Error taxonomy for S3 client operations

use crate::s3::types::ErrorResponse;
use crate::s3::xml::XmlError;
use bytes::Bytes;
use hyper::StatusCode;
use thiserror::Error;

/// S3 client errors
#[derive(Error, Debug)]
pub enum S3Error {
    /// The base URL handed to the client is not a usable service root
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Non-success status with a decodable `<Error>` body
    #[error("S3 error: {status} {} - {}", .error.code, .error.message)]
    Service {
        status: StatusCode,
        error: ErrorResponse,
    },

    /// Response body could not be decoded; the raw bytes are kept for inspection
    #[error("Undecodable response ({status}): {reason}")]
    UndecodableResponse {
        status: StatusCode,
        reason: String,
        body: Bytes,
    },

    #[error("Not supported yet: {0}")]
    Unimplemented(&'static str),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

pub type Result<T> = std::result::Result<T, S3Error>;

impl S3Error {
    /// HTTP status of the response this error was derived from, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            S3Error::Service { status, .. } | S3Error::UndecodableResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Decoded service error, if the body was a well-formed `<Error>` document
    pub fn service_error(&self) -> Option<&ErrorResponse> {
        match self {
            S3Error::Service { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Raw response body carried by response-derived errors
    pub fn raw_body(&self) -> Option<&[u8]> {
        match self {
            S3Error::Service { error, .. } => Some(&error.raw_body[..]),
            S3Error::UndecodableResponse { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
