//! Response, error and reply envelopes.

use std::fmt;

use axum::body::Body;
use axum::http::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::envelope::codec::{base64_body, null_as_default};
use crate::envelope::headers::{expand, HeaderFields};
use crate::error::BridgeError;

/// Outcome of a successfully executed request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    #[serde(default, deserialize_with = "null_as_default")]
    pub header: HeaderFields,

    #[serde(default, with = "base64_body")]
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Rebuild an HTTP response whose body reads back the envelope bytes.
    pub fn into_response(self) -> Result<Response<Body>, BridgeError> {
        let status = StatusCode::from_u16(self.status_code)
            .map_err(|e| BridgeError::Decode(format!("status {}: {}", self.status_code, e)))?;
        let headers = expand(&self.header).map_err(|e| BridgeError::Decode(e.to_string()))?;

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Why the executor could not produce a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The payload was not a request envelope.
    InvalidRequest,
    /// The envelope decoded but no HTTP request could be built from it.
    InvalidTarget,
    /// The outbound call itself failed.
    UpstreamFailed,
    BodyRead,
    Encode,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidTarget => "invalid_target",
            ErrorCode::UpstreamFailed => "upstream_failed",
            ErrorCode::BodyRead => "body_read",
            ErrorCode::Encode => "encode",
            ErrorCode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reply published in place of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub code: ErrorCode,

    /// Human-readable description.
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
        }
    }
}

/// Everything published to a reply destination is one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Response(ResponseEnvelope),
    Error(ErrorEnvelope),
}

impl Reply {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Reply::Error(ErrorEnvelope::new(code, message))
    }

    /// Label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Reply::Response(_) => "response",
            Reply::Error(e) => e.code.as_str(),
        }
    }
}
