//! The real HTTP client the executor calls on the requester's behalf.
//!
//! # Responsibilities
//! - Build an outbound request from an envelope
//! - Execute it and buffer the response body
//! - Classify each failure so it can become an error envelope
//!
//! # Design Decisions
//! - A failed call returns before any response field is touched
//! - Body size is capped while reading, not after
//! - Hop-by-hop headers are stripped; the body is re-framed by the receiver

use std::error::Error as _;
use std::time::Duration;

use axum::http::Method;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::envelope::headers::{collapse, expand, strip_hop_by_hop};
use crate::envelope::{ErrorCode, ErrorEnvelope, RequestEnvelope, ResponseEnvelope};

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The envelope does not describe a request that can be sent.
    #[error("cannot build request: {0}")]
    InvalidTarget(String),

    #[error("upstream call failed: {0}")]
    Call(#[source] reqwest::Error),

    #[error("failed to read upstream body: {0}")]
    BodyRead(String),
}

impl UpstreamError {
    pub fn code(&self) -> ErrorCode {
        match self {
            UpstreamError::InvalidTarget(_) => ErrorCode::InvalidTarget,
            UpstreamError::Call(_) => ErrorCode::UpstreamFailed,
            UpstreamError::BodyRead(_) => ErrorCode::BodyRead,
        }
    }
}

impl From<UpstreamError> for ErrorEnvelope {
    fn from(err: UpstreamError) -> Self {
        // reqwest's Display omits the cause chain ("error sending request").
        let message = match &err {
            UpstreamError::Call(e) => {
                let mut message = err.to_string();
                let mut source = e.source();
                while let Some(cause) = source {
                    message.push_str(": ");
                    message.push_str(&cause.to_string());
                    source = cause.source();
                }
                message
            }
            _ => err.to_string(),
        };
        ErrorEnvelope::new(err.code(), message)
    }
}

/// Executes request envelopes over HTTP. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.respect_proxy_env {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Perform the call an envelope describes.
    pub async fn execute(&self, envelope: RequestEnvelope) -> Result<ResponseEnvelope, UpstreamError> {
        let request = self.build(envelope)?;

        let mut response = self
            .client
            .execute(request)
            .await
            .map_err(UpstreamError::Call)?;

        let status_code = response.status().as_u16();
        let mut headers = std::mem::take(response.headers_mut());
        strip_hop_by_hop(&mut headers);
        let body = self.read_body(response).await?;

        Ok(ResponseEnvelope {
            status_code,
            header: collapse(&headers),
            body,
        })
    }

    fn build(&self, envelope: RequestEnvelope) -> Result<reqwest::Request, UpstreamError> {
        let method = Method::from_bytes(envelope.method.as_bytes()).map_err(|e| {
            UpstreamError::InvalidTarget(format!("method {:?}: {}", envelope.method, e))
        })?;

        let url = reqwest::Url::parse(&envelope.url)
            .map_err(|e| UpstreamError::InvalidTarget(format!("url {:?}: {}", envelope.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UpstreamError::InvalidTarget(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }

        let headers = expand(&envelope.header).map_err(|e| UpstreamError::InvalidTarget(e.to_string()))?;

        self.client
            .request(method, url)
            .headers(headers)
            .body(envelope.body)
            .build()
            .map_err(|e| UpstreamError::InvalidTarget(e.to_string()))
    }

    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, UpstreamError> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| UpstreamError::BodyRead(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(UpstreamError::BodyRead(format!(
                    "response body exceeds {} bytes",
                    self.max_body_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::HeaderFields;

    fn upstream() -> Upstream {
        Upstream::new(&UpstreamConfig {
            respect_proxy_env: false,
            ..UpstreamConfig::default()
        })
        .unwrap()
    }

    fn envelope(method: &str, url: &str) -> RequestEnvelope {
        RequestEnvelope {
            method: method.into(),
            url: url.into(),
            header: HeaderFields::new(),
            body: Vec::new(),
        }
    }

    #[test]
    fn build_rejects_empty_method() {
        let err = upstream().build(envelope("", "http://example.test/")).unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidTarget(_)));
        assert_eq!(err.code(), ErrorCode::InvalidTarget);
    }

    #[test]
    fn build_rejects_relative_url() {
        let err = upstream().build(envelope("GET", "/just/a/path")).unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidTarget(_)));
    }

    #[test]
    fn build_rejects_non_http_scheme() {
        let err = upstream().build(envelope("GET", "ftp://example.test/file")).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn build_rejects_invalid_header() {
        let mut env = envelope("GET", "http://example.test/");
        env.header.insert("bad name".into(), "x".into());
        assert!(matches!(upstream().build(env), Err(UpstreamError::InvalidTarget(_))));
    }

    #[test]
    fn build_carries_method_headers_and_body() {
        let mut env = envelope("PATCH", "https://example.test/a?b=c");
        env.header.insert("x-trace".into(), "t1".into());
        env.body = b"{}".to_vec();

        let request = upstream().build(env).unwrap();
        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(request.url().as_str(), "https://example.test/a?b=c");
        assert_eq!(request.headers()["x-trace"], "t1");
        assert_eq!(request.body().and_then(|b| b.as_bytes()), Some(&b"{}"[..]));
    }

    #[test]
    fn error_codes_map_to_envelopes() {
        let envelope: ErrorEnvelope = UpstreamError::BodyRead("boom".into()).into();
        assert_eq!(envelope.code, ErrorCode::BodyRead);
        assert_eq!(envelope.error, "failed to read upstream body: boom");
    }
}
