//! Client side of the bridge: an HTTP transport over request/reply.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response};

use crate::channel::{ChannelError, MessagingChannel};
use crate::config::ClientConfig;
use crate::envelope::{decode_reply, encode_request, Reply, RequestEnvelope};
use crate::error::BridgeError;
use crate::observability::metrics;

/// Sends HTTP requests as envelopes and waits for the executor's reply.
///
/// Cheap to clone; clones share the channel handle. No retries.
#[derive(Clone)]
pub struct BridgeClient {
    channel: Arc<dyn MessagingChannel>,
    subject: String,
    timeout: Duration,
    max_body_bytes: usize,
}

impl BridgeClient {
    pub fn new(
        channel: Arc<dyn MessagingChannel>,
        subject: impl Into<String>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            channel,
            subject: subject.into(),
            timeout: config.timeout(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Default timeout used by [`BridgeClient::call`].
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send with the configured default timeout.
    pub async fn call(&self, request: Request<Body>) -> Result<Response<Body>, BridgeError> {
        self.send(request, self.timeout).await
    }

    /// Perform one round trip.
    ///
    /// Suspends until a reply arrives or `timeout` elapses. A timeout does
    /// not cancel the remote call.
    pub async fn send(
        &self,
        request: Request<Body>,
        timeout: Duration,
    ) -> Result<Response<Body>, BridgeError> {
        let start = Instant::now();
        let method = request.method().clone();
        let uri = request.uri().clone();

        let result = self.round_trip(request, timeout).await;

        match &result {
            Ok(response) => tracing::debug!(
                method = %method,
                uri = %uri,
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Bridged request completed"
            ),
            Err(e) => tracing::debug!(
                method = %method,
                uri = %uri,
                error = %e,
                "Bridged request failed"
            ),
        }
        metrics::record_client_call(
            result.as_ref().map(|_| "ok").unwrap_or_else(BridgeError::outcome),
            start,
        );
        result
    }

    async fn round_trip(
        &self,
        request: Request<Body>,
        timeout: Duration,
    ) -> Result<Response<Body>, BridgeError> {
        let envelope = RequestEnvelope::from_request(request, self.max_body_bytes).await?;
        let payload = encode_request(&envelope)?;

        let reply = self
            .channel
            .request(&self.subject, payload, timeout)
            .await
            .map_err(|e| match e {
                ChannelError::TimedOut(_) => BridgeError::Timeout(timeout),
                other => BridgeError::Transport(other.to_string()),
            })?;

        match decode_reply(&reply)? {
            Reply::Response(envelope) => envelope.into_response(),
            Reply::Error(error) => Err(BridgeError::Upstream {
                code: error.code,
                message: error.error,
            }),
        }
    }
}
