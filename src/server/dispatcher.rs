//! Per-message handling on the executor side.
//!
//! # Responsibilities
//! - Decode the inbound request envelope
//! - Run it through the upstream client
//! - Publish exactly one reply (response or error) to the message's reply subject
//!
//! # Design Decisions
//! - Every failure ends in a published error envelope, or a logged drop when
//!   there is nowhere to reply; nothing here panics
//! - No state is shared between messages beyond the channel handle

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::channel::{InboundMessage, MessagingChannel};
use crate::envelope::{decode_request, encode_reply, ErrorCode, Reply};
use crate::observability::metrics;
use crate::server::upstream::Upstream;

/// Last-resort reply when even an error envelope cannot be encoded.
const ENCODE_FAILURE_REPLY: &[u8] =
    br#"{"kind":"error","code":"encode","error":"failed to encode reply"}"#;

#[derive(Clone)]
pub struct Dispatcher {
    channel: Arc<dyn MessagingChannel>,
    upstream: Upstream,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn MessagingChannel>, upstream: Upstream) -> Self {
        Self { channel, upstream }
    }

    /// Handle one inbound message end to end.
    pub async fn handle(&self, message: InboundMessage) {
        let start = Instant::now();
        let Some(reply_to) = message.reply else {
            tracing::warn!(
                subject = %message.subject,
                bytes = message.payload.len(),
                "Dropping message without reply subject"
            );
            metrics::record_dropped_message();
            return;
        };

        let reply = self.dispatch(&message.payload).await;
        let outcome = reply.outcome();
        match &reply {
            Reply::Response(response) => tracing::debug!(
                reply_to = %reply_to,
                status = response.status_code,
                bytes = response.body.len(),
                "Upstream call completed"
            ),
            Reply::Error(error) => tracing::warn!(
                reply_to = %reply_to,
                code = %error.code,
                error = %error.error,
                "Replying with error envelope"
            ),
        }

        let payload = match encode_reply(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode reply");
                Bytes::from_static(ENCODE_FAILURE_REPLY)
            }
        };

        if let Err(e) = self.channel.publish(&reply_to, payload).await {
            tracing::error!(reply_to = %reply_to, error = %e, "Failed to publish reply");
        }
        metrics::record_dispatch(outcome, start);
    }

    /// Turn a request payload into the reply that should be sent back.
    pub async fn dispatch(&self, payload: &[u8]) -> Reply {
        let envelope = match decode_request(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Reply::error(ErrorCode::InvalidRequest, format!("invalid request: {e}"));
            }
        };

        tracing::debug!(method = %envelope.method, url = %envelope.url, "Executing request");

        match self.upstream.execute(envelope).await {
            Ok(response) => Reply::Response(response),
            Err(e) => Reply::Error(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;
    use crate::channel::MemoryChannel;
    use crate::config::UpstreamConfig;
    use crate::envelope::{decode_reply, encode_request, RequestEnvelope};

    fn dispatcher(channel: &MemoryChannel) -> Dispatcher {
        let upstream = Upstream::new(&UpstreamConfig {
            respect_proxy_env: false,
            ..UpstreamConfig::default()
        })
        .unwrap();
        Dispatcher::new(Arc::new(channel.clone()), upstream)
    }

    #[tokio::test]
    async fn undecodable_payload_is_invalid_request() {
        let channel = MemoryChannel::new();
        match dispatcher(&channel).dispatch(b"\x00garbage").await {
            Reply::Error(e) => {
                assert_eq!(e.code, ErrorCode::InvalidRequest);
                assert!(e.error.starts_with("invalid request"));
            }
            Reply::Response(_) => panic!("expected error reply"),
        }
    }

    #[tokio::test]
    async fn malformed_url_is_invalid_target() {
        let channel = MemoryChannel::new();
        let payload = encode_request(&RequestEnvelope {
            method: "GET".into(),
            url: "http://[not-a-host".into(),
            header: Default::default(),
            body: Vec::new(),
        })
        .unwrap();
        match dispatcher(&channel).dispatch(&payload).await {
            Reply::Error(e) => assert_eq!(e.code, ErrorCode::InvalidTarget),
            Reply::Response(_) => panic!("expected error reply"),
        }
    }

    #[tokio::test]
    async fn handle_publishes_to_reply_subject() {
        let channel = MemoryChannel::new();
        let mut inbox = channel.subscribe("_INBOX.test", None).await.unwrap();

        dispatcher(&channel)
            .handle(InboundMessage {
                subject: "http.request".into(),
                reply: Some("_INBOX.test".into()),
                payload: Bytes::from_static(b"{"),
            })
            .await;

        let published = tokio::time::timeout(Duration::from_secs(1), inbox.next())
            .await
            .unwrap()
            .unwrap();
        match decode_reply(&published.payload).unwrap() {
            Reply::Error(e) => assert_eq!(e.code, ErrorCode::InvalidRequest),
            Reply::Response(_) => panic!("expected error reply"),
        }
    }

    #[tokio::test]
    async fn handle_drops_message_without_reply_subject() {
        let channel = MemoryChannel::new();
        let mut watcher = channel.subscribe("_INBOX.none", None).await.unwrap();

        dispatcher(&channel)
            .handle(InboundMessage {
                subject: "http.request".into(),
                reply: None,
                payload: Bytes::from_static(b"{"),
            })
            .await;

        let nothing = tokio::time::timeout(Duration::from_millis(50), watcher.next()).await;
        assert!(nothing.is_err());
    }

    #[test]
    fn fallback_reply_decodes_as_error() {
        match decode_reply(ENCODE_FAILURE_REPLY).unwrap() {
            Reply::Error(e) => assert_eq!(e.code, ErrorCode::Encode),
            Reply::Response(_) => panic!("expected error reply"),
        }
    }
}
