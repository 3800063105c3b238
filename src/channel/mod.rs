//! Messaging channel subsystem.
//!
//! # Data Flow
//! ```text
//! client bridge ── request(subject, payload, timeout) ──▶ broker
//!                                                          │ delivers with reply = per-request inbox
//!                                                          ▼
//! server bridge ◀── subscribe(subject, queue_group) ── InboundMessage
//!     └── publish(reply, payload) ──▶ broker ──▶ waiting request()
//! ```
//!
//! # Design Decisions
//! - The channel is an explicit handle (`Arc<dyn MessagingChannel>`) owned
//!   by the caller; nothing here is process-global
//! - Reply destinations are per request, never a fixed subject
//! - Implementations must be safe for concurrent use

pub mod memory;
pub mod nats;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

pub use memory::MemoryChannel;
pub use nats::NatsChannel;

/// A message delivered to a subscriber.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub subject: String,
    /// Where a reply should be published, if the sender expects one.
    pub reply: Option<String>,
    pub payload: Bytes,
}

/// Stream of messages for one subscription. Ends when the channel closes.
pub type Subscription = BoxStream<'static, InboundMessage>;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no reply within {0:?}")]
    TimedOut(Duration),

    #[error("no responders on subject {0}")]
    NoResponders(String),

    #[error("channel closed")]
    Closed,

    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

/// Publish/subscribe plus request/reply, as consumed by both bridges.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), ChannelError>;

    /// Subscribe to `subject`. Members of the same queue group share
    /// deliveries; each message goes to one of them.
    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<Subscription, ChannelError>;

    /// Publish with a fresh reply destination and wait for the first reply.
    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, ChannelError>;
}
