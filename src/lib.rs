//! HTTP request/response bridge over a pub/sub messaging channel.

pub mod channel;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod ingress;
pub mod lifecycle;
pub mod observability;
pub mod server;

pub use channel::{MemoryChannel, MessagingChannel, NatsChannel};
pub use client::BridgeClient;
pub use config::schema::BridgeConfig;
pub use error::BridgeError;
pub use ingress::IngressServer;
pub use lifecycle::Shutdown;
pub use server::{BridgeServer, ServerHandle};
