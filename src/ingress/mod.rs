//! HTTP ingress subsystem.
//!
//! # Data Flow
//! ```text
//! local HTTP client (proxy-style or Host-addressed)
//!     → server.rs (request id, trace, absolute target URI)
//!     → client::BridgeClient::call
//!     → response, or a gateway status derived from BridgeError
//! ```

pub mod server;

pub use server::{IngressServer, IngressState};
