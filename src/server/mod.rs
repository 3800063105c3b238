//! Server bridge subsystem.
//!
//! # Data Flow
//! ```text
//! subscription on request subject
//!     → bridge.rs (one task per message)
//!     → dispatcher.rs
//!         decode RequestEnvelope    ── fail → ErrorEnvelope{invalid_request}
//!         upstream.rs build         ── fail → ErrorEnvelope{invalid_target}
//!         upstream.rs execute       ── fail → ErrorEnvelope{upstream_failed}
//!         upstream.rs read body     ── fail → ErrorEnvelope{body_read}
//!         ResponseEnvelope
//!     → publish to the message's reply subject
//! ```
//!
//! # Design Decisions
//! - Messages are handled concurrently and unordered
//! - A client timing out does not cancel the upstream call

pub mod bridge;
pub mod dispatcher;
pub mod upstream;

pub use bridge::{BridgeServer, ServerHandle};
pub use dispatcher::Dispatcher;
pub use upstream::{Upstream, UpstreamError};
