//! Client bridge subsystem.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → bridge.rs (buffer body, build + encode RequestEnvelope)
//!     → channel.request(subject, payload, timeout)
//!     → decode Reply
//!         Response → Response<Body>
//!         Error    → BridgeError::Upstream
//! ```
//!
//! # Design Decisions
//! - One blocking request/reply exchange per call; no retries
//! - No shared mutable state; clones are independent callers
//! - service.rs exposes the same call as a `tower::Service`

pub mod bridge;
pub mod service;

pub use bridge::BridgeClient;
