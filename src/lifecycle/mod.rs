//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server bridge stops taking messages
//!             → ingress stops accepting connections
//!             → in-flight work drains
//! ```
//!
//! # Design Decisions
//! - In-flight dispatches finish; nothing is cancelled mid-call

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{shutdown_signal, spawn_signal_handler};
