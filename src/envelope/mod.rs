//! Envelope subsystem: HTTP requests and responses as message payloads.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → request.rs (buffer body, collapse headers)
//!     → codec.rs (JSON, base64 body)
//!     → [messaging channel]
//!     → codec.rs decode_reply
//!     → response.rs (Reply::Response → Response<Body>, Reply::Error → error)
//! ```
//!
//! # Design Decisions
//! - Bodies are fully buffered; no streaming
//! - One value per header name, first value wins
//! - Error replies are tagged, never sniffed by shape

pub mod codec;
pub mod headers;
pub mod request;
pub mod response;

pub use codec::{
    decode_reply, decode_request, encode_error, encode_reply, encode_request, encode_response,
    CodecError,
};
pub use headers::HeaderFields;
pub use request::RequestEnvelope;
pub use response::{ErrorCode, ErrorEnvelope, Reply, ResponseEnvelope};
