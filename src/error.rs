//! Errors surfaced to callers of the client bridge.

use std::time::Duration;

use thiserror::Error;

use crate::envelope::{CodecError, ErrorCode};

/// Failure of a single bridged HTTP call.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The request body could not be buffered.
    #[error("failed to read body: {0}")]
    BodyRead(String),

    #[error("failed to encode request envelope: {0}")]
    Encode(String),

    /// The reply was not a usable response envelope.
    #[error("failed to decode reply: {0}")]
    Decode(String),

    /// No reply arrived in time. The remote call, if any, keeps running.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The executor replied with an error envelope.
    #[error("upstream error ({code}): {message}")]
    Upstream { code: ErrorCode, message: String },

    /// The messaging channel could not carry the request.
    #[error("messaging channel unavailable: {0}")]
    Transport(String),
}

impl BridgeError {
    /// Label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            BridgeError::BodyRead(_) => "body_read",
            BridgeError::Encode(_) => "encode",
            BridgeError::Decode(_) => "decode",
            BridgeError::Timeout(_) => "timeout",
            BridgeError::Upstream { .. } => "upstream",
            BridgeError::Transport(_) => "transport",
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encode(e) => BridgeError::Encode(e.to_string()),
            CodecError::Decode(e) => BridgeError::Decode(e.to_string()),
        }
    }
}
