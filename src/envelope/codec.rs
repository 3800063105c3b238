//! JSON wire codec for envelopes.
//!
//! # Wire Format
//! ```text
//! request:  {"method":"GET","url":"http://…","header":{"k":"v"},"body":"<base64>"}
//! response: {"kind":"response","statusCode":200,"header":{…},"body":"<base64>"}
//! error:    {"kind":"error","code":"upstream_failed","error":"…"}
//! ```
//!
//! # Design Decisions
//! - Bodies are standard base64, the same shape Go produces for `[]byte`.
//! - `header` and `body` may be missing or `null`; both decode to empty.
//! - Replies always carry an explicit `kind` discriminant.

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::envelope::request::RequestEnvelope;
use crate::envelope::response::{ErrorEnvelope, Reply, ResponseEnvelope};

/// Envelope serialization failures.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode envelope: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Borrowed view of a reply so single envelopes can be tagged without a move.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ReplyRef<'a> {
    Response(&'a ResponseEnvelope),
    Error(&'a ErrorEnvelope),
}

pub fn encode_request(envelope: &RequestEnvelope) -> Result<Bytes, CodecError> {
    serde_json::to_vec(envelope)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}

pub fn decode_request(payload: &[u8]) -> Result<RequestEnvelope, CodecError> {
    serde_json::from_slice(payload).map_err(CodecError::Decode)
}

pub fn encode_response(envelope: &ResponseEnvelope) -> Result<Bytes, CodecError> {
    encode_tagged(&ReplyRef::Response(envelope))
}

pub fn encode_error(envelope: &ErrorEnvelope) -> Result<Bytes, CodecError> {
    encode_tagged(&ReplyRef::Error(envelope))
}

pub fn encode_reply(reply: &Reply) -> Result<Bytes, CodecError> {
    match reply {
        Reply::Response(envelope) => encode_response(envelope),
        Reply::Error(envelope) => encode_error(envelope),
    }
}

/// Decode a reply payload, keeping error replies distinct from responses.
pub fn decode_reply(payload: &[u8]) -> Result<Reply, CodecError> {
    serde_json::from_slice(payload).map_err(CodecError::Decode)
}

fn encode_tagged(reply: &ReplyRef<'_>) -> Result<Bytes, CodecError> {
    serde_json::to_vec(reply)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}

/// Serde adapter for byte bodies carried as base64 strings.
pub(crate) mod base64_body {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    use serde::Deserialize;
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
