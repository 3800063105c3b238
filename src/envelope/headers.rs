//! Header conversion between `http::HeaderMap` and envelope header fields.
//!
//! # Design Decisions
//! - Envelopes carry exactly one value per header name. Collapsing keeps the
//!   first value and drops the rest; it is one-way and lossy.
//! - Collapsing never fails: non-UTF-8 values are converted lossily.
//! - Expansion is strict, since its input comes off the wire.

use std::collections::BTreeMap;

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::HeaderMap;
use thiserror::Error;

/// Single-valued header fields as carried inside an envelope.
pub type HeaderFields = BTreeMap<String, String>;

/// Hop-by-hop headers describe a single connection and must not be relayed
/// once the body has been buffered.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
];

/// A header field from an envelope that is not valid HTTP.
#[derive(Debug, Error)]
#[error("invalid header {name:?}: {reason}")]
pub struct InvalidHeader {
    pub name: String,
    pub reason: String,
}

/// Collapse a header map to one value per name (first occurrence wins).
pub fn collapse(headers: &HeaderMap) -> HeaderFields {
    let mut fields = HeaderFields::new();
    for name in headers.keys() {
        if let Some(value) = headers.get(name) {
            fields.insert(
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
    }
    fields
}

/// Rebuild a header map from envelope header fields.
pub fn expand(fields: &HeaderFields) -> Result<HeaderMap, InvalidHeader> {
    let mut headers = HeaderMap::with_capacity(fields.len());
    for (name, value) in fields {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Remove connection-scoped headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all("connection")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    for name in listed {
        headers.remove(name.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_keeps_first_value() {
        let mut headers = HeaderMap::new();
        headers.append("x-multi", HeaderValue::from_static("a"));
        headers.append("x-multi", HeaderValue::from_static("b"));
        headers.insert("accept", HeaderValue::from_static("*/*"));

        let fields = collapse(&headers);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["x-multi"], "a");
        assert_eq!(fields["accept"], "*/*");
    }

    #[test]
    fn collapse_is_lossy_for_non_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert("x-raw", HeaderValue::from_bytes(&[0x66, 0xff, 0x6f]).unwrap());
        let fields = collapse(&headers);
        assert_eq!(fields["x-raw"], "f\u{fffd}o");
    }

    #[test]
    fn expand_accepts_canonical_case() {
        let mut fields = HeaderFields::new();
        fields.insert("Content-Type".into(), "text/plain".into());
        let headers = expand(&fields).unwrap();
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    }

    #[test]
    fn expand_rejects_bad_name() {
        let mut fields = HeaderFields::new();
        fields.insert("bad header".into(), "x".into());
        let err = expand(&fields).unwrap_err();
        assert_eq!(err.name, "bad header");
    }

    #[test]
    fn expand_rejects_bad_value() {
        let mut fields = HeaderFields::new();
        fields.insert("x-ok".into(), "line\nbreak".into());
        assert!(expand(&fields).is_err());
    }

    #[test]
    fn strip_removes_hop_by_hop_and_listed() {
        let mut headers = HeaderMap::new();
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("connection", HeaderValue::from_static("close, x-session"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        strip_hop_by_hop(&mut headers);

        assert!(headers.get("transfer-encoding").is_none());
        assert!(headers.get("connection").is_none());
        assert!(headers.get("x-session").is_none());
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    }
}
