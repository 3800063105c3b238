//! Request envelope: one outbound HTTP call to be performed remotely.

use axum::body::Body;
use axum::http::Request;
use serde::{Deserialize, Serialize};

use crate::envelope::codec::{base64_body, null_as_default};
use crate::envelope::headers::{collapse, strip_hop_by_hop, HeaderFields};
use crate::error::BridgeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// HTTP verb, e.g. `GET`.
    pub method: String,

    /// Absolute target URL.
    pub url: String,

    /// One value per header name; extra values were dropped when collapsing.
    #[serde(default, deserialize_with = "null_as_default")]
    pub header: HeaderFields,

    #[serde(default, with = "base64_body")]
    pub body: Vec<u8>,
}

impl RequestEnvelope {
    /// Capture an in-flight request, buffering at most `max_body_bytes` of body.
    ///
    /// Multi-valued headers collapse to their first value here and
    /// hop-by-hop headers are dropped. The URI must be absolute.
    pub async fn from_request(
        request: Request<Body>,
        max_body_bytes: usize,
    ) -> Result<Self, BridgeError> {
        let (mut parts, body) = request.into_parts();
        if parts.uri.scheme().is_none() || parts.uri.authority().is_none() {
            return Err(BridgeError::Encode(format!(
                "request URI must be absolute, got {:?}",
                parts.uri.to_string()
            )));
        }
        strip_hop_by_hop(&mut parts.headers);

        let body = axum::body::to_bytes(body, max_body_bytes)
            .await
            .map_err(|e| BridgeError::BodyRead(e.to_string()))?;

        Ok(Self {
            method: parts.method.to_string(),
            url: parts.uri.to_string(),
            header: collapse(&parts.headers),
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::codec::{decode_request, encode_request};

    #[tokio::test]
    async fn captures_method_url_headers_and_body() {
        let request = Request::builder()
            .method("POST")
            .uri("http://example.test/submit?q=1")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let envelope = RequestEnvelope::from_request(request, 1024).await.unwrap();
        assert_eq!(envelope.method, "POST");
        assert_eq!(envelope.url, "http://example.test/submit?q=1");
        assert_eq!(envelope.header["content-type"], "application/json");
        assert_eq!(envelope.body, b"{}");
    }

    #[tokio::test]
    async fn multi_valued_headers_collapse_to_first() {
        let request = Request::builder()
            .uri("http://example.test/")
            .header("x-multi", "a")
            .header("x-multi", "b")
            .body(Body::empty())
            .unwrap();

        let envelope = RequestEnvelope::from_request(request, 1024).await.unwrap();
        let decoded = decode_request(&encode_request(&envelope).unwrap()).unwrap();
        assert_eq!(decoded.header.len(), 1);
        assert_eq!(decoded.header["x-multi"], "a");
    }

    #[tokio::test]
    async fn hop_by_hop_headers_are_not_captured() {
        let request = Request::builder()
            .uri("http://example.test/")
            .header("connection", "keep-alive, x-session")
            .header("x-session", "abc")
            .header("transfer-encoding", "chunked")
            .header("accept", "*/*")
            .body(Body::empty())
            .unwrap();

        let envelope = RequestEnvelope::from_request(request, 1024).await.unwrap();
        assert_eq!(envelope.header.len(), 1);
        assert_eq!(envelope.header["accept"], "*/*");
    }

    #[tokio::test]
    async fn origin_form_uri_is_rejected() {
        let request = Request::builder().uri("/x").body(Body::empty()).unwrap();

        let err = RequestEnvelope::from_request(request, 1024).await.unwrap_err();
        assert!(matches!(err, BridgeError::Encode(_)));
    }

    #[tokio::test]
    async fn oversized_body_is_a_body_read_error() {
        let request = Request::builder()
            .uri("http://example.test/")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();

        let err = RequestEnvelope::from_request(request, 16).await.unwrap_err();
        assert!(matches!(err, BridgeError::BodyRead(_)));
    }
}
