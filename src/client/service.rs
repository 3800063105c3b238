//! `tower::Service` adapter so the bridge can sit under any tower stack.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::Service;

use crate::client::BridgeClient;
use crate::error::BridgeError;

impl Service<Request<Body>> for BridgeClient {
    type Response = Response<Body>;
    type Error = BridgeError;
    type Future = BoxFuture<'static, Result<Response<Body>, BridgeError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.call(request).await })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::StreamExt;
    use tower::ServiceExt;

    use super::*;
    use crate::channel::{MemoryChannel, MessagingChannel};
    use crate::config::ClientConfig;
    use crate::envelope::{encode_response, HeaderFields, ResponseEnvelope};

    #[tokio::test]
    async fn oneshot_through_tower() {
        let channel = MemoryChannel::new();
        let mut sub = channel.subscribe("svc", None).await.unwrap();
        let publisher = channel.clone();
        tokio::spawn(async move {
            while let Some(msg) = sub.next().await {
                let payload = encode_response(&ResponseEnvelope {
                    status_code: 418,
                    header: HeaderFields::new(),
                    body: Vec::new(),
                })
                .unwrap();
                if let Some(to) = msg.reply {
                    let _ = publisher.publish(&to, payload).await;
                }
            }
        });

        let client = BridgeClient::new(Arc::new(channel), "svc", &ClientConfig::default());
        let request = Request::builder()
            .uri("http://example.test/teapot")
            .body(Body::empty())
            .unwrap();
        let response = client.oneshot(request).await.unwrap();
        assert_eq!(response.status(), 418);
    }
}
