//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use nats_http_bridge::config::{ClientConfig, UpstreamConfig};
use nats_http_bridge::server::Upstream;
use nats_http_bridge::{BridgeClient, BridgeServer, MemoryChannel, ServerHandle};

pub const SUBJECT: &str = "http.request";

/// Start a mock backend on an ephemeral port.
///
/// Routes:
/// - `GET /` → `200 text/plain "hello"`
/// - `POST /echo` → request body and content type echoed back
/// - `GET /multi` → `x-multi` sent twice
/// - `GET /slow` → answers after 500ms
/// - `GET /status/{code}` → empty body with that status
pub async fn start_mock_backend() -> SocketAddr {
    let app = Router::new()
        .route("/", get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "hello") }))
        .route("/echo", post(echo))
        .route("/multi", get(multi))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "late"
            }),
        )
        .route("/status/{code}", get(status));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    ([(header::CONTENT_TYPE, content_type)], body)
}

async fn multi() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.append("x-multi", "first".parse().unwrap());
    headers.append("x-multi", "second".parse().unwrap());
    (headers, "multi")
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Start a backend that counts every request it receives.
pub async fn start_counting_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .fallback(|State(hits): State<Arc<AtomicUsize>>| async move {
            hits.fetch_add(1, Ordering::SeqCst);
            "counted"
        })
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

/// Start a backend that promises 100 body bytes, sends 5, then hangs up.
pub async fn start_truncating_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nhello";
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// An address nothing is listening on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn upstream_config() -> UpstreamConfig {
    UpstreamConfig {
        respect_proxy_env: false,
        ..UpstreamConfig::default()
    }
}

pub fn upstream() -> Upstream {
    Upstream::new(&upstream_config()).unwrap()
}

/// Start a server bridge on [`SUBJECT`].
pub async fn start_bridge(channel: &MemoryChannel) -> ServerHandle {
    start_bridge_with(channel, upstream_config()).await
}

pub async fn start_bridge_with(channel: &MemoryChannel, config: UpstreamConfig) -> ServerHandle {
    BridgeServer::new(Arc::new(channel.clone()), Upstream::new(&config).unwrap())
        .start(SUBJECT)
        .await
        .unwrap()
}

pub fn client(channel: &MemoryChannel, timeout: Duration) -> BridgeClient {
    BridgeClient::new(
        Arc::new(channel.clone()),
        SUBJECT,
        &ClientConfig {
            timeout_ms: timeout.as_millis() as u64,
            ..ClientConfig::default()
        },
    )
}
