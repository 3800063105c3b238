//! HTTP ingress: accept plain HTTP locally and forward it through the bridge.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (request ID, tracing)
//! - Resolve each request to an absolute target URL
//! - Map bridge failures to gateway status codes

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::client::BridgeClient;
use crate::config::IngressConfig;
use crate::error::BridgeError;
use crate::lifecycle::shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct IngressState {
    pub client: BridgeClient,
    pub default_scheme: String,
}

/// Local HTTP listener in front of the client bridge.
pub struct IngressServer {
    router: Router,
}

impl IngressServer {
    pub fn new(client: BridgeClient, config: &IngressConfig) -> Self {
        let state = IngressState {
            client,
            default_scheme: config.default_scheme.clone(),
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: IngressState) -> Router {
        Router::new()
            .fallback(forward_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Serve until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Ingress listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("Ingress stopped");
        Ok(())
    }
}

/// Forward any request through the bridge.
async fn forward_handler(State(state): State<IngressState>, mut request: Request<Body>) -> Response {
    if let Err(message) = absolutize(&mut request, &state.default_scheme) {
        return (StatusCode::BAD_REQUEST, message).into_response();
    }

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();

    match state.client.call(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                uri = %uri,
                error = %e,
                "Bridge call failed"
            );
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// Give origin-form requests an absolute URI built from the Host header.
fn absolutize(request: &mut Request<Body>, default_scheme: &str) -> Result<(), String> {
    let uri = request.uri();
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Ok(());
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .ok_or("missing Host header")?;
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let absolute = Uri::builder()
        .scheme(default_scheme)
        .authority(host)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| format!("cannot build target URI: {e}"))?;
    *request.uri_mut() = absolute;
    Ok(())
}

fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::BodyRead(_) => StatusCode::BAD_REQUEST,
        BridgeError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        BridgeError::Decode(_) | BridgeError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        BridgeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        BridgeError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
