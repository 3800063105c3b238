//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Broker connection and request subject.
    pub broker: BrokerConfig,

    /// Client bridge settings.
    pub client: ClientConfig,

    /// Server bridge settings.
    pub server: ServerConfig,

    /// Outbound HTTP client used by the server bridge.
    pub upstream: UpstreamConfig,

    /// Local HTTP ingress.
    pub ingress: IngressConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker URL (e.g., "nats://127.0.0.1:4222").
    pub url: String,

    /// Connection name reported to the broker.
    pub name: String,

    /// Subject the server bridge listens on and the client publishes to.
    pub request_subject: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            name: "nats-http-bridge".to_string(),
            request_subject: "http.request".to_string(),
        }
    }
}

/// Client bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Default per-call reply timeout in milliseconds.
    pub timeout_ms: u64,

    /// Largest request body the client will buffer.
    pub max_body_bytes: usize,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_body_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Server bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Queue group shared by executor processes. Each request is executed by
    /// one member only.
    pub queue_group: Option<String>,
}

/// Upstream HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Total time for one upstream request/response in seconds.
    pub request_timeout_secs: u64,

    /// Largest response body read from upstream.
    pub max_body_bytes: usize,

    /// Honor HTTP_PROXY / HTTPS_PROXY / NO_PROXY.
    pub respect_proxy_env: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            request_timeout_secs: 30,
            max_body_bytes: 8 * 1024 * 1024, // 8MB
            respect_proxy_env: true,
        }
    }
}

/// Local HTTP ingress configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Scheme used for origin-form requests that only carry a Host header.
    pub default_scheme: String,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            default_scheme: "http".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
