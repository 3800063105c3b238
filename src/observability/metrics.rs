//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_client_requests_total` (counter): client calls by outcome
//! - `bridge_client_request_duration_seconds` (histogram): round-trip latency
//! - `bridge_dispatch_total` (counter): server dispatches by outcome
//! - `bridge_dispatch_duration_seconds` (histogram): dispatch latency
//! - `bridge_dropped_messages_total` (counter): messages without a reply destination
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are bounded: outcomes only, never URLs

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_client_call(outcome: &'static str, start: Instant) {
    counter!("bridge_client_requests_total", "outcome" => outcome).increment(1);
    histogram!("bridge_client_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch(outcome: &'static str, start: Instant) {
    counter!("bridge_dispatch_total", "outcome" => outcome).increment(1);
    histogram!("bridge_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_dropped_message() {
    counter!("bridge_dropped_messages_total").increment(1);
}
