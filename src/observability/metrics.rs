//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatcher_requests_total` (counter): requests by method, route, status
//! - `dispatcher_request_duration_seconds` (histogram): latency by method, route
//! - `dispatcher_faults_total` (counter): faults by kind
//! - `dispatcher_unrouted_total` (counter): requests with no matching route
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Histogram buckets tuned for typical web latencies

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use thiserror::Error;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),

    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_metrics();
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "dispatcher_requests_total",
        "Dispatched requests by method, route and status"
    );
    describe_histogram!(
        "dispatcher_request_duration_seconds",
        "Time spent dispatching a request"
    );
    describe_counter!("dispatcher_faults_total", "Operation faults by kind");
    describe_counter!(
        "dispatcher_unrouted_total",
        "Requests that matched no route"
    );
}

/// Record one dispatched request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "dispatcher_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "dispatcher_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_fault(kind: &'static str) {
    counter!("dispatcher_faults_total", "kind" => kind).increment(1);
}

pub fn record_unrouted(method: &str) {
    counter!("dispatcher_unrouted_total", "method" => method.to_string()).increment(1);
}
