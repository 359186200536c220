//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (request counts, latency, side-channel failures)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, outcome
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_side_publish_failures_total` (counter): failed metrics/log
//!   publishes by channel
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - The `outcome` label separates replied/timed_out/transport_error from
//!   requests rejected before any bus dispatch

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter and register metric descriptions.
///
/// Must run inside the tokio runtime; the exporter serves scrapes from a
/// background task. Failure to bind is logged and the gateway keeps running
/// without a scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    if let Err(e) = builder.install() {
        tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter");
        return;
    }

    describe_counter!(
        "gateway_requests_total",
        "Total bridged requests by method, status code and outcome"
    );
    describe_histogram!(
        "gateway_request_duration_seconds",
        "End-to-end request handling latency in seconds"
    );
    describe_counter!(
        "gateway_side_publish_failures_total",
        "Metrics/log side publishes that failed, by channel"
    );

    tracing::info!(address = %addr, "Prometheus exporter listening");
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, outcome: &str, start_time: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record a failed side-channel publish (`channel` is "metrics" or "logs").
pub fn record_side_publish_failure(channel: &'static str) {
    counter!("gateway_side_publish_failures_total", "channel" => channel).increment(1);
}
