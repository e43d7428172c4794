//! Metrics collection and exposition.
//!
//! # Metrics
//! - `image_requests_total` (counter): requests by outcome and status
//! - `image_request_duration_seconds` (histogram): time to response head
//! - `image_bytes_served_total` (counter): body bytes handed to the client
//! - `cors_rejections_total` (counter): requests refused by the CORS gate
//!
//! Without an installed recorder every call here is a no-op, so tests and
//! embedders pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request and record how long it took to answer.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "image_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("image_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Add body bytes sent to a client.
pub fn record_bytes_served(bytes: usize) {
    ::metrics::counter!("image_bytes_served_total").increment(bytes as u64);
}

/// Count a request refused by the CORS gate.
pub fn record_cors_rejection(method: &str) {
    ::metrics::counter!("cors_rejections_total", "method" => method.to_string()).increment(1);
}
