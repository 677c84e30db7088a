//! Prometheus metrics for request and upstream tracking.
//!
//! This module provides:
//! - HTTP request counts and durations per route
//! - Upstream comic fetch counts and latency
//! - Comics returned per request

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::Result;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// HTTP request duration metric name.
pub const METRIC_HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";
/// Upstream fetch counter metric name.
pub const METRIC_UPSTREAM_FETCHES: &str = "upstream_fetches_total";
/// Upstream fetch latency metric name.
pub const METRIC_UPSTREAM_FETCH_LATENCY: &str = "upstream_fetch_latency_ms";
/// Comics returned histogram metric name.
pub const METRIC_COMICS_RETURNED: &str = "comics_returned";

/// Install the Prometheus recorder and register metric descriptions.
///
/// Call this once at startup; a second call fails because the recorder is
/// process-global.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");
    describe_histogram!(
        METRIC_HTTP_REQUEST_DURATION,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        METRIC_UPSTREAM_FETCHES,
        "Total number of comic fetches from the metadata source"
    );
    describe_histogram!(
        METRIC_UPSTREAM_FETCH_LATENCY,
        "Comic fetch latency in milliseconds"
    );
    describe_histogram!(
        METRIC_COMICS_RETURNED,
        "Number of comics returned per successful request"
    );

    debug!("Metrics initialized");
    Ok(handle)
}

/// Record one served HTTP request.
pub fn record_http_request(start: Instant, method: &str, path: &str, status: u16) {
    let method = method.to_string();
    let path = path.to_string();
    let status = status.to_string();

    counter!(
        METRIC_HTTP_REQUESTS,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        METRIC_HTTP_REQUEST_DURATION,
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Increment the upstream fetch counter with its outcome.
pub fn inc_upstream_fetches(outcome: &'static str) {
    counter!(METRIC_UPSTREAM_FETCHES, "outcome" => outcome).increment(1);
}

/// Record how many comics a request returned.
pub fn record_comics_returned(count: usize) {
    histogram!(METRIC_COMICS_RETURNED).record(count as f64);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for an upstream fetch.
pub fn timer_upstream_fetch() -> LatencyTimer {
    LatencyTimer::new(METRIC_UPSTREAM_FETCH_LATENCY)
}
