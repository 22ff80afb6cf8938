//! Prometheus metrics for observability.
//!
//! This module provides the HTTP ingress metrics and registers the core
//! processor metrics (notifications, rooms, emails, em-api calls) in one
//! registry served at `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "nics_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nics_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "nics_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Core metrics (provisioner, email, em-api)
    for metric in nics_processors_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels.
///
/// Routing keys are collapsed so each notification key does not get its own
/// label set; numeric ids are replaced with `{id}`.
pub fn normalize_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/api/v1/notifications/") {
        if !rest.is_empty() {
            return "/api/v1/notifications/{routing_key}".to_string();
        }
    }
    // Replace twice: adjacent ids share a slash
    let result = NUMERIC_SEGMENT.replace_all(path, "/{id}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
