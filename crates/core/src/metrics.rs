//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Provisioner (notifications, rooms, batches, incident-org posts)
//! - Email dispatcher (messages by kind and result)
//! - em-api requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Provisioner Metrics
// =============================================================================

/// Notifications received by route.
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nics_notifications_total",
            "Total incident notifications received",
        ),
        &["route"], // "incident_added", "incident_updated", "incident_org_added", "escalation", "unsupported"
    )
    .unwrap()
});

/// Notifications that failed to process, by route.
pub static NOTIFICATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nics_notification_failures_total",
            "Total incident notifications dropped after an error",
        ),
        &["route"],
    )
    .unwrap()
});

/// Collaboration room entities built for a batch.
pub static ROOMS_BUILT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "nics_rooms_built_total",
        "Total collaboration rooms built for batch creation",
    )
    .unwrap()
});

/// Rooms skipped because the same room was already built in the batch.
pub static ROOMS_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "nics_rooms_skipped_total",
        "Total collaboration rooms skipped as duplicates within a batch",
    )
    .unwrap()
});

/// Room batch submissions by result.
pub static ROOM_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nics_room_batches_total", "Total room batch submissions"),
        &["result"], // "success", "failed", "empty"
    )
    .unwrap()
});

/// Incident-org association posts by result.
pub static INCIDENT_ORG_POSTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nics_incident_org_posts_total",
            "Total incident-org association posts",
        ),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Email Metrics
// =============================================================================

/// Emails processed by payload kind and result.
pub static EMAILS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nics_emails_total", "Total email notifications processed"),
        &["kind", "result"], // kind: "simple", "xml"; result: "sent", "failed", "skipped"
    )
    .unwrap()
});

/// Recipients dropped by address validation.
pub static RECIPIENTS_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "nics_email_recipients_dropped_total",
        "Total recipient addresses dropped as invalid",
    )
    .unwrap()
});

// =============================================================================
// em-api Metrics
// =============================================================================

/// em-api request duration in seconds.
pub static EMAPI_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "nics_emapi_request_duration_seconds",
            "Duration of em-api requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"],
    )
    .unwrap()
});

/// em-api requests by endpoint and result.
pub static EMAPI_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nics_emapi_requests_total", "Total em-api requests"),
        &["endpoint", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Provisioner
        Box::new(NOTIFICATIONS_TOTAL.clone()),
        Box::new(NOTIFICATION_FAILURES.clone()),
        Box::new(ROOMS_BUILT.clone()),
        Box::new(ROOMS_SKIPPED.clone()),
        Box::new(ROOM_BATCHES.clone()),
        Box::new(INCIDENT_ORG_POSTS.clone()),
        // Email
        Box::new(EMAILS_TOTAL.clone()),
        Box::new(RECIPIENTS_DROPPED.clone()),
        // em-api
        Box::new(EMAPI_REQUEST_DURATION.clone()),
        Box::new(EMAPI_REQUESTS.clone()),
    ]
}
