//! Metric recorders for the dispatcher.
//!
//! The engine's only metrics dependency is the shape of these hooks: one
//! timing observation per action invocation, labeled by route, method,
//! action name and ordinal position, plus a per-request outcome counter.
//! Any `metrics` recorder (the server binary installs the Prometheus
//! exporter) receives the observations.

use std::time::Duration;

use metrics::{describe_counter, describe_histogram, Label};

/// Register metric descriptions. Called once at startup.
pub fn register_metrics() {
    describe_histogram!(
        "hookpipe_action_duration_seconds",
        "Time spent running one action of an endpoint pipeline"
    );
    describe_counter!(
        "hookpipe_requests_total",
        "Requests handled, labeled by route and response status"
    );
}

/// Per-action timing recorder.
pub struct ActionMetrics;

impl ActionMetrics {
    /// Record one action invocation, timed whether it succeeded or failed.
    pub fn record(route: &str, method: &str, action: &str, ordinal: usize, duration: Duration) {
        let labels = vec![
            Label::new("route", route.to_string()),
            Label::new("method", method.to_string()),
            Label::new("action", action.to_string()),
            Label::new("ordinal", ordinal.to_string()),
        ];
        metrics::histogram!("hookpipe_action_duration_seconds", labels)
            .record(duration.as_secs_f64());
    }
}

/// Per-request outcome recorder.
pub struct RequestMetrics;

impl RequestMetrics {
    /// Count one handled request by route and response status.
    pub fn record(route: &str, status: u16) {
        let labels = vec![
            Label::new("route", route.to_string()),
            Label::new("status", status.to_string()),
        ];
        metrics::counter!("hookpipe_requests_total", labels).increment(1);
    }
}
