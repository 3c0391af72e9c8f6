//! Metrics and observability utilities
//!
//! Prometheus-style metrics through the `metrics` facade, with
//! standardized naming. The exporter is installed by the binary.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

use crate::dataset::{DatasetCounts, SourceKind};

/// Metrics prefix for all portal metrics
pub const METRICS_PREFIX: &str = "portal";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Dataset metrics
    describe_counter!(
        format!("{}_dataset_loads_total", METRICS_PREFIX),
        Unit::Count,
        "Dataset builds, including reloads"
    );

    describe_counter!(
        format!("{}_source_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Sources skipped because they were missing or malformed"
    );

    describe_gauge!(
        format!("{}_table_rows", METRICS_PREFIX),
        Unit::Count,
        "Rows per reconciled table"
    );

    // Write metrics
    describe_counter!(
        format!("{}_table_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Persisted table rewrites"
    );

    describe_counter!(
        format!("{}_table_write_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Failed table rewrites"
    );

    // Login metrics
    describe_counter!(
        format!("{}_logins_total", METRICS_PREFIX),
        Unit::Count,
        "Login attempts by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a finished dataset build
pub fn record_dataset_load(counts: &DatasetCounts) {
    counter!(format!("{}_dataset_loads_total", METRICS_PREFIX)).increment(1);

    for (table, rows) in [
        ("academicians", counts.academicians),
        ("projects", counts.projects),
        ("matches", counts.matches),
        ("decisions", counts.decisions),
        ("announcements", counts.announcements),
        ("messages", counts.messages),
        ("access_logs", counts.access_logs),
    ] {
        gauge!(
            format!("{}_table_rows", METRICS_PREFIX),
            "table" => table
        )
        .set(rows as f64);
    }
}

/// Helper to record a source that could not be read
pub fn record_source_failure(source: SourceKind, reason: &'static str) {
    counter!(
        format!("{}_source_failures_total", METRICS_PREFIX),
        "source" => source.as_str(),
        "reason" => reason
    )
    .increment(1);
}

/// Helper to record a table rewrite
pub fn record_table_write(source: SourceKind, success: bool) {
    if success {
        counter!(
            format!("{}_table_writes_total", METRICS_PREFIX),
            "table" => source.as_str()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_table_write_errors_total", METRICS_PREFIX),
            "table" => source.as_str()
        )
        .increment(1);
    }
}

/// Helper to record a login attempt
pub fn record_login(role: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        format!("{}_logins_total", METRICS_PREFIX),
        "role" => role,
        "outcome" => outcome
    )
    .increment(1);
}
