//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (outcomes, duration, in flight)
//! - Download attempts and artifact resolution
//! - Webhook reports

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Finished jobs by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("assetor_jobs_total", "Total finished download jobs"),
        &["result"], // "succeeded", "failed"
    )
    .unwrap()
});

/// Job duration in seconds, from first attempt to report.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "assetor_job_duration_seconds",
            "Duration of download jobs across all attempts",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3000.0]),
        &["result"],
    )
    .unwrap()
});

/// Jobs currently running.
pub static JOBS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("assetor_jobs_in_flight", "Download jobs currently running").unwrap()
});

// =============================================================================
// Downloader Metrics
// =============================================================================

/// Download attempts by outcome.
pub static DOWNLOAD_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("assetor_download_attempts_total", "Total download attempts"),
        &["outcome"], // "succeeded", "process_failed", "empty_output", "unparsable", "timed_out"
    )
    .unwrap()
});

/// Resolved artifacts by the rule that matched.
pub static ARTIFACTS_RESOLVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "assetor_artifacts_resolved_total",
            "Artifacts located in tool output",
        ),
        &["rule"], // "strict", "relaxed", "already_downloaded"
    )
    .unwrap()
});

/// Partial files removed after exhausted jobs.
pub static PARTIAL_FILES_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "assetor_partial_files_removed_total",
        "Partial download files removed after failed jobs",
    )
    .unwrap()
});

// =============================================================================
// Reporter Metrics
// =============================================================================

/// Webhook reports by kind and delivery status.
pub static REPORTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("assetor_reports_total", "Total webhook report deliveries"),
        &["kind", "status"], // kind: "success", "failure"
    )
    .unwrap()
});

/// Get all core metrics for registration.
///
/// Returns a vector of boxed collectors that can be registered with a Prometheus registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(JOBS_IN_FLIGHT.clone()),
        Box::new(DOWNLOAD_ATTEMPTS.clone()),
        Box::new(ARTIFACTS_RESOLVED.clone()),
        Box::new(PARTIAL_FILES_REMOVED.clone()),
        Box::new(REPORTS_TOTAL.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        DOWNLOAD_ATTEMPTS.with_label_values(&["succeeded"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"assetor_download_attempts_total".to_string()));
    }
}
