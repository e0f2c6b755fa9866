//! Prometheus metrics for observability.
//!
//! This module provides the HTTP request metrics of the server and exposes
//! them together with the core job, attempt and report metrics.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

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
            "assetor_http_request_duration_seconds",
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
        Opts::new("assetor_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "assetor_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Core metrics (jobs, attempts, reports)
    for metric in assetor_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Normalize a path for metric labels.
///
/// Artifact names are unbounded, so every download collapses to one label.
pub fn normalize_path(path: &str) -> String {
    match path {
        "/pull" | "/health" | "/config" | "/metrics" => path.to_string(),
        _ if path.starts_with("/download/") => "/download/{file}".to_string(),
        _ => "other".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_download() {
        assert_eq!(
            normalize_path("/download/job-42_abc_00-01-30.mp4"),
            "/download/{file}"
        );
        assert_eq!(normalize_path("/download/"), "/download/{file}");
    }

    #[test]
    fn test_normalize_path_known_routes() {
        assert_eq!(normalize_path("/pull"), "/pull");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_normalize_path_unknown() {
        assert_eq!(normalize_path("/wp-admin/setup.php"), "other");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        assetor_core::metrics::JOBS_IN_FLIGHT.set(0);

        let output = encode_metrics();
        assert!(output.contains("assetor_http_requests_total"));
        assert!(output.contains("assetor_jobs_in_flight"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
