//! Prometheus metrics for the analytics service
//!
//! Covers HTTP traffic, analytics computations, data-integrity rejections and
//! storage access. All metrics share the `cmms_analytics` namespace and live in
//! a single process-wide registry exposed on `/metrics`.
//!
//! ```no_run
//! use cmms_analytics::metrics::{self, ANALYTICS_COMPUTATIONS_TOTAL};
//!
//! metrics::init_metrics().ok();
//! ANALYTICS_COMPUTATIONS_TOTAL
//!     .with_label_values(&["mtbf", "success"])
//!     .inc();
//! ```

pub mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::time::Duration;

const NAMESPACE: &str = "cmms_analytics";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: Gauge = Gauge::with_opts(
        Opts::new("http_requests_in_flight", "Number of HTTP requests being served")
            .namespace(NAMESPACE)
    ).expect("Failed to create HTTP_REQUESTS_IN_FLIGHT metric");

    // ============================================================================
    // Analytics Metrics
    // ============================================================================

    /// Labels: operation, status
    pub static ref ANALYTICS_COMPUTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("analytics_computations_total", "Total number of analytics computations")
            .namespace(NAMESPACE),
        &["operation", "status"]
    ).expect("Failed to create ANALYTICS_COMPUTATIONS_TOTAL metric");

    /// Labels: operation
    pub static ref ANALYTICS_COMPUTATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "analytics_computation_duration_seconds",
            "Analytics computation duration in seconds, snapshot load included"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["operation"]
    ).expect("Failed to create ANALYTICS_COMPUTATION_DURATION_SECONDS metric");

    /// Computations refused because of malformed input data
    ///
    /// Labels: operation
    pub static ref DATA_INTEGRITY_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("data_integrity_errors_total", "Total number of data integrity errors")
            .namespace(NAMESPACE),
        &["operation"]
    ).expect("Failed to create DATA_INTEGRITY_ERRORS_TOTAL metric");

    /// Assets dropped from a prediction batch for malformed records
    pub static ref PREDICTION_REJECTED_ASSETS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("prediction_rejected_assets_total", "Assets rejected from failure prediction")
            .namespace(NAMESPACE),
        &["reason"]
    ).expect("Failed to create PREDICTION_REJECTED_ASSETS_TOTAL metric");

    // ============================================================================
    // Storage Metrics
    // ============================================================================

    /// Labels: operation, status
    pub static ref STORAGE_OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("storage_operations_total", "Total number of storage operations")
            .namespace(NAMESPACE),
        &["operation", "status"]
    ).expect("Failed to create STORAGE_OPERATIONS_TOTAL metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Application build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Register every metric with the global registry
///
/// Call once at startup; a second call fails with `AlreadyReg`.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(ANALYTICS_COMPUTATIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ANALYTICS_COMPUTATION_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(DATA_INTEGRITY_ERRORS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_REJECTED_ASSETS_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(STORAGE_OPERATIONS_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;
    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Record the outcome of one analytics computation
pub fn record_computation(operation: &str, status: &str, elapsed: Duration) {
    ANALYTICS_COMPUTATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
    ANALYTICS_COMPUTATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}

/// Record a store call made on behalf of the HTTP or analytics layer
pub fn record_storage(operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    STORAGE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
