//! Prometheus Metrics Definitions
//!
//! Defines all AXFR API metrics with their labels and exposes a /metrics
//! endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Database query latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<AxfrMetrics>> = Lazy::new(AxfrMetrics::new);

/// Container for all AXFR API metrics.
#[derive(Clone)]
pub struct AxfrMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Cache lookups - labels: endpoint, outcome (hit/miss/bypass/error)
    pub cache_lookups_total: CounterVec,

    /// Database query counter - labels: operation, dataset, status
    pub db_queries_total: CounterVec,

    /// Database query duration histogram - labels: operation, dataset
    pub db_query_duration_seconds: HistogramVec,
}

impl AxfrMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "axfr_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "axfr_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            cache_lookups_total: register_counter_vec!(
                "axfr_cache_lookups_total",
                "Cache lookups by endpoint and outcome",
                &["endpoint", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register cache_lookups_total: {}", e)))?,

            db_queries_total: register_counter_vec!(
                "axfr_db_queries_total",
                "Total number of dataset queries",
                &["operation", "dataset", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register db_queries_total: {}", e)))?,

            db_query_duration_seconds: register_histogram_vec!(
                "axfr_db_query_duration_seconds",
                "Dataset query duration in seconds",
                &["operation", "dataset"],
                DB_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register db_query_duration_seconds: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record how a cached endpoint was served.
    pub fn record_cache_lookup(&self, endpoint: &str, outcome: &str) {
        self.cache_lookups_total
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    /// Record a dataset query.
    pub fn record_db_query(&self, operation: &str, dataset: &str, success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "error" };
        self.db_queries_total
            .with_label_values(&[operation, dataset, status])
            .inc();
        self.db_query_duration_seconds
            .with_label_values(&[operation, dataset])
            .observe(duration_secs);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    // Make sure the AXFR families are registered even before the first request
    if let Err(e) = METRICS.as_ref() {
        tracing::error!(error = %e, "metrics registry unavailable");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
