//! Health Check Endpoints
//!
//! - /status - liveness: the database server accepts TCP connections
//! - /ready - readiness: every configured dataset answers a query
//!
//! The cache is reported but never fails readiness; the API serves every
//! request without it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use axfr_storage::{ReadThroughCache, SnapshotStore};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Bound on every probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetails {
    /// Per dataset code.
    pub datasets: BTreeMap<String, ComponentHealth>,
    pub cache: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency: Duration) -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
        }
    }

    fn failed(status: HealthStatus, error: impl Into<String>) -> Self {
        Self {
            status,
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /status - Liveness check (database host reachable over TCP)
pub async fn liveness(State(state): State<AppState>) -> impl IntoResponse {
    let Some(addr) = state.db_addr.as_deref() else {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            message: Some("Process is alive".to_string()),
            details: None,
        };
        return (StatusCode::OK, Json(response));
    };

    match tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(addr)).await {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: HealthStatus::Healthy,
                message: Some(format!("Database host {} reachable", addr)),
                details: None,
            }),
        ),
        Ok(Err(e)) => {
            tracing::warn!(addr, error = %e, "liveness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: HealthStatus::Unhealthy,
                    message: Some("database host unreachable".to_string()),
                    details: None,
                }),
            )
        }
        Err(_) => {
            tracing::warn!(addr, "liveness probe timed out");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: HealthStatus::Unhealthy,
                    message: Some("database host timed out".to_string()),
                    details: None,
                }),
            )
        }
    }
}

/// GET /ready - Readiness check (every dataset answers)
pub async fn readiness(
    State(store): State<Arc<dyn SnapshotStore>>,
    State(cache): State<ReadThroughCache>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let mut datasets = BTreeMap::new();
    for dataset in store.datasets() {
        datasets.insert(dataset.as_str().to_string(), check_dataset(store.as_ref(), dataset).await);
    }

    let cache_health = check_cache(&cache).await;

    let overall_status = if datasets.is_empty() {
        HealthStatus::Unhealthy
    } else if datasets.values().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let message = datasets
        .is_empty()
        .then(|| "no datasets configured".to_string());

    let response = HealthResponse {
        status: overall_status,
        message,
        details: Some(HealthDetails {
            datasets,
            cache: cache_health,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

async fn check_dataset(store: &dyn SnapshotStore, dataset: axfr_core::DatasetCode) -> ComponentHealth {
    let start = Instant::now();
    match tokio::time::timeout(PROBE_TIMEOUT, store.ping(dataset)).await {
        Ok(Ok(())) => ComponentHealth::healthy(start.elapsed()),
        Ok(Err(e)) => {
            tracing::warn!(dataset = %dataset, error = %e, "readiness probe failed");
            ComponentHealth::failed(HealthStatus::Unhealthy, e.public_reason())
        }
        Err(_) => ComponentHealth::failed(HealthStatus::Unhealthy, "query timed out"),
    }
}

async fn check_cache(cache: &ReadThroughCache) -> ComponentHealth {
    if !cache.is_enabled() {
        return ComponentHealth::failed(HealthStatus::Degraded, "cache disabled");
    }
    let start = Instant::now();
    match cache.ping().await {
        Ok(()) => ComponentHealth::healthy(start.elapsed()),
        Err(e) => ComponentHealth::failed(HealthStatus::Degraded, e.to_string()),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(liveness))
        .route("/ready", get(readiness))
}
