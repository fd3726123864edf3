//! REST API Routes
//!
//! Snapshot queries live at the root (`/se/:page`, `/search/:tld/:query`,
//! ...), probes at `/status` and `/ready`, Prometheus at `/metrics`.

pub mod health;
pub mod snapshots;

use axum::{middleware::from_fn, routing::get, Router};
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Request body cap. Every endpoint is a GET.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Requests served at once. Excess requests wait for a slot.
const MAX_IN_FLIGHT: usize = 1024;

/// Build the complete API router with middleware and state attached.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .merge(snapshots::create_router())
        .merge(health::create_router())
        .route("/metrics", get(metrics_handler))
        .fallback(|| async { ApiError::not_found() })
        .layer(from_fn(observability_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
