//! AXFR API Server Entry Point
//!
//! Reads configuration from the environment, builds the dataset pools and
//! the cache, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axfr_api::telemetry::{init_tracer, TelemetryConfig};
use axfr_api::{
    build_cache, create_api_router, ApiError, ApiResult, AppState, CacheSettings,
    DatasetRegistry, DbClient, DbConfig,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env()?;
    init_tracer(&telemetry_config)?;

    let db_config = DbConfig::from_env();
    let registry = DatasetRegistry::from_env();
    if registry.is_empty() {
        tracing::warn!("no dataset credentials configured, every query will fail");
    }
    let db = DbClient::from_config(&db_config, &registry)?;
    for (dataset, size) in db.pool_sizes() {
        tracing::info!(dataset = %dataset, pool_size = size, "dataset pool ready");
    }

    let cache_settings = CacheSettings::from_env()?;
    let cache = build_cache(&cache_settings).await;

    let state = AppState::new(Arc::new(db), cache).with_db_addr(db_config.address());
    let app = create_api_router(state);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting AXFR API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("AXFR_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("AXFR_API_PORT").ok())
        .unwrap_or_else(|| "8080".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::internal_error(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::internal_error(format!("Invalid bind address {}: {}", addr, e)))
}
