//! AXFR API - HTTP Layer over Zone Snapshot Datasets
//!
//! Serves dated snapshots of the .se and .nu zones (daily dumps and
//! new-domain diffs) as JSON. Every query goes through a read-through cache
//! in front of a per-dataset PostgreSQL pool.

#[macro_use]
mod macros;

pub mod config;
pub mod db;
pub mod error;
pub mod policy;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::{build_cache, CacheBackendKind, CacheSettings};
pub use db::{DatasetCredential, DatasetRegistry, DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use policy::EndpointQuery;
pub use routes::create_api_router;
pub use state::AppState;
