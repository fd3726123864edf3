//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use axfr_storage::{ReadThroughCache, SnapshotStore};

/// Application-wide state shared across all routes.
///
/// Built once at startup; handlers receive clones.
#[derive(Clone)]
pub struct AppState {
    /// Query layer over every configured dataset.
    pub store: Arc<dyn SnapshotStore>,
    /// Cache in front of the store. Disabled when no backend is configured.
    pub cache: ReadThroughCache,
    /// `host:port` probed by the liveness check.
    pub db_addr: Option<Arc<str>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn SnapshotStore>, cache: ReadThroughCache) -> Self {
        Self {
            store,
            cache,
            db_addr: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_db_addr(mut self, addr: impl Into<Arc<str>>) -> Self {
        self.db_addr = Some(addr.into());
        self
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<dyn SnapshotStore>, store);
crate::impl_from_ref!(ReadThroughCache, cache);
crate::impl_from_ref!(Instant, start_time);
