//! AXFR Storage - Cache Layer and Snapshot Store Trait
//!
//! Defines the read-through cache that fronts every snapshot query, the
//! cache backends it can sit on (Redis, in-memory), and the `SnapshotStore`
//! abstraction over the relational query layer. The PostgreSQL
//! implementation of `SnapshotStore` lives in axfr-api.

pub mod cache;
pub mod snapshot;

// Re-export cache types for API integration
pub use cache::{
    normalize_redis_url, redact_redis_url, CacheBackend, CacheConfig, CacheError, CacheKey, CacheOutcome,
    CacheRead, CacheStats, InMemoryCacheBackend, ReadThroughCache, RedisCacheBackend, TtlTier,
};
pub use snapshot::SnapshotStore;
