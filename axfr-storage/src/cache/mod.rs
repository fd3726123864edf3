//! Cache-aside layer for snapshot payloads.
//!
//! Snapshot tables are rebuilt once a day and never mutated in between, so
//! cached payloads are never invalidated: they expire passively after a TTL
//! chosen by how volatile the underlying data is ([`TtlTier`]). Staleness up
//! to that TTL is accepted.
//!
//! # Availability
//!
//! The cache is strictly an optimization. With no backend configured every
//! read goes straight to the generator; when the backend misbehaves (errors,
//! timeouts) reads fall back to the generator and the failure is reported
//! alongside the payload in [`CacheRead::backend_error`], never instead of it.
//!
//! # Key space
//!
//! [`CacheKey`] can only be built through per-endpoint constructors, so every
//! key in the store is one of a small set of colon-delimited formats and two
//! different logical queries can never share a key.
//!
//! # Example
//!
//! ```ignore
//! let cache = ReadThroughCache::new(Arc::new(InMemoryCacheBackend::new()), CacheConfig::default());
//! let key = CacheKey::search(DatasetCode::Se, "exa");
//!
//! let read = cache
//!     .get_or_set(&key, TtlTier::Short.duration(), || async {
//!         let rows = store.search(DatasetCode::Se, "exa").await?;
//!         Ok::<_, AxfrError>(to_payload(&rows)?)
//!     })
//!     .await?;
//!
//! if read.was_cache_hit() { /* X-Cache: HIT */ }
//! ```

pub mod error;
pub mod key;
pub mod memory_backend;
pub mod read;
pub mod read_through;
pub mod redis_backend;
pub mod traits;

pub use error::CacheError;
pub use key::{CacheKey, TtlTier};
pub use memory_backend::InMemoryCacheBackend;
pub use read::{CacheOutcome, CacheRead};
pub use read_through::{CacheConfig, ReadThroughCache};
pub use redis_backend::{normalize_redis_url, redact_redis_url, RedisCacheBackend};
pub use traits::{CacheBackend, CacheStats};
