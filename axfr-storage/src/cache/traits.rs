//! Cache backend trait.

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheError;
use super::key::CacheKey;

/// A key-value store with per-entry expiration.
///
/// Values are opaque serialized payloads. Implementations must be safe to
/// share across request tasks.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a payload.
    ///
    /// `Ok(None)` means "not found" (absent or expired) and is not an error.
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a payload that expires after `ttl`.
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Round trip to the backend.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (generator ran, store attempted).
    pub misses: u64,
    /// Number of backend failures on lookup or store.
    pub errors: u64,
    /// Number of reads served with no backend configured.
    pub bypasses: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0) over hits and misses.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_hit_rate_ignores_bypasses() {
        let stats = CacheStats {
            hits: 1,
            misses: 1,
            errors: 3,
            bypasses: 10,
        };
        assert!((stats.hit_rate() - 0.5).abs() < 0.001);
    }
}
