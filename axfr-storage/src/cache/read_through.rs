//! Read-through cache with graceful degradation.
//!
//! Every snapshot endpoint goes through [`ReadThroughCache::get_or_set`]:
//! look the key up, and on a miss run the generator, store its payload with
//! the endpoint's TTL and return it. Backend trouble never fails a request.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::error::CacheError;
use super::key::CacheKey;
use super::read::CacheRead;
use super::traits::{CacheBackend, CacheStats};

/// Configuration for the read-through cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Upper bound on each backend call (lookup or store).
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_millis(250),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-operation timeout.
    pub fn with_op_timeout(mut self, duration: Duration) -> Self {
        self.op_timeout = duration;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    bypasses: AtomicU64,
}

/// Cache-aside wrapper around an optional backend.
///
/// Cheap to clone; clones share the backend and the counters.
#[derive(Clone)]
pub struct ReadThroughCache {
    backend: Option<Arc<dyn CacheBackend>>,
    config: CacheConfig,
    counters: Arc<Counters>,
}

impl ReadThroughCache {
    /// Create a read-through cache over `backend`.
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self {
            backend: Some(backend),
            config,
            counters: Arc::default(),
        }
    }

    /// A cache with no backend: every read runs the generator.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            config: CacheConfig::default(),
            counters: Arc::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Name of the configured backend, `"none"` when disabled.
    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or("none", |b| b.name())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Snapshot of the hit/miss/error counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            bypasses: self.counters.bypasses.load(Ordering::Relaxed),
        }
    }

    /// Round trip to the backend. `Ok(())` when disabled.
    pub async fn ping(&self) -> Result<(), CacheError> {
        match &self.backend {
            Some(backend) => self.bounded(backend.ping()).await,
            None => Ok(()),
        }
    }

    /// Return the cached payload for `key`, or generate, store and return it.
    ///
    /// - Hit: the stored payload; the generator is not called.
    /// - Miss: the generator runs once and its payload is stored with `ttl`.
    ///   A failed store is reported through [`CacheRead::backend_error`].
    /// - Lookup failure (including timeout): the generator runs, nothing is
    ///   stored, the failure is reported through [`CacheRead::backend_error`].
    /// - Generator failure: nothing is stored and the error is returned.
    ///
    /// Concurrent misses on the same key may each run their generator.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        generator: F,
    ) -> Result<CacheRead, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, E>>,
    {
        let Some(backend) = &self.backend else {
            let payload = generator().await?;
            self.counters.bypasses.fetch_add(1, Ordering::Relaxed);
            return Ok(CacheRead::bypassed(payload));
        };

        match self.bounded(backend.get(key)).await {
            Ok(Some(payload)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, backend = backend.name(), "cache hit");
                Ok(CacheRead::from_cache(payload))
            }
            Ok(None) => {
                tracing::debug!(key = %key, backend = backend.name(), "cache miss");
                let payload = generator().await?;
                self.counters.misses.fetch_add(1, Ordering::Relaxed);

                match self.bounded(backend.set(key, &payload, ttl)).await {
                    Ok(()) => Ok(CacheRead::from_storage(payload)),
                    Err(err) => {
                        self.counters.errors.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            key = %key,
                            backend = backend.name(),
                            error = %err,
                            "failed to store cache entry"
                        );
                        Ok(CacheRead::from_storage(payload).with_backend_error(err))
                    }
                }
            }
            Err(err) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    key = %key,
                    backend = backend.name(),
                    error = %err,
                    "cache lookup failed, serving from storage"
                );
                let payload = generator().await?;
                Ok(CacheRead::from_storage(payload).with_backend_error(err))
            }
        }
    }

    async fn bounded<T, Fut>(&self, op: Fut) -> Result<T, CacheError>
    where
        Fut: Future<Output = Result<T, CacheError>>,
    {
        match timeout(self.config.op_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                after_ms: self.config.op_timeout.as_millis() as u64,
            }),
        }
    }
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("backend", &self.backend_name())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory_backend::InMemoryCacheBackend;
    use async_trait::async_trait;
    use axfr_core::{DatasetCode, DiffTld, Page};
    use std::sync::atomic::AtomicUsize;

    // Backend whose lookups and stores can be made to fail independently.
    #[derive(Default)]
    struct FlakyBackend {
        inner: InMemoryCacheBackend,
        fail_get: bool,
        fail_set: bool,
        sets: AtomicUsize,
    }

    #[async_trait]
    impl CacheBackend for FlakyBackend {
        async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
            if self.fail_get {
                return Err(CacheError::Connection {
                    reason: "connection refused".to_string(),
                });
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            if self.fail_set {
                return Err(CacheError::Backend {
                    reason: "READONLY".to_string(),
                });
            }
            self.inner.set(key, value, ttl).await
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    // Backend that never answers in time.
    struct SlowBackend;

    #[async_trait]
    impl CacheBackend for SlowBackend {
        async fn get(&self, _key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn set(&self, _key: &CacheKey, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn ping(&self) -> Result<(), CacheError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn key() -> CacheKey {
        CacheKey::search(DatasetCode::Se, "exa")
    }

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = ReadThroughCache::new(
            Arc::new(InMemoryCacheBackend::new()),
            CacheConfig::default(),
        );
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_set(&key(), TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(b"[{\"domain\":\"example.se\"}]".to_vec())
            })
            .await
            .unwrap();
        assert!(first.was_cache_miss());
        assert!(first.backend_error().is_none());

        let second = cache
            .get_or_set(&key(), TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(b"different".to_vec())
            })
            .await
            .unwrap();
        assert!(second.was_cache_hit());
        assert_eq!(second.payload(), first.payload());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.errors, 0);
    }

    #[tokio::test]
    async fn test_repeated_reads_are_byte_identical() {
        let cache = ReadThroughCache::new(
            Arc::new(InMemoryCacheBackend::new()),
            CacheConfig::default(),
        );
        let key = CacheKey::dates(DiffTld::Se, Page::new(0));

        let mut payloads = Vec::new();
        for i in 0..5 {
            let read = cache
                .get_or_set(&key, TTL, || async move { Ok::<_, String>(vec![i]) })
                .await
                .unwrap();
            payloads.push(read.into_payload());
        }
        assert!(payloads.iter().all(|p| p == &payloads[0]));
    }

    #[tokio::test]
    async fn test_disabled_always_generates() {
        let cache = ReadThroughCache::disabled();
        assert!(!cache.is_enabled());
        assert_eq!(cache.backend_name(), "none");

        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let read = cache
                .get_or_set(&key(), TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(b"[]".to_vec())
                })
                .await
                .unwrap();
            assert!(read.was_cache_miss());
            assert!(read.backend_error().is_none());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.stats().bypasses, 3);
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_payload() {
        let backend = Arc::new(FlakyBackend {
            fail_set: true,
            ..Default::default()
        });
        let cache = ReadThroughCache::new(backend.clone(), CacheConfig::default());

        let read = cache
            .get_or_set(&key(), TTL, || async { Ok::<_, String>(b"[]".to_vec()) })
            .await
            .unwrap();

        assert!(read.was_cache_miss());
        assert_eq!(read.payload(), b"[]");
        assert!(matches!(read.backend_error(), Some(CacheError::Backend { .. })));
        assert_eq!(cache.stats().errors, 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_without_storing() {
        let backend = Arc::new(FlakyBackend {
            fail_get: true,
            ..Default::default()
        });
        let cache = ReadThroughCache::new(backend.clone(), CacheConfig::default());

        let read = cache
            .get_or_set(&key(), TTL, || async { Ok::<_, String>(b"[]".to_vec()) })
            .await
            .unwrap();

        assert!(read.was_cache_miss());
        assert_eq!(read.payload(), b"[]");
        assert!(matches!(
            read.backend_error(),
            Some(CacheError::Connection { .. })
        ));
        assert_eq!(backend.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_and_falls_back() {
        let cache = ReadThroughCache::new(
            Arc::new(SlowBackend),
            CacheConfig::new().with_op_timeout(Duration::from_millis(20)),
        );

        let started = std::time::Instant::now();
        let read = cache
            .get_or_set(&key(), TTL, || async { Ok::<_, String>(b"[]".to_vec()) })
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(read.payload(), b"[]");
        assert_eq!(
            read.backend_error(),
            Some(&CacheError::Timeout { after_ms: 20 })
        );
        assert!(cache.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_generator_error_is_not_cached() {
        let backend = Arc::new(FlakyBackend::default());
        let cache = ReadThroughCache::new(backend.clone(), CacheConfig::default());

        let err = cache
            .get_or_set(&key(), TTL, || async {
                Err::<Vec<u8>, _>("database connection failed".to_string())
            })
            .await
            .unwrap_err();
        assert_eq!(err, "database connection failed");
        assert_eq!(backend.sets.load(Ordering::SeqCst), 0);

        let read = cache
            .get_or_set(&key(), TTL, || async { Ok::<_, String>(b"[]".to_vec()) })
            .await
            .unwrap();
        assert!(read.was_cache_miss());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_share_entries() {
        let cache = ReadThroughCache::new(
            Arc::new(InMemoryCacheBackend::new()),
            CacheConfig::default(),
        );
        let se = CacheKey::stats(DatasetCode::Se);
        let nu = CacheKey::stats(DatasetCode::Nu);

        cache
            .get_or_set(&se, TTL, || async { Ok::<_, String>(b"se".to_vec()) })
            .await
            .unwrap();
        let read = cache
            .get_or_set(&nu, TTL, || async { Ok::<_, String>(b"nu".to_vec()) })
            .await
            .unwrap();

        assert!(read.was_cache_miss());
        assert_eq!(read.payload(), b"nu");
    }
}
