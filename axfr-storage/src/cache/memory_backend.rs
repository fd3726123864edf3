//! In-process cache backend.
//!
//! Used for single-instance deployments without Redis and throughout the
//! test suites. An expired entry is dropped the next time it is read, or by
//! [`InMemoryCacheBackend::purge_expired`]. Keys embed client input, so a
//! long-running process should also run [`InMemoryCacheBackend::spawn_purger`].

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::CacheError;
use super::key::CacheKey;
use super::traits::CacheBackend;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent map of key to (payload, expiry).
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, Entry>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Purge expired entries every `every` on the current tokio runtime.
    ///
    /// The task holds a weak reference and exits once the backend is dropped.
    pub fn spawn_purger(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let backend: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(backend) = backend.upgrade() else {
                    break;
                };
                let removed = backend.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = backend.len(), "purged expired cache entries");
                }
            }
        })
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        // Clone out before removing: holding the shard guard while calling
        // remove on the same key deadlocks.
        let found = self.entries.get(key.as_str()).map(|e| e.clone());

        match found {
            Some(entry) if entry.is_expired(now) => {
                self.entries
                    .remove_if(key.as_str(), |_, e| e.is_expired(now));
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.as_str().to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axfr_core::DatasetCode;

    #[tokio::test]
    async fn test_set_then_get() {
        let backend = InMemoryCacheBackend::new();
        let key = CacheKey::stats(DatasetCode::Se);

        assert_eq!(backend.get(&key).await.unwrap(), None);
        backend
            .set(&key, b"[1,2]", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get(&key).await.unwrap(), Some(b"[1,2]".to_vec()));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_found() {
        let backend = InMemoryCacheBackend::new();
        let key = CacheKey::stats(DatasetCode::Nu);

        backend.set(&key, b"x", Duration::ZERO).await.unwrap();
        assert_eq!(backend.get(&key).await.unwrap(), None);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let backend = InMemoryCacheBackend::new();
        let key = CacheKey::search(DatasetCode::Ch, "shop");

        backend.set(&key, b"a", Duration::from_secs(60)).await.unwrap();
        backend.set(&key, b"b", Duration::from_secs(60)).await.unwrap();
        assert_eq!(backend.get(&key).await.unwrap(), Some(b"b".to_vec()));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let backend = InMemoryCacheBackend::new();
        backend
            .set(&CacheKey::stats(DatasetCode::Se), b"a", Duration::ZERO)
            .await
            .unwrap();
        backend
            .set(&CacheKey::stats(DatasetCode::Nu), b"b", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(backend.purge_expired(), 1);
        assert_eq!(backend.len(), 1);

        backend.clear();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_purger_reclaims_keys_never_read_again() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        for query in ["a", "b", "c", "d"] {
            backend
                .set(&CacheKey::search(DatasetCode::Se, query), b"[]", Duration::ZERO)
                .await
                .unwrap();
        }
        backend
            .set(&CacheKey::stats(DatasetCode::Se), b"[]", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.len(), 5);

        let handle = backend.spawn_purger(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.len(), 1);

        drop(backend);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
