//! API Configuration Module
//!
//! Cache backend selection. Configuration is loaded from environment
//! variables with defaults suitable for local development. Database
//! settings live next to the pool in `db.rs`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axfr_core::ConfigError;
use axfr_storage::{
    redact_redis_url, CacheConfig, InMemoryCacheBackend, ReadThroughCache, RedisCacheBackend,
};

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// Which cache backend fronts the snapshot queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// Shared Redis instance.
    Redis,
    /// Per-process map.
    Memory,
    /// No cache: every request hits the database.
    None,
}

impl FromStr for CacheBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackendKind::Redis),
            "memory" => Ok(CacheBackendKind::Memory),
            "none" | "off" | "disabled" => Ok(CacheBackendKind::None),
            other => Err(ConfigError::InvalidValue {
                name: "AXFR_CACHE_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected one of redis, memory, none".to_string(),
            }),
        }
    }
}

/// Cache settings read at startup.
#[derive(Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    /// Redis address, either `host:port` or a `redis://` URL.
    pub redis_url: Option<String>,
    /// Upper bound on each cache operation.
    pub op_timeout: Duration,
}

impl std::fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSettings")
            .field("backend", &self.backend)
            .field("redis_url", &self.redis_url.as_deref().map(redact_redis_url))
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::None,
            redis_url: None,
            op_timeout: Duration::from_millis(250),
        }
    }
}

impl CacheSettings {
    /// Create cache settings from environment variables.
    ///
    /// Environment variables:
    /// - `REDIS_URL`: Redis address; selects the Redis backend when set
    /// - `AXFR_CACHE_BACKEND`: `redis`, `memory` or `none` (overrides the above)
    /// - `AXFR_CACHE_TIMEOUT_MS`: per-operation timeout (default: 250)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`CacheSettings::from_env`] with an explicit variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let redis_url = var("REDIS_URL").filter(|url| !url.trim().is_empty());

        let backend = match var("AXFR_CACHE_BACKEND") {
            Some(value) => value.parse()?,
            None if redis_url.is_some() => CacheBackendKind::Redis,
            None => CacheBackendKind::None,
        };

        if backend == CacheBackendKind::Redis && redis_url.is_none() {
            return Err(ConfigError::MissingVar {
                name: "REDIS_URL".to_string(),
            });
        }

        let op_timeout = match var("AXFR_CACHE_TIMEOUT_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::InvalidValue {
                    name: "AXFR_CACHE_TIMEOUT_MS".to_string(),
                    value,
                    reason: e.to_string(),
                })?,
            None => Duration::from_millis(250),
        };

        Ok(Self {
            backend,
            redis_url,
            op_timeout,
        })
    }
}

const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How often the in-memory backend drops expired entries.
const MEMORY_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Build the read-through cache for the configured backend.
///
/// A Redis server that cannot be reached at startup disables caching with a
/// warning instead of aborting: the API is fully functional without it.
pub async fn build_cache(settings: &CacheSettings) -> ReadThroughCache {
    let config = CacheConfig::new().with_op_timeout(settings.op_timeout);

    let cache = match (settings.backend, settings.redis_url.as_deref()) {
        (CacheBackendKind::Redis, Some(url)) => {
            match tokio::time::timeout(REDIS_CONNECT_TIMEOUT, RedisCacheBackend::connect(url)).await
            {
                Ok(Ok(backend)) => ReadThroughCache::new(Arc::new(backend), config),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "redis unavailable, continuing without cache");
                    ReadThroughCache::disabled()
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = REDIS_CONNECT_TIMEOUT.as_secs(),
                        "redis connect timed out, continuing without cache"
                    );
                    ReadThroughCache::disabled()
                }
            }
        }
        (CacheBackendKind::Memory, _) => {
            let backend = Arc::new(InMemoryCacheBackend::new());
            backend.spawn_purger(MEMORY_PURGE_INTERVAL);
            ReadThroughCache::new(backend, config)
        }
        _ => ReadThroughCache::disabled(),
    };

    tracing::info!(backend = cache.backend_name(), "cache configured");
    cache
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_disable_cache() {
        let settings = CacheSettings::from_vars(vars(&[])).unwrap();
        assert_eq!(settings.backend, CacheBackendKind::None);
        assert_eq!(settings.op_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_redis_url_selects_redis() {
        let settings = CacheSettings::from_vars(vars(&[("REDIS_URL", "cache:6379")])).unwrap();
        assert_eq!(settings.backend, CacheBackendKind::Redis);
        assert_eq!(settings.redis_url.as_deref(), Some("cache:6379"));
    }

    #[test]
    fn test_explicit_backend_overrides_redis_url() {
        let settings = CacheSettings::from_vars(vars(&[
            ("REDIS_URL", "cache:6379"),
            ("AXFR_CACHE_BACKEND", "memory"),
            ("AXFR_CACHE_TIMEOUT_MS", "100"),
        ]))
        .unwrap();
        assert_eq!(settings.backend, CacheBackendKind::Memory);
        assert_eq!(settings.op_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_redis_without_url_is_rejected() {
        let err = CacheSettings::from_vars(vars(&[("AXFR_CACHE_BACKEND", "redis")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingVar {
                name: "REDIS_URL".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(CacheSettings::from_vars(vars(&[("AXFR_CACHE_BACKEND", "memcached")])).is_err());
        assert!(CacheSettings::from_vars(vars(&[("AXFR_CACHE_TIMEOUT_MS", "soon")])).is_err());
    }

    #[tokio::test]
    async fn test_build_cache_memory() {
        let settings = CacheSettings {
            backend: CacheBackendKind::Memory,
            ..Default::default()
        };
        let cache = build_cache(&settings).await;
        assert!(cache.is_enabled());
        assert_eq!(cache.backend_name(), "memory");
    }

    #[test]
    fn test_debug_hides_redis_password() {
        let settings = CacheSettings::from_vars(vars(&[("REDIS_URL", "redis://:secret@cache:6379/2")]))
            .unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("cache:6379"));
    }

    #[tokio::test]
    async fn test_build_cache_unreachable_redis_disables() {
        let settings = CacheSettings {
            backend: CacheBackendKind::Redis,
            redis_url: Some("127.0.0.1:1".to_string()),
            op_timeout: Duration::from_millis(250),
        };
        let cache = build_cache(&settings).await;
        assert!(!cache.is_enabled());
    }
}
