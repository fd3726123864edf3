//! Redis cache backend.
//!
//! Payloads are stored as plain string values with `SET key value EX ttl`,
//! so several API instances (or other deployments of the same service) can
//! share one Redis. `ConnectionManager` reconnects transparently after the
//! server goes away; while it is down every operation fails fast and the
//! read-through cache falls back to the database.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::error::CacheError;
use super::key::CacheKey;
use super::traits::CacheBackend;

/// Accept either a full `redis://` URL or a bare `host:port` address.
pub fn normalize_redis_url(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{}", address)
    }
}

/// `url` with any userinfo masked, safe to log.
///
/// `redis://:secret@cache:6379/2` becomes `redis://***@cache:6379/2`.
pub fn redact_redis_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let redacted = match rest[..authority_end].rfind('@') {
        Some(at) => format!("***{}", &rest[at..]),
        None => rest.to_string(),
    };
    match scheme {
        Some(scheme) => format!("{scheme}://{redacted}"),
        None => redacted,
    }
}

#[derive(Clone)]
pub struct RedisCacheBackend {
    conn: ConnectionManager,
    /// Redacted; the raw URL only reaches `redis::Client::open`.
    url: String,
}

impl RedisCacheBackend {
    /// Connect to `address` and verify the server answers `PING`.
    pub async fn connect(address: &str) -> Result<Self, CacheError> {
        let url = normalize_redis_url(address);
        let client = redis::Client::open(url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        let backend = Self {
            conn,
            url: redact_redis_url(&url),
        };
        backend.ping().await?;

        tracing::info!(url = %backend.url, "connected to redis cache");
        Ok(backend)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheBackend")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key.as_str()).await?;
        Ok(value)
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key.as_str(), value, seconds).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
