//! Cache backend errors.

use thiserror::Error;

/// Any failure talking to a cache backend other than "key not found".
///
/// None of these are fatal: the read-through cache logs them and serves the
/// request from the generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("Cache connection failed: {reason}")]
    Connection { reason: String },

    /// The backend answered with an error.
    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    /// The backend did not answer within the configured bound.
    #[error("Cache operation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            CacheError::Connection {
                reason: err.to_string(),
            }
        } else {
            CacheError::Backend {
                reason: err.to_string(),
            }
        }
    }
}
