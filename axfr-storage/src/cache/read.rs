//! Result of a read-through cache lookup.

use super::error::CacheError;

/// How a payload was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOutcome {
    /// Served from the cache.
    Hit,
    /// Not cached; generated and stored.
    Miss,
    /// No backend configured; generated.
    Bypass,
    /// The backend failed on lookup or store; generated.
    Error,
}

impl CacheOutcome {
    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Bypass => "bypass",
            CacheOutcome::Error => "error",
        }
    }
}

/// A serialized payload plus where it came from.
///
/// A backend error here never means the payload is missing: the payload is
/// always present and valid, the error only reports that the cache could
/// not be used for this read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRead {
    payload: Vec<u8>,
    was_hit: bool,
    bypassed: bool,
    backend_error: Option<CacheError>,
}

impl CacheRead {
    /// Payload served from the cache.
    pub fn from_cache(payload: Vec<u8>) -> Self {
        Self {
            payload,
            was_hit: true,
            bypassed: false,
            backend_error: None,
        }
    }

    /// Payload produced by the generator after a miss.
    pub fn from_storage(payload: Vec<u8>) -> Self {
        Self {
            payload,
            was_hit: false,
            bypassed: false,
            backend_error: None,
        }
    }

    /// Payload produced by the generator with caching disabled.
    pub fn bypassed(payload: Vec<u8>) -> Self {
        Self {
            payload,
            was_hit: false,
            bypassed: true,
            backend_error: None,
        }
    }

    /// Attach the backend failure observed while serving this read.
    pub fn with_backend_error(mut self, error: CacheError) -> Self {
        self.backend_error = Some(error);
        self
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_hit
    }

    pub fn backend_error(&self) -> Option<&CacheError> {
        self.backend_error.as_ref()
    }

    pub fn outcome(&self) -> CacheOutcome {
        if self.backend_error.is_some() {
            CacheOutcome::Error
        } else if self.was_hit {
            CacheOutcome::Hit
        } else if self.bypassed {
            CacheOutcome::Bypass
        } else {
            CacheOutcome::Miss
        }
    }
}
