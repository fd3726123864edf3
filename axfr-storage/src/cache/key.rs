//! Cache keys and TTL tiers.
//!
//! Keys are human-readable and colon-delimited so they can be inspected with
//! `redis-cli` and shared with other deployments reading the same store:
//!
//! | Endpoint          | Key                                |
//! |-------------------|------------------------------------|
//! | date listing      | `sedates:page:<n>`                 |
//! | domain listing    | `serows:date:<yyyymmdd>:page:<n>`  |
//! | substring search  | `search:<dataset>:<query>`         |
//! | statistics        | `stats:<dataset>`                  |
//! | first appearance  | `seappearance:<query>`             |
//!
//! (`nu` variants replace the `se` prefix.) The inner string is private, so
//! the only keys that exist are the ones these constructors produce.

use std::fmt;
use std::time::Duration;

use axfr_core::{DatasetCode, DiffTld, Page, SnapshotDate};

/// A cache key for one (endpoint, parameters) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    inner: String,
}

impl CacheKey {
    /// Paginated date listing of a diff table.
    pub fn dates(tld: DiffTld, page: Page) -> Self {
        Self {
            inner: format!("{}dates:page:{}", tld, page.number()),
        }
    }

    /// Paginated domain listing for one date of a diff table.
    pub fn domains(tld: DiffTld, date: SnapshotDate, page: Page) -> Self {
        Self {
            inner: format!("{}rows:date:{}:page:{}", tld, date.as_i32(), page.number()),
        }
    }

    /// Substring search over a dataset.
    ///
    /// The query is the last component, so it may itself contain colons
    /// without colliding with another key.
    pub fn search(dataset: DatasetCode, query: &str) -> Self {
        Self {
            inner: format!("search:{}:{}", dataset, query),
        }
    }

    /// Per-date statistics of a dataset.
    pub fn stats(dataset: DatasetCode) -> Self {
        Self {
            inner: format!("stats:{}", dataset),
        }
    }

    /// First appearance of a domain or pattern in a diff table.
    pub fn appearance(tld: DiffTld, query: &str) -> Self {
        Self {
            inner: format!("{}appearance:{}", tld, query),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

/// Expiration classes by data volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlTier {
    /// Search results: 5 minutes.
    Short,
    /// Paginated listings and first-appearance lookups: 1 hour.
    Medium,
    /// Aggregate statistics: 6 hours.
    Long,
}

impl TtlTier {
    pub fn duration(&self) -> Duration {
        match self {
            TtlTier::Short => Duration::from_secs(5 * 60),
            TtlTier::Medium => Duration::from_secs(60 * 60),
            TtlTier::Long => Duration::from_secs(6 * 60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: i64) -> SnapshotDate {
        SnapshotDate::from_yyyymmdd(value).expect("valid date")
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(CacheKey::dates(DiffTld::Se, Page::new(0)).as_str(), "sedates:page:0");
        assert_eq!(CacheKey::dates(DiffTld::Nu, Page::new(3)).as_str(), "nudates:page:3");
        assert_eq!(
            CacheKey::domains(DiffTld::Se, date(20240101), Page::new(2)).as_str(),
            "serows:date:20240101:page:2"
        );
        assert_eq!(
            CacheKey::domains(DiffTld::Nu, date(20231224), Page::new(0)).as_str(),
            "nurows:date:20231224:page:0"
        );
        assert_eq!(CacheKey::search(DatasetCode::Se, "example").as_str(), "search:se:example");
        assert_eq!(
            CacheKey::search(DatasetCode::NuDiff, "exa").as_str(),
            "search:nu_diff:exa"
        );
        assert_eq!(CacheKey::stats(DatasetCode::Ch).as_str(), "stats:ch");
        assert_eq!(
            CacheKey::appearance(DiffTld::Se, "example.se").as_str(),
            "seappearance:example.se"
        );
        assert_eq!(
            CacheKey::appearance(DiffTld::Nu, "exam*").as_str(),
            "nuappearance:exam*"
        );
    }

    #[test]
    fn test_ttl_tiers() {
        assert_eq!(TtlTier::Short.duration(), Duration::from_secs(300));
        assert_eq!(TtlTier::Medium.duration(), Duration::from_secs(3600));
        assert_eq!(TtlTier::Long.duration(), Duration::from_secs(21600));
    }

    #[test]
    fn test_same_query_same_key() {
        assert_eq!(
            CacheKey::search(DatasetCode::Se, "exa"),
            CacheKey::search(DatasetCode::Se, "exa")
        );
    }
}
