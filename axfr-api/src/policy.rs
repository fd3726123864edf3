//! Endpoint Policy
//!
//! One `EndpointQuery` per logical request. Building it validates the raw
//! path segments; once built it knows its cache key, its TTL tier, the
//! dataset it reads and how to produce its payload from a `SnapshotStore`.
//! Handlers never touch the cache or the store with unvalidated input.

use axfr_core::{
    to_payload, AxfrResult, DatasetCode, DiffTld, DomainPattern, EarliestDate, Page,
    SnapshotDate, ValidationError,
};
use axfr_storage::{CacheKey, SnapshotStore, TtlTier};

/// Longest query accepted by search and first-appearance lookups, the
/// maximum length of a DNS name.
pub const MAX_QUERY_LEN: usize = 253;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointQuery {
    /// Paginated date listing of a diff table.
    Dates { tld: DiffTld, page: Page },
    /// Paginated domain listing for one date of a diff table.
    Domains {
        tld: DiffTld,
        date: SnapshotDate,
        page: Page,
    },
    /// Substring search over any dataset.
    Search { dataset: DatasetCode, query: String },
    /// Per-date statistics of any dataset.
    Stats { dataset: DatasetCode },
    /// Earliest date a domain or wildcard pattern appears in a diff table.
    Appearance { tld: DiffTld, pattern: DomainPattern },
}

impl EndpointQuery {
    pub fn dates(tld: DiffTld, page: &str) -> Result<Self, ValidationError> {
        Ok(Self::Dates {
            tld,
            page: page.parse()?,
        })
    }

    pub fn domains(tld: DiffTld, date: &str, page: &str) -> Result<Self, ValidationError> {
        Ok(Self::Domains {
            tld,
            date: date.parse()?,
            page: page.parse()?,
        })
    }

    pub fn search(dataset: &str, query: &str) -> Result<Self, ValidationError> {
        Ok(Self::Search {
            dataset: dataset.parse()?,
            query: validate_query(query)?.to_string(),
        })
    }

    pub fn stats(dataset: &str) -> Result<Self, ValidationError> {
        Ok(Self::Stats {
            dataset: dataset.parse()?,
        })
    }

    pub fn appearance(tld: DiffTld, query: &str) -> Result<Self, ValidationError> {
        Ok(Self::Appearance {
            tld,
            pattern: DomainPattern::parse(validate_query(query)?),
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        match self {
            Self::Dates { tld, page } => CacheKey::dates(*tld, *page),
            Self::Domains { tld, date, page } => CacheKey::domains(*tld, *date, *page),
            Self::Search { dataset, query } => CacheKey::search(*dataset, query),
            Self::Stats { dataset } => CacheKey::stats(*dataset),
            Self::Appearance { tld, pattern } => CacheKey::appearance(*tld, pattern.as_str()),
        }
    }

    pub fn ttl_tier(&self) -> TtlTier {
        match self {
            Self::Search { .. } => TtlTier::Short,
            Self::Dates { .. } | Self::Domains { .. } | Self::Appearance { .. } => {
                TtlTier::Medium
            }
            Self::Stats { .. } => TtlTier::Long,
        }
    }

    pub fn dataset(&self) -> DatasetCode {
        match self {
            Self::Dates { tld, .. } | Self::Domains { tld, .. } | Self::Appearance { tld, .. } => {
                tld.dataset()
            }
            Self::Search { dataset, .. } | Self::Stats { dataset } => *dataset,
        }
    }

    /// Metric label for the endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Dates { .. } => "dates",
            Self::Domains { .. } => "domains",
            Self::Search { .. } => "search",
            Self::Stats { .. } => "stats",
            Self::Appearance { .. } => "appearance",
        }
    }

    /// Run the query and serialize its result.
    pub async fn generate(&self, store: &dyn SnapshotStore) -> AxfrResult<Vec<u8>> {
        let dataset = self.dataset();
        match self {
            Self::Dates { page, .. } => to_payload(&store.list_dates(dataset, *page).await?),
            Self::Domains { date, page, .. } => {
                to_payload(&store.list_domains(dataset, *date, *page).await?)
            }
            Self::Search { query, .. } => to_payload(&store.search(dataset, query).await?),
            Self::Stats { .. } => to_payload(&store.date_amounts(dataset).await?),
            Self::Appearance { pattern, .. } => {
                let earliest = store.first_appearance(dataset, pattern).await?;
                to_payload(&EarliestDate::from(earliest))
            }
        }
    }
}

fn validate_query(query: &str) -> Result<&str, ValidationError> {
    if query.trim().is_empty() {
        return Err(ValidationError::InvalidQuery {
            reason: "query must not be empty".to_string(),
        });
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(ValidationError::InvalidQuery {
            reason: format!("query longer than {MAX_QUERY_LEN} bytes"),
        });
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_policy_table() {
        let dates = EndpointQuery::dates(DiffTld::Se, "3").unwrap();
        assert_eq!(dates.cache_key().as_str(), "sedates:page:3");
        assert_eq!(dates.ttl_tier().duration(), Duration::from_secs(3600));
        assert_eq!(dates.dataset(), DatasetCode::SeDiff);

        let domains = EndpointQuery::domains(DiffTld::Nu, "20240101", "0").unwrap();
        assert_eq!(domains.cache_key().as_str(), "nurows:date:20240101:page:0");
        assert_eq!(domains.ttl_tier(), TtlTier::Medium);
        assert_eq!(domains.dataset(), DatasetCode::NuDiff);

        let search = EndpointQuery::search("se", "exa").unwrap();
        assert_eq!(search.cache_key().as_str(), "search:se:exa");
        assert_eq!(search.ttl_tier().duration(), Duration::from_secs(300));
        assert_eq!(search.dataset(), DatasetCode::Se);

        let stats = EndpointQuery::stats("ch").unwrap();
        assert_eq!(stats.cache_key().as_str(), "stats:ch");
        assert_eq!(stats.ttl_tier().duration(), Duration::from_secs(6 * 3600));

        let appearance = EndpointQuery::appearance(DiffTld::Se, "exam*").unwrap();
        assert_eq!(appearance.cache_key().as_str(), "seappearance:exam*");
        assert_eq!(appearance.ttl_tier(), TtlTier::Medium);
        assert_eq!(appearance.dataset(), DatasetCode::SeDiff);
    }

    #[test]
    fn test_unknown_dataset_rejected() {
        assert_eq!(
            EndpointQuery::search("xx", "exa").unwrap_err(),
            ValidationError::UnsupportedDataset {
                code: "xx".to_string()
            }
        );
        assert!(EndpointQuery::stats("SE").is_err());
    }

    #[test]
    fn test_invalid_segments_rejected() {
        assert!(matches!(
            EndpointQuery::dates(DiffTld::Se, "-1"),
            Err(ValidationError::InvalidPage { .. })
        ));
        assert!(matches!(
            EndpointQuery::domains(DiffTld::Se, "20240230", "0"),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            EndpointQuery::domains(DiffTld::Se, "20240101", "x"),
            Err(ValidationError::InvalidPage { .. })
        ));
        assert!(matches!(
            EndpointQuery::search("se", " "),
            Err(ValidationError::InvalidQuery { .. })
        ));
        assert!(matches!(
            EndpointQuery::appearance(DiffTld::Nu, &"a".repeat(300)),
            Err(ValidationError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_endpoint_labels() {
        assert_eq!(EndpointQuery::dates(DiffTld::Se, "0").unwrap().endpoint(), "dates");
        assert_eq!(EndpointQuery::stats("se").unwrap().endpoint(), "stats");
    }
}
