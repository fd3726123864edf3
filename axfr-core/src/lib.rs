//! AXFR Core - Snapshot Data Types
//!
//! Pure data structures shared by the storage and API crates: dataset codes,
//! validated request parameters, the row shapes produced by snapshot queries,
//! and the error taxonomy. No I/O lives here.

pub mod dataset;
pub mod date;
pub mod error;
pub mod pattern;
pub mod payload;

pub use dataset::{DatasetCode, DiffTld};
pub use date::{Page, SnapshotDate, PAGE_SIZE};
pub use error::{AxfrError, AxfrResult, ConfigError, QueryError, ValidationError};
pub use pattern::DomainPattern;
pub use payload::{error_payload, to_payload};

use serde::{Deserialize, Serialize};

// ============================================================================
// QUERY RESULT ROWS
// ============================================================================

/// A single domain name from a dump or diff table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainRecord {
    pub domain: String,
}

impl DomainRecord {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

/// Number of domains recorded for a date, with the raw YYYYMMDD integer.
///
/// Returned by the paginated date listings: `{"date": 20240101, "amount": 512}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
    pub date: i32,
    pub amount: i64,
}

/// Number of domains recorded for a date, rendered as ISO-8601.
///
/// Returned by the statistics endpoint: `{"date": "2024-01-01", "amount": 512}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateAmount {
    pub date: SnapshotDate,
    pub amount: i64,
}

/// Earliest date a domain (or pattern) appears in a diff table.
///
/// Serializes as `{"earliest_date": "YYYY-MM-DD"}` or
/// `{"earliest_date": null}` when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EarliestDate {
    pub earliest_date: Option<SnapshotDate>,
}

impl From<Option<SnapshotDate>> for EarliestDate {
    fn from(earliest_date: Option<SnapshotDate>) -> Self {
        Self { earliest_date }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_record_shape() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(DomainRecord::new("example.se"))?;
        assert_eq!(value, json!({"domain": "example.se"}));
        Ok(())
    }

    #[test]
    fn test_date_count_keeps_integer_date() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(DateCount {
            date: 20240101,
            amount: 512,
        })?;
        assert_eq!(value, json!({"date": 20240101, "amount": 512}));
        Ok(())
    }

    #[test]
    fn test_date_amount_reformats_date() -> Result<(), serde_json::Error> {
        let date = SnapshotDate::from_yyyymmdd(20240115).expect("valid date");
        let value = serde_json::to_value(DateAmount { date, amount: 3 })?;
        assert_eq!(value, json!({"date": "2024-01-15", "amount": 3}));
        Ok(())
    }

    #[test]
    fn test_earliest_date_null_when_absent() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(EarliestDate::from(None))?;
        assert_eq!(value, json!({"earliest_date": null}));

        let date = SnapshotDate::from_yyyymmdd(20200301);
        let value = serde_json::to_value(EarliestDate::from(date))?;
        assert_eq!(value, json!({"earliest_date": "2020-03-01"}));
        Ok(())
    }
}
