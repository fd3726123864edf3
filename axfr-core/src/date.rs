//! Snapshot dates and page numbers.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Number of records per page for every paginated listing.
pub const PAGE_SIZE: i64 = 20;

/// A calendar date as stored in the snapshot tables: an 8-digit YYYYMMDD
/// integer.
///
/// Construction validates that the integer names a real date, so every
/// `SnapshotDate` can be rendered as ISO-8601. Serializes as `"YYYY-MM-DD"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotDate(i32);

impl SnapshotDate {
    /// Validate a stored YYYYMMDD integer.
    pub fn from_yyyymmdd(value: i64) -> Option<Self> {
        if !(10_000_101..=99_991_231).contains(&value) {
            return None;
        }
        let year = (value / 10_000) as i32;
        let month = ((value / 100) % 100) as u32;
        let day = (value % 100) as u32;
        NaiveDate::from_ymd_opt(year, month, day).map(|_| Self(value as i32))
    }

    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        let value =
            i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day());
        Self::from_yyyymmdd(value)
    }

    /// The raw YYYYMMDD integer, as bound into SQL and used in cache keys.
    pub fn as_i32(&self) -> i32 {
        self.0
    }

    pub fn to_naive(&self) -> NaiveDate {
        let year = self.0 / 10_000;
        let month = ((self.0 / 100) % 100) as u32;
        let day = (self.0 % 100) as u32;
        // Validated on construction.
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    /// ISO-8601 rendering: `20240115` becomes `"2024-01-15"`.
    pub fn to_iso(&self) -> String {
        self.to_naive().format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for SnapshotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SnapshotDate {
    type Err = ValidationError;

    /// Parse a URL path segment. Exactly eight ASCII digits naming a real date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidDate {
            value: s.to_string(),
        };
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: i64 = s.parse().map_err(|_| invalid())?;
        Self::from_yyyymmdd(value).ok_or_else(invalid)
    }
}

impl Serialize for SnapshotDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

/// A 0-indexed page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Page(u32);

impl Page {
    pub fn new(page: u32) -> Self {
        Self(page)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// Row offset of the first record on this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.0) * PAGE_SIZE
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Page {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Page)
            .map_err(|_| ValidationError::InvalidPage {
                value: s.to_string(),
            })
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Any real calendar date renders to the same ISO string chrono produces.
        #[test]
        fn prop_iso_matches_chrono(days in 0i64..3_000_000) {
            let base = NaiveDate::from_ymd_opt(1000, 1, 1).expect("valid base");
            let naive = base + chrono::Duration::days(days);
            prop_assume!(naive.year() <= 9999);
            let date = SnapshotDate::from_naive(naive).expect("in range");
            prop_assert_eq!(date.to_iso(), naive.format("%Y-%m-%d").to_string());
            prop_assert_eq!(date.to_string().parse::<SnapshotDate>(), Ok(date));
        }
    }
}
