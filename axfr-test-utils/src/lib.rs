//! AXFR Test Utilities
//!
//! Shared test infrastructure for the AXFR workspace:
//! - An in-memory `SnapshotStore` with the same ordering and paging rules as
//!   the PostgreSQL store, plus call counting and failure injection
//! - Cache backends that fail on demand
//! - Proptest generators for request parameters
//! - Fixtures for common datasets

// Re-export core types for convenience
pub use axfr_core::{
    DatasetCode, DateAmount, DateCount, DiffTld, DomainPattern, DomainRecord, EarliestDate,
    Page, QueryError, SnapshotDate, PAGE_SIZE,
};
pub use axfr_storage::{CacheBackend, CacheError, CacheKey, InMemoryCacheBackend, SnapshotStore};

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

// ============================================================================
// IN-MEMORY SNAPSHOT STORE
// ============================================================================

/// Rows of one dataset: snapshot date to the domains recorded on it.
type DatasetRows = BTreeMap<SnapshotDate, Vec<String>>;

/// `SnapshotStore` over plain maps.
///
/// Only datasets added through [`InMemorySnapshotStore::with_snapshot`] (or
/// [`InMemorySnapshotStore::with_dataset`]) are configured; every other
/// dataset answers [`QueryError::DatasetNotConfigured`], like a store whose
/// credentials are missing.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    datasets: HashMap<DatasetCode, DatasetRows>,
    calls: AtomicUsize,
    failure: Mutex<Option<QueryError>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dataset` with no rows.
    pub fn with_dataset(mut self, dataset: DatasetCode) -> Self {
        self.datasets.entry(dataset).or_default();
        self
    }

    /// Record `domains` under `date` (YYYYMMDD) in `dataset`.
    ///
    /// Panics on an impossible date; fixtures are expected to be valid.
    pub fn with_snapshot(mut self, dataset: DatasetCode, date: i64, domains: &[&str]) -> Self {
        let date = SnapshotDate::from_yyyymmdd(date)
            .unwrap_or_else(|| panic!("fixture date {date} is not a calendar date"));
        self.datasets
            .entry(dataset)
            .or_default()
            .entry(date)
            .or_default()
            .extend(domains.iter().map(|d| d.to_string()));
        self
    }

    /// Make every subsequent query fail with `error` until cleared.
    pub fn fail_with(&self, error: QueryError) {
        *self.failure_slot() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure_slot() = None;
    }

    /// Number of store operations executed so far, `ping` excluded.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn failure_slot(&self) -> std::sync::MutexGuard<'_, Option<QueryError>> {
        self.failure.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rows(&self, dataset: DatasetCode) -> Result<&DatasetRows, QueryError> {
        if let Some(error) = self.failure_slot().clone() {
            return Err(error);
        }
        self.datasets
            .get(&dataset)
            .ok_or(QueryError::DatasetNotConfigured { dataset })
    }

    fn query(&self, dataset: DatasetCode) -> Result<&DatasetRows, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows(dataset)
    }
}

fn paginate<T>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn list_dates(
        &self,
        dataset: DatasetCode,
        page: Page,
    ) -> Result<Vec<DateCount>, QueryError> {
        let rows = self.query(dataset)?;
        Ok(paginate(
            rows.iter().rev().map(|(date, domains)| DateCount {
                date: date.as_i32(),
                amount: domains.len() as i64,
            }),
            page,
        ))
    }

    async fn list_domains(
        &self,
        dataset: DatasetCode,
        date: SnapshotDate,
        page: Page,
    ) -> Result<Vec<DomainRecord>, QueryError> {
        let rows = self.query(dataset)?;
        let mut domains: Vec<&String> = rows.get(&date).map(|d| d.iter().collect()).unwrap_or_default();
        domains.sort();
        Ok(paginate(
            domains.into_iter().map(|d| DomainRecord::new(d.as_str())),
            page,
        ))
    }

    async fn search(
        &self,
        dataset: DatasetCode,
        query: &str,
    ) -> Result<Vec<DomainRecord>, QueryError> {
        let rows = self.query(dataset)?;
        let mut found: Vec<&String> = rows
            .values()
            .flatten()
            .filter(|domain| domain.contains(query))
            .collect();
        found.sort_by(|a, b| a.chars().count().cmp(&b.chars().count()).then_with(|| a.cmp(b)));
        Ok(found
            .into_iter()
            .map(|d| DomainRecord::new(d.as_str()))
            .collect())
    }

    async fn date_amounts(&self, dataset: DatasetCode) -> Result<Vec<DateAmount>, QueryError> {
        let rows = self.query(dataset)?;
        Ok(rows
            .iter()
            .map(|(date, domains)| DateAmount {
                date: *date,
                amount: domains.len() as i64,
            })
            .collect())
    }

    async fn first_appearance(
        &self,
        dataset: DatasetCode,
        pattern: &DomainPattern,
    ) -> Result<Option<SnapshotDate>, QueryError> {
        let rows = self.query(dataset)?;
        Ok(rows
            .iter()
            .find(|(_, domains)| domains.iter().any(|d| pattern.matches(d)))
            .map(|(date, _)| *date))
    }

    async fn ping(&self, dataset: DatasetCode) -> Result<(), QueryError> {
        self.rows(dataset).map(|_| ())
    }

    fn datasets(&self) -> Vec<DatasetCode> {
        DatasetCode::ALL
            .into_iter()
            .filter(|code| self.datasets.contains_key(code))
            .collect()
    }
}

// ============================================================================
// CACHE BACKENDS
// ============================================================================

/// Cache backend that fails every operation.
#[derive(Debug, Default)]
pub struct FailingCacheBackend {
    attempts: AtomicUsize,
}

impl FailingCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of get/set calls received.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn refuse(&self) -> CacheError {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        CacheError::Connection {
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Err(self.refuse())
    }

    async fn set(&self, _key: &CacheKey, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        Err(self.refuse())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::Connection {
            reason: "connection refused".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// In-memory backend that records every key it was asked to store.
#[derive(Debug, Default)]
pub struct RecordingCacheBackend {
    inner: InMemoryCacheBackend,
    stored: Mutex<Vec<(String, Duration)>>,
}

impl RecordingCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(key, ttl)` pairs in the order they were stored.
    pub fn stored(&self) -> Vec<(String, Duration)> {
        self.stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.stored().into_iter().map(|(key, _)| key).collect()
    }
}

#[async_trait]
impl CacheBackend for RecordingCacheBackend {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((key.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for request parameters.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_dataset_code() -> impl Strategy<Value = DatasetCode> {
        proptest::sample::select(DatasetCode::ALL.to_vec())
    }

    pub fn arb_diff_tld() -> impl Strategy<Value = DiffTld> {
        prop_oneof![Just(DiffTld::Se), Just(DiffTld::Nu)]
    }

    /// Valid calendar dates between 1990 and 2099.
    pub fn arb_snapshot_date() -> impl Strategy<Value = SnapshotDate> {
        (1990i64..2100, 1i64..=12, 1i64..=28).prop_map(|(y, m, d)| {
            SnapshotDate::from_yyyymmdd(y * 10_000 + m * 100 + d)
                .unwrap_or_else(|| panic!("{y}-{m}-{d} is a calendar date"))
        })
    }

    pub fn arb_page() -> impl Strategy<Value = Page> {
        (0u32..50).prop_map(Page::new)
    }

    /// Lowercase domain labels under one of the served TLDs.
    pub fn arb_domain() -> impl Strategy<Value = String> {
        (
            "[a-z][a-z0-9-]{0,14}",
            prop_oneof![Just("se"), Just("nu"), Just("ch"), Just("li"), Just("ee"), Just("sk")],
        )
            .prop_map(|(label, tld)| format!("{label}.{tld}"))
    }

    /// A list of distinct domains, possibly empty.
    pub fn arb_domains(max: usize) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::btree_set(arb_domain(), 0..max).prop_map(|set| set.into_iter().collect())
    }

    /// Path segments that are not valid page numbers.
    pub fn arb_invalid_page() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("-1".to_string()),
            Just("abc".to_string()),
            Just("1.5".to_string()),
            Just("99999999999999999999".to_string()),
            "[a-z]{1,6}",
        ]
    }

    /// Path segments that are not valid YYYYMMDD dates.
    pub fn arb_invalid_date() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("2024-01-01".to_string()),
            Just("20241301".to_string()),
            Just("20240230".to_string()),
            Just("2024011".to_string()),
            Just("202401011".to_string()),
            "[a-z]{8}",
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built stores for common scenarios.

    use super::*;

    /// Full `se` dump with a handful of domains matching `exa`.
    pub fn se_dump() -> InMemorySnapshotStore {
        InMemorySnapshotStore::new().with_snapshot(
            DatasetCode::Se,
            20240101,
            &["example.se", "exa.se", "texas.se", "shop.se", "bank.se"],
        )
    }

    /// `se_diff` with three daily snapshots and a domain that reappears.
    pub fn se_diff() -> InMemorySnapshotStore {
        InMemorySnapshotStore::new()
            .with_snapshot(DatasetCode::SeDiff, 20231230, &["first.se", "example.se"])
            .with_snapshot(DatasetCode::SeDiff, 20231231, &["second.se"])
            .with_snapshot(
                DatasetCode::SeDiff,
                20240101,
                &["example.se", "newyear.se", "exam.se"],
            )
    }

    /// A diff table with one date holding `count` generated domains.
    pub fn large_snapshot(dataset: DatasetCode, date: i64, count: usize) -> InMemorySnapshotStore {
        let domains: Vec<String> = (0..count).map(|i| format!("domain{i:05}.se")).collect();
        let refs: Vec<&str> = domains.iter().map(String::as_str).collect();
        InMemorySnapshotStore::new().with_snapshot(dataset, date, &refs)
    }

    /// Every dataset registered, one small snapshot each.
    pub fn all_datasets() -> InMemorySnapshotStore {
        DatasetCode::ALL
            .into_iter()
            .fold(InMemorySnapshotStore::new(), |store, code| {
                let domain = format!("example.{}", code.as_str().trim_end_matches("_diff"));
                store.with_snapshot(code, 20240101, &[domain.as_str()])
            })
    }
}
