//! Snapshot store trait.
//!
//! This is the query layer as seen by the cache and the routes: one method
//! per query shape, each targeting a single dataset and returning typed rows.
//! Implementations must be read-only and must release any connection they
//! acquire before returning, on success and on error.

use async_trait::async_trait;
use axfr_core::{
    DatasetCode, DateAmount, DateCount, DomainPattern, DomainRecord, Page, QueryError,
    SnapshotDate,
};

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Dates with their domain counts, newest first, one page of 20.
    async fn list_dates(
        &self,
        dataset: DatasetCode,
        page: Page,
    ) -> Result<Vec<DateCount>, QueryError>;

    /// Domains recorded on `date`, lexicographically ascending, one page of 20.
    async fn list_domains(
        &self,
        dataset: DatasetCode,
        date: SnapshotDate,
        page: Page,
    ) -> Result<Vec<DomainRecord>, QueryError>;

    /// Domains containing `query` as a case-sensitive substring, shortest
    /// first (ties broken lexicographically).
    async fn search(
        &self,
        dataset: DatasetCode,
        query: &str,
    ) -> Result<Vec<DomainRecord>, QueryError>;

    /// Every date with its domain count, oldest first.
    async fn date_amounts(&self, dataset: DatasetCode) -> Result<Vec<DateAmount>, QueryError>;

    /// Earliest date on which a domain matching `pattern` was recorded.
    ///
    /// `Ok(None)` when nothing matches; that is not an error.
    async fn first_appearance(
        &self,
        dataset: DatasetCode,
        pattern: &DomainPattern,
    ) -> Result<Option<SnapshotDate>, QueryError>;

    /// Cheap round trip proving the dataset is reachable with its credentials.
    async fn ping(&self, dataset: DatasetCode) -> Result<(), QueryError>;

    /// Datasets this store can serve.
    fn datasets(&self) -> Vec<DatasetCode>;
}
