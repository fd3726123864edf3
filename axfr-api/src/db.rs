//! Database Connection Pool Module
//!
//! PostgreSQL access for the snapshot datasets using deadpool-postgres.
//! Every dataset (full dumps and daily diffs) lives in its own database with
//! its own credentials, so `DbClient` keeps one bounded pool per configured
//! dataset and routes each query to the pool of the dataset it targets.
//!
//! All statements are read-only. A connection is held only for the duration
//! of one statement and goes back to its pool when the pooled object drops,
//! on success and on every error path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axfr_core::{
    DatasetCode, DateAmount, DateCount, DomainPattern, DomainRecord, Page, QueryError,
    SnapshotDate,
};
use axfr_storage::SnapshotStore;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime, Timeouts,
};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Connection settings shared by every dataset database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Maximum pool size, per dataset
    pub max_size: usize,
    /// Pool wait / connect / recycle timeout
    pub timeout: Duration,
    /// Upper bound on one statement, connection acquisition included
    pub query_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            max_size: 16,
            timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("AXFR_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("AXFR_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            max_size: std::env::var("AXFR_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("AXFR_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            query_timeout: Duration::from_millis(
                std::env::var("AXFR_DB_QUERY_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10_000),
            ),
        }
    }

    /// `host:port` of the database server, used by the liveness probe.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create a connection pool for one dataset database.
    ///
    /// No connection is opened here; the first query does that.
    pub fn create_pool(&self, credential: &DatasetCredential) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(credential.dbname.clone());
        cfg.user = Some(credential.user.clone());
        cfg.password = Some(credential.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        let mut timeouts = Timeouts::new();
        timeouts.wait = Some(self.timeout);
        timeouts.create = Some(self.timeout);
        timeouts.recycle = Some(self.timeout);
        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts = timeouts;
        cfg.pool = Some(pool_cfg);

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
            ApiError::internal_error(format!(
                "Failed to create pool for {}: {}",
                credential.dataset, e
            ))
        })?;

        Ok(pool)
    }
}

// ============================================================================
// DATASET REGISTRY
// ============================================================================

/// Database name and credentials of one dataset.
#[derive(Clone, PartialEq, Eq)]
pub struct DatasetCredential {
    pub dataset: DatasetCode,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for DatasetCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCredential")
            .field("dataset", &self.dataset)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Datasets this process can serve, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    credentials: Vec<DatasetCredential>,
}

impl DatasetRegistry {
    /// Read `AXFR_<NAME>_DATABASE`, `AXFR_<NAME>_USERNAME` and
    /// `AXFR_<NAME>_PASSWORD` for every dataset code.
    ///
    /// A dataset without a database name is left unconfigured.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`DatasetRegistry::from_env`] with an explicit variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let credentials = DatasetCode::ALL
            .into_iter()
            .filter_map(|dataset| {
                let prefix = format!("AXFR_{}", dataset.env_name());
                let dbname = var(&format!("{prefix}_DATABASE")).filter(|s| !s.is_empty())?;
                Some(DatasetCredential {
                    dataset,
                    dbname,
                    user: var(&format!("{prefix}_USERNAME")).unwrap_or_default(),
                    password: var(&format!("{prefix}_PASSWORD")).unwrap_or_default(),
                })
            })
            .collect();

        Self { credentials }
    }

    #[cfg(test)]
    fn with_credential(mut self, credential: DatasetCredential) -> Self {
        self.credentials.retain(|c| c.dataset != credential.dataset);
        self.credentials.push(credential);
        self
    }

    pub fn get(&self, dataset: DatasetCode) -> Option<&DatasetCredential> {
        self.credentials.iter().find(|c| c.dataset == dataset)
    }

    pub fn datasets(&self) -> Vec<DatasetCode> {
        self.credentials.iter().map(|c| c.dataset).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

const LIST_DATES_SQL: &str = "SELECT date::INT4, amount::INT8 FROM dates \
     ORDER BY date DESC OFFSET $1::INT8 ROWS FETCH FIRST $2::INT8 ROWS ONLY";

const LIST_DOMAINS_SQL: &str = "SELECT domains.domain::TEXT FROM domains \
     JOIN dates ON domains.dategrp = dates.id WHERE dates.date = $1::INT4 \
     ORDER BY domains.domain ASC OFFSET $2::INT8 ROWS FETCH FIRST $3::INT8 ROWS ONLY";

const SEARCH_SQL: &str = "SELECT domain::TEXT FROM domains WHERE strpos(domain, $1::TEXT) > 0 \
     ORDER BY char_length(domain) ASC, domain ASC";

const DATE_AMOUNTS_SQL: &str = "SELECT date::INT4, amount::INT8 FROM dates ORDER BY date ASC";

const FIRST_APPEARANCE_EXACT_SQL: &str = "SELECT MIN(dates.date)::INT4 FROM domains \
     JOIN dates ON domains.dategrp = dates.id WHERE domains.domain = $1::TEXT";

const FIRST_APPEARANCE_LIKE_SQL: &str = "SELECT MIN(dates.date)::INT4 FROM domains \
     JOIN dates ON domains.dategrp = dates.id WHERE domains.domain LIKE $1::TEXT ESCAPE '\\'";

/// Pools for every configured dataset.
#[derive(Clone)]
pub struct DbClient {
    pools: Arc<HashMap<DatasetCode, Pool>>,
    query_timeout: Duration,
}

impl DbClient {
    /// Create one pool per dataset in `registry`.
    pub fn from_config(config: &DbConfig, registry: &DatasetRegistry) -> ApiResult<Self> {
        let mut pools = HashMap::new();
        for credential in &registry.credentials {
            pools.insert(credential.dataset, config.create_pool(credential)?);
        }
        Ok(Self {
            pools: Arc::new(pools),
            query_timeout: config.query_timeout,
        })
    }

    /// Current pool size per dataset, for observability.
    pub fn pool_sizes(&self) -> Vec<(DatasetCode, usize)> {
        let mut sizes: Vec<_> = self
            .pools
            .iter()
            .map(|(code, pool)| (*code, pool.status().size))
            .collect();
        sizes.sort_by_key(|(code, _)| *code);
        sizes
    }

    /// Get a connection from the dataset's pool.
    async fn get_conn(&self, dataset: DatasetCode) -> Result<deadpool_postgres::Object, QueryError> {
        let pool = self
            .pools
            .get(&dataset)
            .ok_or(QueryError::DatasetNotConfigured { dataset })?;
        pool.get().await.map_err(|e| pool_error(dataset, e))
    }

    /// Run one statement against `dataset`, bounded by the query timeout.
    async fn query(
        &self,
        dataset: DatasetCode,
        operation: &'static str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, QueryError> {
        let start = Instant::now();

        let result = match tokio::time::timeout(self.query_timeout, async {
            let conn = self.get_conn(dataset).await?;
            conn.query(sql, params)
                .await
                .map_err(|e| statement_error(dataset, e))
        })
        .await
        {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout {
                dataset,
                elapsed_ms: self.query_timeout.as_millis() as u64,
            }),
        };

        let elapsed = start.elapsed();
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_db_query(operation, dataset.as_str(), result.is_ok(), elapsed.as_secs_f64());
        }
        match &result {
            Ok(rows) => tracing::debug!(
                dataset = %dataset,
                operation,
                rows = rows.len(),
                duration_ms = elapsed.as_millis() as u64,
                "query completed"
            ),
            Err(e) => tracing::error!(dataset = %dataset, operation, error = %e, "query failed"),
        }

        result
    }
}

fn pool_error(dataset: DatasetCode, err: PoolError) -> QueryError {
    let reason = match &err {
        PoolError::Timeout(_) => "connection pool exhausted".to_string(),
        PoolError::Closed => "connection pool is closed".to_string(),
        other => other.to_string(),
    };
    QueryError::Connection { dataset, reason }
}

fn statement_error(dataset: DatasetCode, err: tokio_postgres::Error) -> QueryError {
    if err.is_closed() {
        QueryError::Connection {
            dataset,
            reason: err.to_string(),
        }
    } else {
        QueryError::Execution {
            dataset,
            reason: err.to_string(),
        }
    }
}

fn column<'a, T>(dataset: DatasetCode, row: &'a Row, idx: usize) -> Result<T, QueryError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(idx).map_err(|e| QueryError::Execution {
        dataset,
        reason: format!("column {idx}: {e}"),
    })
}

fn snapshot_date(dataset: DatasetCode, raw: i32) -> Result<SnapshotDate, QueryError> {
    SnapshotDate::from_yyyymmdd(raw as i64).ok_or(QueryError::MalformedDate {
        dataset,
        value: raw as i64,
    })
}

fn domain_rows(dataset: DatasetCode, rows: &[Row]) -> Result<Vec<DomainRecord>, QueryError> {
    rows.iter()
        .map(|row| column::<String>(dataset, row, 0).map(DomainRecord::new))
        .collect()
}

// ============================================================================
// SNAPSHOT QUERIES
// ============================================================================

#[async_trait]
impl SnapshotStore for DbClient {
    async fn list_dates(
        &self,
        dataset: DatasetCode,
        page: Page,
    ) -> Result<Vec<DateCount>, QueryError> {
        let rows = self
            .query(
                dataset,
                "list_dates",
                LIST_DATES_SQL,
                &[&page.offset(), &page.limit()],
            )
            .await?;

        rows.iter()
            .map(|row| {
                Ok(DateCount {
                    date: column(dataset, row, 0)?,
                    amount: column(dataset, row, 1)?,
                })
            })
            .collect()
    }

    async fn list_domains(
        &self,
        dataset: DatasetCode,
        date: SnapshotDate,
        page: Page,
    ) -> Result<Vec<DomainRecord>, QueryError> {
        let rows = self
            .query(
                dataset,
                "list_domains",
                LIST_DOMAINS_SQL,
                &[&date.as_i32(), &page.offset(), &page.limit()],
            )
            .await?;
        domain_rows(dataset, &rows)
    }

    async fn search(
        &self,
        dataset: DatasetCode,
        query: &str,
    ) -> Result<Vec<DomainRecord>, QueryError> {
        let rows = self.query(dataset, "search", SEARCH_SQL, &[&query]).await?;
        domain_rows(dataset, &rows)
    }

    async fn date_amounts(&self, dataset: DatasetCode) -> Result<Vec<DateAmount>, QueryError> {
        let rows = self
            .query(dataset, "date_amounts", DATE_AMOUNTS_SQL, &[])
            .await?;

        rows.iter()
            .map(|row| {
                let raw: i32 = column(dataset, row, 0)?;
                Ok(DateAmount {
                    date: snapshot_date(dataset, raw)?,
                    amount: column(dataset, row, 1)?,
                })
            })
            .collect()
    }

    async fn first_appearance(
        &self,
        dataset: DatasetCode,
        pattern: &DomainPattern,
    ) -> Result<Option<SnapshotDate>, QueryError> {
        let rows = if pattern.is_wildcard() {
            let like = pattern.to_like_pattern();
            self.query(dataset, "first_appearance", FIRST_APPEARANCE_LIKE_SQL, &[&like])
                .await?
        } else {
            let exact = pattern.as_str();
            self.query(dataset, "first_appearance", FIRST_APPEARANCE_EXACT_SQL, &[&exact])
                .await?
        };

        // MIN over no rows is a single NULL row
        let earliest: Option<i32> = match rows.first() {
            Some(row) => column(dataset, row, 0)?,
            None => None,
        };
        earliest.map(|raw| snapshot_date(dataset, raw)).transpose()
    }

    async fn ping(&self, dataset: DatasetCode) -> Result<(), QueryError> {
        self.query(dataset, "ping", "SELECT 1", &[]).await.map(|_| ())
    }

    fn datasets(&self) -> Vec<DatasetCode> {
        let mut codes: Vec<DatasetCode> = self.pools.keys().copied().collect();
        codes.sort();
        codes
    }
}
