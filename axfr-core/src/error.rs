//! Error types for AXFR snapshot operations

use crate::DatasetCode;
use thiserror::Error;

/// Malformed client input. Always a client error, never touches the cache
/// or the database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported TLD: {code}")]
    UnsupportedDataset { code: String },

    #[error("Invalid page number: {value}")]
    InvalidPage { value: String },

    #[error("Invalid date: {value}")]
    InvalidDate { value: String },

    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },
}

/// Failures reaching or querying a dataset.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Connection to {dataset} failed: {reason}")]
    Connection { dataset: DatasetCode, reason: String },

    #[error("Query on {dataset} failed: {reason}")]
    Execution { dataset: DatasetCode, reason: String },

    #[error("Query on {dataset} timed out after {elapsed_ms}ms")]
    Timeout { dataset: DatasetCode, elapsed_ms: u64 },

    #[error("Dataset {dataset} is not configured")]
    DatasetNotConfigured { dataset: DatasetCode },

    #[error("Malformed date {value} in {dataset}")]
    MalformedDate { dataset: DatasetCode, value: i64 },
}

impl QueryError {
    /// The reason shown to clients in the `{"error": ...}` body.
    ///
    /// Internal details (hostnames, SQL state) stay in the logs.
    pub fn public_reason(&self) -> &'static str {
        match self {
            QueryError::Connection { .. } | QueryError::DatasetNotConfigured { .. } => {
                "database connection failed"
            }
            QueryError::Timeout { .. } => "query timed out",
            QueryError::Execution { .. } | QueryError::MalformedDate { .. } => "query failed",
        }
    }

    /// Dataset the failing operation targeted.
    pub fn dataset(&self) -> DatasetCode {
        match self {
            QueryError::Connection { dataset, .. }
            | QueryError::Execution { dataset, .. }
            | QueryError::Timeout { dataset, .. }
            | QueryError::DatasetNotConfigured { dataset }
            | QueryError::MalformedDate { dataset, .. } => *dataset,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration variable: {name}")]
    MissingVar { name: String },

    #[error("Invalid value for {name}: {value} - {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all AXFR errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AxfrError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AxfrError {
    fn from(err: serde_json::Error) -> Self {
        AxfrError::Serialization(err.to_string())
    }
}

/// Result type alias for AXFR operations.
pub type AxfrResult<T> = Result<T, AxfrError>;

// =============================================================================
// TESTS
// =============================================================================
