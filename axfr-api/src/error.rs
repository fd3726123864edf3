//! Error Types for the AXFR API
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct carrying a code and the client-facing message
//! - ErrorCode enum mapping each error category to an HTTP status
//! - IntoResponse rendering `{"error": "<message>"}`
//!
//! Client input problems are 400s. A dataset that cannot be reached or
//! queried is a 503, so monitoring can tell it apart from a successful
//! empty result. Internal details never reach the response body.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use axfr_core::{error_payload, AxfrError, ConfigError, QueryError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Client Errors (400, 404)
    // ========================================================================
    /// Dataset code not in the registry
    UnsupportedDataset,

    /// Page segment is not a non-negative integer
    InvalidPage,

    /// Date segment is not a valid YYYYMMDD calendar date
    InvalidDate,

    /// Search or lookup query is unusable
    InvalidQuery,

    /// No route matches the request path
    NotFound,

    // ========================================================================
    // Dataset Errors (503)
    // ========================================================================
    /// Dataset database unreachable or not configured
    DatasetUnavailable,

    /// Query reached the database but failed
    QueryFailed,

    /// Query exceeded the configured timeout
    QueryTimeout,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::UnsupportedDataset
            | ErrorCode::InvalidPage
            | ErrorCode::InvalidDate
            | ErrorCode::InvalidQuery => StatusCode::BAD_REQUEST,

            ErrorCode::NotFound => StatusCode::NOT_FOUND,

            ErrorCode::DatasetUnavailable
            | ErrorCode::QueryFailed
            | ErrorCode::QueryTimeout => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedDataset => "unsupported TLD",
            ErrorCode::InvalidPage => "invalid page number",
            ErrorCode::InvalidDate => "invalid date",
            ErrorCode::InvalidQuery => "invalid query",
            ErrorCode::NotFound => "not found",
            ErrorCode::DatasetUnavailable => "database connection failed",
            ErrorCode::QueryFailed => "query failed",
            ErrorCode::QueryTimeout => "query timed out",
            ErrorCode::InternalError => "internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,
    /// Client-facing message, rendered as the `error` field
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn not_found() -> Self {
        Self::from_code(ErrorCode::NotFound)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            error_payload(&self.message),
        )
            .into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::UnsupportedDataset { .. } => ErrorCode::UnsupportedDataset,
            ValidationError::InvalidPage { .. } => ErrorCode::InvalidPage,
            ValidationError::InvalidDate { .. } => ErrorCode::InvalidDate,
            ValidationError::InvalidQuery { .. } => ErrorCode::InvalidQuery,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        // Full error stays in the logs; the client only sees the category
        tracing::error!(dataset = %err.dataset(), error = %err, "dataset query failed");
        let code = match &err {
            QueryError::Connection { .. } | QueryError::DatasetNotConfigured { .. } => {
                ErrorCode::DatasetUnavailable
            }
            QueryError::Timeout { .. } => ErrorCode::QueryTimeout,
            QueryError::Execution { .. } | QueryError::MalformedDate { .. } => {
                ErrorCode::QueryFailed
            }
        };
        ApiError::new(code, err.public_reason())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal_error(err.to_string())
    }
}

impl From<AxfrError> for ApiError {
    fn from(err: AxfrError) -> Self {
        match err {
            AxfrError::Validation(e) => e.into(),
            AxfrError::Query(e) => e.into(),
            AxfrError::Config(e) => e.into(),
            AxfrError::Serialization(reason) => {
                tracing::error!(error = %reason, "payload serialization failed");
                ApiError::from_code(ErrorCode::InternalError)
            }
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
