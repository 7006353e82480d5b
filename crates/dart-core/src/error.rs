//! Error types for DART data operations.
//!
//! This module defines [`DartError`] which covers all error cases that can occur
//! when fetching, preprocessing, or storing DART financial data.

use thiserror::Error;

/// Errors that can occur during DART data operations.
#[derive(Error, Debug)]
pub enum DartError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// The DART request quota was exceeded (status `020`).
    #[error("Rate limited by DART: retry after {retry_after:?}")]
    RateLimited {
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// DART answered with a non-success status code.
    #[error("DART API error {status}: {message}")]
    Api {
        /// The DART status code (e.g. `"100"`).
        status: String,
        /// The message DART returned alongside the status.
        message: String,
    },

    /// The company directory has no identity for the given company id.
    #[error("Company not found: {0}")]
    CompanyNotFound(i64),

    /// A statement slice could not be assembled.
    #[error("Slice {business_year}/{fs_division} failed: {reason}")]
    Slice {
        /// Business year of the failed slice, as delivered.
        business_year: String,
        /// DART code of the fiscal statement kind (`CFS`/`OFS`).
        fs_division: String,
        /// Why the slice failed.
        reason: String,
    },

    /// Error parsing data from DART or from an input table.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with a store.
    #[error("Store error: {0}")]
    Store(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The API key was rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`DartError`].
pub type Result<T> = std::result::Result<T, DartError>;
