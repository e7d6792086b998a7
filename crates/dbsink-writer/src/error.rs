//! Sink error types.

use dbsink_sql::SqlError;
use thiserror::Error;

/// Failures reported by a database driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// `SQLite` error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// Any other driver failure.
    #[error("driver error: {0}")]
    Other(String),
}

/// Errors surfaced by the sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// CREATE TABLE could not be executed.
    #[error("failed to provision table: {source}")]
    Provisioning {
        /// Underlying driver failure.
        source: DriverError,
    },
    /// An INSERT could not be executed.
    #[error("failed to write event: {source}")]
    Write {
        /// Underlying driver failure.
        source: DriverError,
    },
    /// The audit sink was configured with an option it cannot honour.
    #[error("audit sink does not support option: {0}")]
    UnsupportedAuditOption(String),
    /// Schema or SQL synthesis failure.
    #[error(transparent)]
    Sql(#[from] SqlError),
    /// Driver failure outside provisioning or writing.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
