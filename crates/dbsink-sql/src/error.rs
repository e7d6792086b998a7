//! SQL synthesis error types.

use thiserror::Error;

use crate::schema::DataKind;

/// Errors raised while building a schema or rendering SQL.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The sink options describe an invalid table layout.
    #[error("invalid sink configuration: {0}")]
    Configuration(String),
    /// The dialect has no CREATE TABLE support.
    #[error("dialect {dialect} does not support table creation")]
    UnsupportedDialect {
        /// Dialect name.
        dialect: String,
    },
    /// The dialect cannot express a column's (kind, length) combination.
    #[error("column {column} has type {kind:?} which dialect {dialect} cannot express")]
    UnsupportedColumnType {
        /// Column name.
        column: String,
        /// Dialect name.
        dialect: String,
        /// The offending data kind.
        kind: DataKind,
    },
}

/// Result type for SQL synthesis.
pub type Result<T> = std::result::Result<T, SqlError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
