//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading or converting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (unknown dialect, column kind, level).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

impl From<dbsink_sql::SqlError> for SettingsError {
    fn from(err: dbsink_sql::SqlError) -> Self {
        Self::InvalidValue(err.to_string())
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
