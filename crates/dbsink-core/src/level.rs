//! Event severity levels.

use serde::{Deserialize, Serialize};

/// Severity of a [`LogEvent`](crate::LogEvent).
///
/// The ordinal (see [`LogLevel::as_num`]) is what a sink stores when a level
/// column is configured to hold the symbolic value instead of its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Tracing-grade detail.
    Verbose = 0,
    /// Internal diagnostics.
    Debug = 1,
    /// Normal operation.
    Information = 2,
    /// Degraded but functioning.
    Warning = 3,
    /// A failed operation.
    Error = 4,
    /// The process cannot continue.
    Fatal = 5,
}

impl LogLevel {
    /// All levels, least severe first.
    pub const ALL: [Self; 6] = [
        Self::Verbose,
        Self::Debug,
        Self::Information,
        Self::Warning,
        Self::Error,
        Self::Fatal,
    ];

    /// Numeric ordinal (0 = verbose, 5 = fatal).
    #[must_use]
    pub const fn as_num(self) -> i32 {
        self as i32
    }

    /// Textual name as stored in a text level column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Verbose => "Verbose",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }

    /// Convert from a `tracing` level.
    #[must_use]
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Self::Verbose,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Information,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::ERROR => Self::Error,
        }
    }

    /// Parse a level name (case-insensitive), defaulting to `Information`.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "verbose" | "trace" => Self::Verbose,
            "debug" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            "fatal" | "critical" => Self::Fatal,
            _ => Self::Information,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
