//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`SinkSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `DBSINK_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use dbsink_sql::Dialect;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::SinkSettings;

/// Load settings from `path` with environment overrides.
///
/// A missing file yields the defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<SinkSettings> {
    let defaults = serde_json::to_value(SinkSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: SinkSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults plus environment overrides, without a file.
pub fn load_settings_from_env() -> SinkSettings {
    let mut settings = SinkSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `DBSINK_*` environment variables.
pub fn apply_env_overrides(settings: &mut SinkSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Invalid values are logged and ignored, keeping the file/default value.
pub fn apply_overrides(settings: &mut SinkSettings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = string("DBSINK_TABLE") {
        settings.table_name = v;
    }
    if let Some(v) = string("DBSINK_SCHEMA") {
        settings.schema_name = v;
    }
    if let Some(v) = string("DBSINK_DIALECT") {
        if v.parse::<Dialect>().is_ok() {
            settings.dialect = v;
        } else {
            warn!(key = "DBSINK_DIALECT", value = %v, "unknown dialect env var, ignoring");
        }
    }
    if let Some(v) = string("DBSINK_AUTO_CREATE") {
        match parse_bool(&v) {
            Some(b) => settings.auto_create_table = b,
            None => warn!(key = "DBSINK_AUTO_CREATE", value = %v, "invalid boolean env var, ignoring"),
        }
    }
    if let Some(v) = string("DBSINK_BATCH_LIMIT") {
        match parse_usize_range(&v, 1, 10_000) {
            Some(n) => settings.batch_posting_limit = n,
            None => warn!(key = "DBSINK_BATCH_LIMIT", value = %v, "invalid usize env var, ignoring"),
        }
    }
    if let Some(v) = string("DBSINK_PERIOD_MS") {
        match parse_u64_range(&v, 10, 3_600_000) {
            Some(n) => settings.period_ms = n,
            None => warn!(key = "DBSINK_PERIOD_MS", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = string("DBSINK_DATABASE") {
        settings.database = Some(v);
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
