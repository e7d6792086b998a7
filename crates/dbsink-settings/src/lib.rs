//! # dbsink-settings
//!
//! Layered configuration for the database sink.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** ([`SinkSettings::default()`])
//! 2. **Settings file**, deep-merged over the defaults
//! 3. **Environment variables**, `DBSINK_*` overrides (highest priority)
//!
//! [`SinkSettings::to_sink_options`] turns the result into the programmatic
//! options the sinks take.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings_from_env, load_settings_from_path};
pub use types::{
    AdditionalColumn, ColumnSettings, LevelSettings, LogEventSettings, NamedColumn,
    PropertiesSettings, SinkSettings, TimeStampSettings,
};
