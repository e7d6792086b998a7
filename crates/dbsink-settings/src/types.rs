//! Settings file shape and conversion into sink options.
//!
//! Every struct is `#[serde(default)]`, so a file only needs the keys it
//! changes.

use std::path::PathBuf;
use std::time::Duration;

use dbsink_core::LogLevel;
use dbsink_sql::{ColumnDefinition, DataKind, Dialect, SinkOptions, StandardColumn};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SinkSettings {
    /// Target table.
    pub table_name: String,
    /// Target schema (ignored by dialects without schemas).
    pub schema_name: String,
    /// Dialect name, e.g. `sqlServer`, `mySql`, `oracle`, `sqlite`.
    pub dialect: String,
    /// Run CREATE TABLE at sink construction.
    pub auto_create_table: bool,
    /// Rejected by the audit sink.
    pub disable_triggers: bool,
    /// Events per batch.
    pub batch_posting_limit: usize,
    /// Periodic flush interval in milliseconds.
    pub period_ms: u64,
    /// Lowest level captured by the tracing layer.
    pub minimum_level: String,
    /// SQLite database file used by the CLI demo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Column layout.
    pub columns: ColumnSettings,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            table_name: "Logs".to_string(),
            schema_name: "dbo".to_string(),
            dialect: "sqlServer".to_string(),
            auto_create_table: true,
            disable_triggers: false,
            batch_posting_limit: 50,
            period_ms: 5000,
            minimum_level: "verbose".to_string(),
            database: None,
            columns: ColumnSettings::default(),
        }
    }
}

/// Column layout settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnSettings {
    /// Standard columns to store, in table order.
    pub store: Vec<String>,
    /// `Id` column.
    pub id: NamedColumn,
    /// `Message` column.
    pub message: NamedColumn,
    /// `MessageTemplate` column.
    pub message_template: NamedColumn,
    /// `Exception` column.
    pub exception: NamedColumn,
    /// `Level` column.
    pub level: LevelSettings,
    /// `TimeStamp` column.
    pub time_stamp: TimeStampSettings,
    /// `Properties` column.
    pub properties: PropertiesSettings,
    /// `LogEvent` column.
    pub log_event: LogEventSettings,
    /// Columns filled from same-named event properties.
    pub additional_columns: Vec<AdditionalColumn>,
    /// Column to use as primary key instead of `Id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Create a clustered columnstore index (SQL Server).
    pub clustered_columnstore_index: bool,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            store: StandardColumn::DEFAULT_STORE
                .iter()
                .map(ToString::to_string)
                .collect(),
            id: NamedColumn::new(StandardColumn::Id),
            message: NamedColumn::new(StandardColumn::Message),
            message_template: NamedColumn::new(StandardColumn::MessageTemplate),
            exception: NamedColumn::new(StandardColumn::Exception),
            level: LevelSettings::default(),
            time_stamp: TimeStampSettings::default(),
            properties: PropertiesSettings::default(),
            log_event: LogEventSettings::default(),
            additional_columns: Vec::new(),
            primary_key: None,
            clustered_columnstore_index: false,
        }
    }
}

impl ColumnSettings {
    /// Name and index flag configured for a standard column.
    fn standard(&self, role: StandardColumn) -> (&str, bool) {
        match role {
            StandardColumn::Id => (&self.id.name, self.id.non_clustered_index),
            StandardColumn::Message => (&self.message.name, self.message.non_clustered_index),
            StandardColumn::MessageTemplate => (
                &self.message_template.name,
                self.message_template.non_clustered_index,
            ),
            StandardColumn::Exception => (&self.exception.name, self.exception.non_clustered_index),
            StandardColumn::Level => (&self.level.name, self.level.non_clustered_index),
            StandardColumn::TimeStamp => (&self.time_stamp.name, self.time_stamp.non_clustered_index),
            StandardColumn::Properties => (&self.properties.name, self.properties.non_clustered_index),
            StandardColumn::LogEvent => (&self.log_event.name, self.log_event.non_clustered_index),
        }
    }
}

/// A standard column with no options beyond its name and index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedColumn {
    /// Column name.
    pub name: String,
    /// Create a non-clustered index.
    #[serde(default)]
    pub non_clustered_index: bool,
}

impl NamedColumn {
    fn new(role: StandardColumn) -> Self {
        Self {
            name: role.name().to_string(),
            non_clustered_index: false,
        }
    }
}

/// `Level` column settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelSettings {
    /// Column name.
    pub name: String,
    /// Store the numeric ordinal instead of the name.
    pub store_as_enum: bool,
    /// Create a non-clustered index.
    pub non_clustered_index: bool,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            name: StandardColumn::Level.name().to_string(),
            store_as_enum: false,
            non_clustered_index: false,
        }
    }
}

/// `TimeStamp` column settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeStampSettings {
    /// Column name.
    pub name: String,
    /// Store UTC instead of the event's local time.
    pub convert_to_utc: bool,
    /// Create a non-clustered index.
    pub non_clustered_index: bool,
}

impl Default for TimeStampSettings {
    fn default() -> Self {
        Self {
            name: StandardColumn::TimeStamp.name().to_string(),
            convert_to_utc: false,
            non_clustered_index: false,
        }
    }
}

/// `Properties` column settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertiesSettings {
    /// Column name.
    pub name: String,
    /// Root element.
    pub root_element_name: String,
    /// Element per property.
    pub property_element_name: String,
    /// Sequence element.
    pub sequence_element_name: String,
    /// Sequence and dictionary item element.
    pub item_element_name: String,
    /// Structure element.
    pub structure_element_name: String,
    /// Dictionary element.
    pub dictionary_element_name: String,
    /// Name each element after its property key.
    pub use_property_key_as_element_name: bool,
    /// Skip empty values.
    pub omit_element_if_empty: bool,
    /// Leave out properties that have their own column.
    pub exclude_additional_properties: bool,
    /// Create a non-clustered index.
    pub non_clustered_index: bool,
}

impl Default for PropertiesSettings {
    fn default() -> Self {
        Self {
            name: StandardColumn::Properties.name().to_string(),
            root_element_name: "properties".to_string(),
            property_element_name: "property".to_string(),
            sequence_element_name: "sequence".to_string(),
            item_element_name: "item".to_string(),
            structure_element_name: "structure".to_string(),
            dictionary_element_name: "dictionary".to_string(),
            use_property_key_as_element_name: false,
            omit_element_if_empty: true,
            exclude_additional_properties: false,
            non_clustered_index: false,
        }
    }
}

/// `LogEvent` column settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEventSettings {
    /// Column name.
    pub name: String,
    /// Leave out properties that have their own column.
    pub exclude_additional_properties: bool,
    /// Create a non-clustered index.
    pub non_clustered_index: bool,
}

impl Default for LogEventSettings {
    fn default() -> Self {
        Self {
            name: StandardColumn::LogEvent.name().to_string(),
            exclude_additional_properties: false,
            non_clustered_index: false,
        }
    }
}

/// One additional column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalColumn {
    /// Column name, matched case-insensitively against property names.
    pub name: String,
    /// Data kind (`int`, `bigint`, `nvarchar`, `datetime`, `bit`, ...).
    pub data_type: String,
    /// Accept NULL.
    pub allow_null: bool,
    /// Text length; `-1` for unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_length: Option<i32>,
    /// Mark as the primary key.
    pub primary_key: bool,
    /// Create a non-clustered index.
    pub non_clustered_index: bool,
}

impl Default for AdditionalColumn {
    fn default() -> Self {
        Self {
            name: String::new(),
            data_type: "nvarchar".to_string(),
            allow_null: true,
            data_length: None,
            primary_key: false,
            non_clustered_index: false,
        }
    }
}

impl AdditionalColumn {
    fn to_definition(&self) -> Result<ColumnDefinition> {
        let kind: DataKind = self.data_type.parse()?;
        let mut def = ColumnDefinition::new(self.name.clone(), kind).nullable(self.allow_null);
        if let Some(length) = self.data_length {
            def = def.with_length(length);
        }
        if self.primary_key {
            def = def.primary_key();
        }
        if self.non_clustered_index {
            def = def.indexed();
        }
        Ok(def)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

impl SinkSettings {
    /// Parsed dialect.
    pub fn dialect(&self) -> Result<Dialect> {
        Ok(self.dialect.parse()?)
    }

    /// Parsed minimum level.
    pub fn minimum_level(&self) -> Result<LogLevel> {
        parse_level(&self.minimum_level)
            .ok_or_else(|| SettingsError::InvalidValue(format!("unknown level '{}'", self.minimum_level)))
    }

    /// Periodic flush interval.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Database path, if configured.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.as_deref().map(PathBuf::from)
    }

    /// Build programmatic sink options.
    ///
    /// Column names and kinds are resolved here; cross-column checks
    /// (duplicates, primary keys) happen when the schema is built.
    pub fn to_sink_options(&self) -> Result<SinkOptions> {
        let cols = &self.columns;
        let mut options = SinkOptions::new(self.table_name.clone());
        options.schema_name.clone_from(&self.schema_name);
        options.auto_create_table = self.auto_create_table;
        options.disable_triggers = self.disable_triggers;

        let c = &mut options.columns;
        c.store = cols
            .store
            .iter()
            .map(|s| s.parse::<StandardColumn>())
            .collect::<std::result::Result<_, _>>()?;
        for role in StandardColumn::ALL {
            let (name, indexed) = cols.standard(role);
            let def = c.standard_mut(role);
            name.clone_into(&mut def.name);
            def.non_clustered_index = indexed;
        }

        c.level.store_as_enum = cols.level.store_as_enum;
        c.time_stamp.convert_to_utc = cols.time_stamp.convert_to_utc;

        let p = &cols.properties;
        c.properties.root_element_name.clone_from(&p.root_element_name);
        c.properties.property_element_name.clone_from(&p.property_element_name);
        c.properties.sequence_element_name.clone_from(&p.sequence_element_name);
        c.properties.item_element_name.clone_from(&p.item_element_name);
        c.properties.structure_element_name.clone_from(&p.structure_element_name);
        c.properties.dictionary_element_name.clone_from(&p.dictionary_element_name);
        c.properties.use_property_key_as_element_name = p.use_property_key_as_element_name;
        c.properties.omit_element_if_empty = p.omit_element_if_empty;
        c.properties.exclude_additional_properties = p.exclude_additional_properties;
        c.log_event.exclude_additional_properties = cols.log_event.exclude_additional_properties;

        c.additional_columns = cols
            .additional_columns
            .iter()
            .map(AdditionalColumn::to_definition)
            .collect::<Result<_>>()?;
        c.primary_key.clone_from(&cols.primary_key);
        c.clustered_columnstore_index = cols.clustered_columnstore_index;
        Ok(options)
    }
}

/// Case-insensitive level name; also accepts `info` and `warn`.
pub(crate) fn parse_level(s: &str) -> Option<LogLevel> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "info" => return Some(LogLevel::Information),
        "warn" => return Some(LogLevel::Warning),
        _ => {}
    }
    LogLevel::ALL
        .into_iter()
        .find(|level| level.name().eq_ignore_ascii_case(s))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use dbsink_sql::Schema;

    #[test]
    fn defaults() {
        let s = SinkSettings::default();
        assert_eq!(s.table_name, "Logs");
        assert_eq!(s.schema_name, "dbo");
        assert_eq!(s.dialect().unwrap(), Dialect::SqlServer);
        assert!(s.auto_create_table);
        assert_eq!(s.batch_posting_limit, 50);
        assert_eq!(s.period(), Duration::from_secs(5));
        assert_eq!(s.minimum_level().unwrap(), LogLevel::Verbose);
        assert!(s.database_path().is_none());
    }

    #[test]
    fn default_settings_match_default_options() {
        let options = SinkSettings::default().to_sink_options().unwrap();
        let expected = SinkOptions::default();
        assert_eq!(options.table_name, expected.table_name);
        assert_eq!(options.columns.store, expected.columns.store);
        assert_eq!(options.columns.level.column, expected.columns.level.column);
        assert_eq!(options.columns.properties.column, expected.columns.properties.column);
    }

    #[test]
    fn camel_case_keys() {
        let json = serde_json::to_value(SinkSettings::default()).unwrap();
        assert!(json.get("tableName").is_some());
        assert!(json.get("batchPostingLimit").is_some());
        assert!(json["columns"]["timeStamp"].get("convertToUtc").is_some());
        assert!(json.get("database").is_none());
    }

    #[test]
    fn additional_columns_convert() {
        let settings: SinkSettings = serde_json::from_value(serde_json::json!({
            "columns": {
                "store": ["Message", "Level"],
                "level": {"storeAsEnum": true},
                "additionalColumns": [
                    {"name": "Age", "dataType": "int"},
                    {"name": "Code", "dataType": "nchar", "dataLength": 8, "allowNull": false, "nonClusteredIndex": true}
                ]
            }
        }))
        .unwrap();
        let options = settings.to_sink_options().unwrap();
        let cols = &options.columns.additional_columns;
        assert_eq!(cols[0].kind, DataKind::Int32);
        assert!(cols[0].allow_null);
        assert_eq!(cols[1].kind, DataKind::FixedText);
        assert_eq!(cols[1].max_length, Some(8));
        assert!(cols[1].non_clustered_index);
        assert!(!cols[1].allow_null);

        let schema = Schema::build(&options).unwrap();
        assert_eq!(schema.insert_width(), 4);
    }

    #[test]
    fn renamed_standard_column() {
        let mut settings = SinkSettings::default();
        settings.columns.message.name = "Text".into();
        let options = settings.to_sink_options().unwrap();
        assert_eq!(options.columns.message.name, "Text");
    }

    #[test]
    fn standard_column_indexes() {
        let settings: SinkSettings = serde_json::from_value(serde_json::json!({
            "columns": {
                "message": {"name": "Text", "nonClusteredIndex": true},
                "exception": {"name": "Error"},
                "level": {"nonClusteredIndex": true},
                "timeStamp": {"name": "At", "nonClusteredIndex": true}
            }
        }))
        .unwrap();
        let options = settings.to_sink_options().unwrap();
        let c = &options.columns;
        assert_eq!(c.message.name, "Text");
        assert!(c.message.non_clustered_index);
        assert_eq!(c.exception.name, "Error");
        assert!(!c.exception.non_clustered_index);
        assert!(c.level.column.non_clustered_index);
        assert_eq!(c.time_stamp.column.name, "At");
        assert!(c.time_stamp.column.non_clustered_index);
        assert!(!c.properties.column.non_clustered_index);

        let schema = Schema::build(&options).unwrap();
        let indexed: Vec<_> = schema
            .columns()
            .iter()
            .filter(|col| col.non_clustered_index)
            .map(|col| col.name.as_str())
            .collect();
        assert_eq!(indexed, vec!["Text", "Level", "At"]);
    }

    // ── invalid values ──

    #[test]
    fn unknown_values_rejected() {
        let mut settings = SinkSettings::default();
        settings.dialect = "postgres".into();
        assert_matches!(settings.dialect(), Err(SettingsError::InvalidValue(_)));

        settings.minimum_level = "loud".into();
        assert_matches!(settings.minimum_level(), Err(SettingsError::InvalidValue(_)));

        settings.columns.store = vec!["Nope".into()];
        assert_matches!(settings.to_sink_options(), Err(SettingsError::InvalidValue(_)));

        let mut settings = SinkSettings::default();
        settings.columns.additional_columns = vec![AdditionalColumn {
            name: "X".into(),
            data_type: "blob".into(),
            ..AdditionalColumn::default()
        }];
        assert_matches!(settings.to_sink_options(), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("INFO"), Some(LogLevel::Information));
        assert_eq!(parse_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_level(" Fatal "), Some(LogLevel::Fatal));
        assert_eq!(parse_level(""), None);
    }
}
