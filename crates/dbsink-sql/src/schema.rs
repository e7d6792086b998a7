//! Dialect-independent table layout.
//!
//! [`SinkOptions`] is the mutable, programmatic configuration surface.
//! [`Schema::build`] validates it once into an immutable [`Schema`] that the
//! extractor and every statement builder share read-only.
//!
//! Column order is fixed at build time: the stored standard columns in the
//! order they appear in [`ColumnOptions::store`], then the additional columns
//! in declaration order. DDL, INSERT, and extracted rows all follow it.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dbsink_core::{fold_name, names_equal};

use crate::error::{Result, SqlError};

// ─────────────────────────────────────────────────────────────────────────────
// Column vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// Role a built-in column plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StandardColumn {
    /// Auto-generated row identifier. Never supplied on insert.
    Id,
    /// Rendered message.
    Message,
    /// Raw template text.
    MessageTemplate,
    /// Severity, as text or as an enumeration ordinal.
    Level,
    /// Event time.
    TimeStamp,
    /// Exception description.
    Exception,
    /// XML rendering of the property bag.
    Properties,
    /// JSON rendering of the whole event.
    LogEvent,
}

impl StandardColumn {
    /// Every role, in canonical order.
    pub const ALL: [Self; 8] = [
        Self::Id,
        Self::Message,
        Self::MessageTemplate,
        Self::Level,
        Self::TimeStamp,
        Self::Exception,
        Self::Properties,
        Self::LogEvent,
    ];

    /// Roles stored when the caller does not choose.
    pub const DEFAULT_STORE: [Self; 7] = [
        Self::Id,
        Self::Message,
        Self::MessageTemplate,
        Self::Level,
        Self::TimeStamp,
        Self::Exception,
        Self::Properties,
    ];

    /// Role name, which is also the default column name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Message => "Message",
            Self::MessageTemplate => "MessageTemplate",
            Self::Level => "Level",
            Self::TimeStamp => "TimeStamp",
            Self::Exception => "Exception",
            Self::Properties => "Properties",
            Self::LogEvent => "LogEvent",
        }
    }
}

impl fmt::Display for StandardColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StandardColumn {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SqlError::Configuration(format!("unknown standard column '{s}'")))
    }
}

/// Logical column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Variable-length text.
    Text,
    /// Fixed-length text. Requires a positive length.
    FixedText,
    /// Date and time without offset.
    DateTime,
    /// Boolean.
    Boolean,
    /// Double precision floating point.
    Float,
}

impl DataKind {
    /// Whether values of this kind are integers.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Whether values of this kind are text.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::FixedText)
    }
}

impl FromStr for DataKind {
    type Err = SqlError;

    /// Accepts the kind names plus the common SQL spellings
    /// (`int`, `bigint`, `nvarchar`, `nchar`, `datetime`, `bit`, `float`, ...).
    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "int32" | "int" | "integer" => Self::Int32,
            "int64" | "bigint" | "long" => Self::Int64,
            "text" | "string" | "varchar" | "nvarchar" | "ntext" => Self::Text,
            "fixedtext" | "char" | "nchar" => Self::FixedText,
            "datetime" | "datetime2" | "timestamp" => Self::DateTime,
            "boolean" | "bool" | "bit" => Self::Boolean,
            "float" | "double" | "real" => Self::Float,
            _ => return Err(SqlError::Configuration(format!("unknown data type '{s}'"))),
        };
        Ok(kind)
    }
}

/// One table column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name. Unique across the table, ignoring case.
    pub name: String,
    /// Logical type.
    pub kind: DataKind,
    /// Maximum length for text kinds; `-1` means unbounded.
    pub max_length: Option<i32>,
    /// Whether NULL is accepted. Forced off for the primary key.
    pub allow_null: bool,
    /// Whether this column is the primary key.
    pub primary_key: bool,
    /// Whether a non-clustered index is created on this column.
    pub non_clustered_index: bool,
    /// Standard role, set by [`Schema::build`] for built-in columns.
    pub role: Option<StandardColumn>,
}

impl ColumnDefinition {
    /// A nullable, unindexed column.
    pub fn new(name: impl Into<String>, kind: DataKind) -> Self {
        Self {
            name: name.into(),
            kind,
            max_length: None,
            allow_null: true,
            primary_key: false,
            non_clustered_index: false,
            role: None,
        }
    }

    /// Set the maximum length (`-1` for unbounded).
    #[must_use]
    pub fn with_length(mut self, length: i32) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Set nullability.
    #[must_use]
    pub fn nullable(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// Mark as primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_null = false;
        self
    }

    /// Request a non-clustered index.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.non_clustered_index = true;
        self
    }

    fn standard(role: StandardColumn) -> Self {
        let def = Self::new(role.name(), DataKind::Text);
        let def = match role {
            StandardColumn::Id => Self {
                kind: DataKind::Int64,
                allow_null: false,
                ..def
            },
            StandardColumn::TimeStamp => Self {
                kind: DataKind::DateTime,
                allow_null: false,
                ..def
            },
            StandardColumn::Level => def.with_length(128),
            _ => def.with_length(-1),
        };
        Self {
            role: Some(role),
            ..def
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-standard-column options
// ─────────────────────────────────────────────────────────────────────────────

/// Boxed error returned by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// User predicate deciding which properties reach the `Properties` column.
#[derive(Clone)]
pub struct PropertyFilter(Arc<dyn Fn(&str) -> std::result::Result<bool, BoxError> + Send + Sync>);

impl PropertyFilter {
    /// Wrap a fallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Wrap an infallible predicate.
    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |key| Ok(predicate(key))))
    }

    /// Evaluate for one property key.
    pub fn check(&self, key: &str) -> std::result::Result<bool, BoxError> {
        (self.0)(key)
    }
}

impl fmt::Debug for PropertyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PropertyFilter(..)")
    }
}

/// Options for the `Level` column.
#[derive(Clone, Debug)]
pub struct LevelColumnOptions {
    /// Column shape.
    pub column: ColumnDefinition,
    /// Store the level ordinal instead of its name.
    pub store_as_enum: bool,
}

/// Options for the `TimeStamp` column.
#[derive(Clone, Debug)]
pub struct TimeStampColumnOptions {
    /// Column shape.
    pub column: ColumnDefinition,
    /// Convert to UTC before storing; otherwise the event's wall clock is kept.
    pub convert_to_utc: bool,
}

/// Options for the `Properties` column and its XML rendering.
#[derive(Clone, Debug)]
pub struct PropertiesColumnOptions {
    /// Column shape.
    pub column: ColumnDefinition,
    /// Root element name.
    pub root_element_name: String,
    /// Element wrapping each top-level property (keyed by attribute).
    pub property_element_name: String,
    /// Element wrapping sequences.
    pub sequence_element_name: String,
    /// Element wrapping sequence items and dictionary entries.
    pub item_element_name: String,
    /// Element wrapping structures.
    pub structure_element_name: String,
    /// Element wrapping dictionaries.
    pub dictionary_element_name: String,
    /// Use the sanitized property key as the element name.
    pub use_property_key_as_element_name: bool,
    /// Skip properties whose rendered value is empty.
    pub omit_element_if_empty: bool,
    /// Leave out properties that already map to an additional column.
    pub exclude_additional_properties: bool,
    /// Optional user predicate.
    pub filter: Option<PropertyFilter>,
}

/// Options for the `LogEvent` column.
#[derive(Clone, Debug)]
pub struct LogEventColumnOptions {
    /// Column shape.
    pub column: ColumnDefinition,
    /// Leave out properties that already map to an additional column.
    pub exclude_additional_properties: bool,
}

/// Column configuration for one sink.
#[derive(Clone, Debug)]
pub struct ColumnOptions {
    /// Standard roles to store, in column order.
    pub store: Vec<StandardColumn>,
    /// `Id` column shape.
    pub id: ColumnDefinition,
    /// `Message` column shape.
    pub message: ColumnDefinition,
    /// `MessageTemplate` column shape.
    pub message_template: ColumnDefinition,
    /// `Level` column options.
    pub level: LevelColumnOptions,
    /// `TimeStamp` column options.
    pub time_stamp: TimeStampColumnOptions,
    /// `Exception` column shape.
    pub exception: ColumnDefinition,
    /// `Properties` column options.
    pub properties: PropertiesColumnOptions,
    /// `LogEvent` column options.
    pub log_event: LogEventColumnOptions,
    /// Property-backed columns, after the standard ones.
    pub additional_columns: Vec<ColumnDefinition>,
    /// Name of the column to use as primary key.
    pub primary_key: Option<String>,
    /// Add a clustered columnstore index (SQL Server).
    pub clustered_columnstore_index: bool,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            store: StandardColumn::DEFAULT_STORE.to_vec(),
            id: ColumnDefinition::standard(StandardColumn::Id),
            message: ColumnDefinition::standard(StandardColumn::Message),
            message_template: ColumnDefinition::standard(StandardColumn::MessageTemplate),
            level: LevelColumnOptions {
                column: ColumnDefinition::standard(StandardColumn::Level),
                store_as_enum: false,
            },
            time_stamp: TimeStampColumnOptions {
                column: ColumnDefinition::standard(StandardColumn::TimeStamp),
                convert_to_utc: false,
            },
            exception: ColumnDefinition::standard(StandardColumn::Exception),
            properties: PropertiesColumnOptions {
                column: ColumnDefinition::standard(StandardColumn::Properties),
                root_element_name: "properties".into(),
                property_element_name: "property".into(),
                sequence_element_name: "sequence".into(),
                item_element_name: "item".into(),
                structure_element_name: "structure".into(),
                dictionary_element_name: "dictionary".into(),
                use_property_key_as_element_name: false,
                omit_element_if_empty: true,
                exclude_additional_properties: false,
                filter: None,
            },
            log_event: LogEventColumnOptions {
                column: ColumnDefinition::standard(StandardColumn::LogEvent),
                exclude_additional_properties: false,
            },
            additional_columns: Vec::new(),
            primary_key: None,
            clustered_columnstore_index: false,
        }
    }
}

impl ColumnOptions {
    /// The configured shape of a standard column.
    pub fn standard(&self, role: StandardColumn) -> &ColumnDefinition {
        match role {
            StandardColumn::Id => &self.id,
            StandardColumn::Message => &self.message,
            StandardColumn::MessageTemplate => &self.message_template,
            StandardColumn::Level => &self.level.column,
            StandardColumn::TimeStamp => &self.time_stamp.column,
            StandardColumn::Exception => &self.exception,
            StandardColumn::Properties => &self.properties.column,
            StandardColumn::LogEvent => &self.log_event.column,
        }
    }

    /// Mutable access to a standard column's shape.
    pub fn standard_mut(&mut self, role: StandardColumn) -> &mut ColumnDefinition {
        match role {
            StandardColumn::Id => &mut self.id,
            StandardColumn::Message => &mut self.message,
            StandardColumn::MessageTemplate => &mut self.message_template,
            StandardColumn::Level => &mut self.level.column,
            StandardColumn::TimeStamp => &mut self.time_stamp.column,
            StandardColumn::Exception => &mut self.exception,
            StandardColumn::Properties => &mut self.properties.column,
            StandardColumn::LogEvent => &mut self.log_event.column,
        }
    }

    /// Store an extra standard role (appended if absent).
    pub fn add_store(&mut self, role: StandardColumn) {
        if !self.store.contains(&role) {
            self.store.push(role);
        }
    }

    /// Stop storing a standard role.
    pub fn remove_store(&mut self, role: StandardColumn) {
        self.store.retain(|r| *r != role);
    }
}

/// Programmatic sink configuration.
#[derive(Clone, Debug)]
pub struct SinkOptions {
    /// Target table.
    pub table_name: String,
    /// Target schema / namespace.
    pub schema_name: String,
    /// Run CREATE TABLE at sink construction.
    pub auto_create_table: bool,
    /// Disable triggers while writing (unsupported by the audit sink).
    pub disable_triggers: bool,
    /// Column layout.
    pub columns: ColumnOptions,
}

impl SinkOptions {
    /// Defaults for the given table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            table_name: "Logs".into(),
            schema_name: "dbo".into(),
            auto_create_table: true,
            disable_triggers: false,
            columns: ColumnOptions::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────────────────────────────────────

/// Validated, immutable table layout.
#[derive(Clone, Debug)]
pub struct Schema {
    table_name: String,
    schema_name: String,
    columns: Vec<ColumnDefinition>,
    primary_key: Option<usize>,
    identity: Option<ColumnDefinition>,
    clustered_columnstore_index: bool,
    disable_triggers: bool,
    additional_names: HashSet<String>,
    level: LevelColumnOptions,
    time_stamp: TimeStampColumnOptions,
    properties: PropertiesColumnOptions,
    log_event: LogEventColumnOptions,
}

impl Schema {
    /// Validate options into a schema.
    ///
    /// Fails on an empty table name, a standard role listed twice, column
    /// names colliding case-insensitively, more than one primary key, a
    /// designated primary key naming no column, or a non-integer `Id`.
    pub fn build(options: &SinkOptions) -> Result<Self> {
        if options.table_name.trim().is_empty() {
            return Err(SqlError::Configuration("table name is empty".into()));
        }
        let opts = &options.columns;

        let mut columns = Vec::with_capacity(opts.store.len() + opts.additional_columns.len());
        let mut seen_roles = HashSet::new();
        for &role in &opts.store {
            if !seen_roles.insert(role) {
                return Err(SqlError::Configuration(format!(
                    "standard column {role} is listed more than once"
                )));
            }
            let mut def = opts.standard(role).clone();
            def.role = Some(role);
            match role {
                StandardColumn::Id if !def.kind.is_integer() => {
                    return Err(SqlError::Configuration(format!(
                        "Id column '{}' must be an integer type, got {:?}",
                        def.name, def.kind
                    )));
                }
                StandardColumn::Level if opts.level.store_as_enum && !def.kind.is_integer() => {
                    def.kind = DataKind::Int32;
                    def.max_length = None;
                }
                _ => {}
            }
            columns.push(def);
        }
        columns.extend(opts.additional_columns.iter().map(|c| ColumnDefinition {
            role: None,
            ..c.clone()
        }));

        let mut seen_names = HashSet::new();
        for column in &columns {
            if column.name.trim().is_empty() {
                return Err(SqlError::Configuration("column name is empty".into()));
            }
            if !seen_names.insert(fold_name(&column.name)) {
                return Err(SqlError::Configuration(format!(
                    "column name '{}' is used more than once",
                    column.name
                )));
            }
        }

        let primary_key = resolve_primary_key(&columns, opts.primary_key.as_deref())?;
        for (i, column) in columns.iter_mut().enumerate() {
            column.primary_key = Some(i) == primary_key;
            if column.primary_key {
                column.allow_null = false;
            }
        }

        let identity = match primary_key {
            Some(i) if columns[i].role == Some(StandardColumn::Id) => Some(columns[i].clone()),
            Some(_) => None,
            None => Some(synthesized_identity(&opts.id, &seen_names)?),
        };

        let additional_names = opts
            .additional_columns
            .iter()
            .map(|c| fold_name(&c.name))
            .collect();

        Ok(Self {
            table_name: options.table_name.clone(),
            schema_name: options.schema_name.clone(),
            columns,
            primary_key,
            identity,
            clustered_columnstore_index: opts.clustered_columnstore_index,
            disable_triggers: options.disable_triggers,
            additional_names,
            level: opts.level.clone(),
            time_stamp: opts.time_stamp.clone(),
            properties: opts.properties.clone(),
            log_event: opts.log_event.clone(),
        })
    }

    /// Target table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Target schema / namespace.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// All columns in order, `Id` included.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Columns supplied on insert (everything but `Id`), in order.
    pub fn insert_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns
            .iter()
            .filter(|c| c.role != Some(StandardColumn::Id))
    }

    /// Number of columns supplied on insert.
    pub fn insert_width(&self) -> usize {
        self.insert_columns().count()
    }

    /// Property-backed columns, in order.
    pub fn additional_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.role.is_none())
    }

    /// The stored column for a standard role.
    pub fn standard_column(&self, role: StandardColumn) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.role == Some(role))
    }

    /// Whether a property name maps to an additional column (ignoring case).
    pub fn is_additional_column(&self, name: &str) -> bool {
        self.additional_names.contains(&fold_name(name))
    }

    /// The primary key column.
    ///
    /// This is a caller-designated column, the stored `Id`, or the
    /// synthesized identity column when neither exists.
    pub fn primary_key(&self) -> Option<&ColumnDefinition> {
        self.primary_key
            .map(|i| &self.columns[i])
            .or(self.identity.as_ref())
    }

    /// The auto-increment identity column of the physical table.
    ///
    /// Present unless the caller designated a non-`Id` primary key. It is
    /// never supplied on insert, whether or not `Id` is stored.
    pub fn identity(&self) -> Option<&ColumnDefinition> {
        self.identity.as_ref()
    }

    /// Whether a clustered columnstore index is requested.
    pub fn clustered_columnstore_index(&self) -> bool {
        self.clustered_columnstore_index
    }

    /// Whether triggers should be disabled while writing.
    pub fn disable_triggers(&self) -> bool {
        self.disable_triggers
    }

    /// `Level` options.
    pub fn level_options(&self) -> &LevelColumnOptions {
        &self.level
    }

    /// `TimeStamp` options.
    pub fn time_stamp_options(&self) -> &TimeStampColumnOptions {
        &self.time_stamp
    }

    /// `Properties` options.
    pub fn properties_options(&self) -> &PropertiesColumnOptions {
        &self.properties
    }

    /// `LogEvent` options.
    pub fn log_event_options(&self) -> &LogEventColumnOptions {
        &self.log_event
    }
}

/// The `Id` identity column for a table that does not store `Id` itself.
fn synthesized_identity(
    id: &ColumnDefinition,
    taken: &HashSet<String>,
) -> Result<ColumnDefinition> {
    if !id.kind.is_integer() {
        return Err(SqlError::Configuration(format!(
            "Id column '{}' must be an integer type, got {:?}",
            id.name, id.kind
        )));
    }
    if taken.contains(&fold_name(&id.name)) {
        return Err(SqlError::Configuration(format!(
            "column name '{}' collides with the identity column",
            id.name
        )));
    }
    Ok(ColumnDefinition {
        allow_null: false,
        primary_key: true,
        non_clustered_index: false,
        role: Some(StandardColumn::Id),
        ..id.clone()
    })
}

fn resolve_primary_key(
    columns: &[ColumnDefinition],
    designated: Option<&str>,
) -> Result<Option<usize>> {
    let mut keys: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary_key)
        .map(|(i, _)| i)
        .collect();

    if let Some(name) = designated {
        let index = columns
            .iter()
            .position(|c| names_equal(&c.name, name))
            .ok_or_else(|| {
                SqlError::Configuration(format!("primary key '{name}' names no column"))
            })?;
        if !keys.contains(&index) {
            keys.push(index);
        }
    }

    match keys.as_slice() {
        [] => Ok(columns
            .iter()
            .position(|c| c.role == Some(StandardColumn::Id))),
        [one] => Ok(Some(*one)),
        _ => Err(SqlError::Configuration(format!(
            "more than one primary key: {}",
            keys.iter()
                .map(|&i| columns[i].name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
