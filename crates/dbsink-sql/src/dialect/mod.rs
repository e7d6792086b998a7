//! SQL dialect strategies.
//!
//! A dialect is a plain [`DialectStrategy`] value: quoting tokens, the
//! parameter prefix, a type-mapping function and an optional CREATE TABLE
//! renderer. [`Dialect::strategy`] returns the built-in entries; callers with
//! a different target supply their own complete strategy value.

mod mysql;
mod oracle;
mod sqlite;
mod sqlserver;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SqlError};
use crate::schema::{ColumnDefinition, DataKind, Schema};

/// Built-in dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Microsoft SQL Server.
    SqlServer,
    /// MySQL / MariaDB.
    MySql,
    /// Oracle (insert only).
    Oracle,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// Every built-in dialect.
    pub const ALL: [Self; 4] = [Self::SqlServer, Self::MySql, Self::Oracle, Self::Sqlite];

    /// The built-in strategy entry.
    pub fn strategy(self) -> DialectStrategy {
        match self {
            Self::SqlServer => sqlserver::STRATEGY,
            Self::MySql => mysql::STRATEGY,
            Self::Oracle => oracle::STRATEGY,
            Self::Sqlite => sqlite::STRATEGY,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::SqlServer => "SqlServer",
            Self::MySql => "MySql",
            Self::Oracle => "Oracle",
            Self::Sqlite => "Sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "oracle" => Ok(Self::Oracle),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(SqlError::Configuration(format!("unknown dialect '{s}'"))),
        }
    }
}

/// Length suffix of a column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeSize {
    /// `(MAX)`.
    Max,
    /// `(n)`.
    Length(u32),
}

/// A rendered column type such as `NVARCHAR(MAX)` or `INTEGER`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeName {
    /// Base type keyword.
    pub name: &'static str,
    /// Optional length suffix.
    pub size: Option<TypeSize>,
}

impl TypeName {
    /// A type without a length.
    pub const fn plain(name: &'static str) -> Self {
        Self { name, size: None }
    }

    /// A type with an explicit length.
    pub const fn sized(name: &'static str, length: u32) -> Self {
        Self {
            name,
            size: Some(TypeSize::Length(length)),
        }
    }

    /// A type with a `MAX` length.
    pub const fn max(name: &'static str) -> Self {
        Self {
            name,
            size: Some(TypeSize::Max),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        match self.size {
            None => Ok(()),
            Some(TypeSize::Max) => f.write_str("(MAX)"),
            Some(TypeSize::Length(n)) => write!(f, "({n})"),
        }
    }
}

/// Maps a column's (kind, length) to a dialect type; `None` when unsupported.
pub type TypeNameFn = fn(DataKind, Option<i32>) -> Option<TypeName>;

/// Renders the idempotent CREATE TABLE script.
pub type CreateTableFn = fn(&DialectStrategy, &Schema) -> Result<String>;

/// Everything the statement builders need to know about a dialect.
#[derive(Clone, Copy, Debug)]
pub struct DialectStrategy {
    /// Which dialect this entry targets.
    pub dialect: Dialect,
    /// Name used in errors and logs.
    pub name: &'static str,
    /// Opening identifier quote.
    pub quote_open: &'static str,
    /// Closing identifier quote.
    pub quote_close: &'static str,
    /// Prefix of named parameters.
    pub parameter_prefix: &'static str,
    /// Qualify the table with the schema name on insert.
    pub qualify_with_schema: bool,
    /// Insert suffix used when no column is supplied.
    pub default_values_insert: &'static str,
    /// Type mapping.
    pub type_name: TypeNameFn,
    /// CREATE TABLE renderer, if the dialect supports it.
    pub create_table: Option<CreateTableFn>,
}

impl DialectStrategy {
    /// Quote an identifier, doubling any embedded closing quote.
    pub fn quote(&self, ident: &str) -> String {
        let escaped = ident.replace(self.quote_close, &self.quote_close.repeat(2));
        format!("{}{escaped}{}", self.quote_open, self.quote_close)
    }

    /// Parameter placeholder for a column position: `{prefix}p{index}`.
    pub fn parameter_name(&self, index: usize) -> String {
        format!("{}p{index}", self.parameter_prefix)
    }

    /// The (possibly schema-qualified) quoted table reference.
    pub fn table_ref(&self, schema: &Schema) -> String {
        if self.qualify_with_schema && !schema.schema_name().is_empty() {
            format!(
                "{}.{}",
                self.quote(schema.schema_name()),
                self.quote(schema.table_name())
            )
        } else {
            self.quote(schema.table_name())
        }
    }

    /// Map a column to a dialect type.
    pub fn column_type(&self, column: &ColumnDefinition) -> Result<TypeName> {
        (self.type_name)(column.kind, column.max_length).ok_or_else(|| {
            SqlError::UnsupportedColumnType {
                column: column.name.clone(),
                dialect: self.name.to_string(),
                kind: column.kind,
            }
        })
    }

    /// `<name> <type> NULL|NOT NULL`.
    pub fn column_definition(&self, column: &ColumnDefinition) -> Result<String> {
        let ty = self.column_type(column)?;
        let null = if column.allow_null { "NULL" } else { "NOT NULL" };
        Ok(format!("{} {ty} {null}", self.quote(&column.name)))
    }
}

/// Length of a variable text column: `Some(None)` for unbounded.
fn text_length(length: Option<i32>) -> Option<Option<u32>> {
    match length {
        None | Some(-1) => Some(None),
        Some(n) if n > 0 => u32::try_from(n).ok().map(Some),
        Some(_) => None,
    }
}

/// Length of a fixed text column; unbounded is not representable.
fn fixed_length(length: Option<i32>) -> Option<u32> {
    length
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
}

/// `'text'` with embedded quotes doubled.
fn string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
