//! CREATE TABLE synthesis.
//!
//! Each dialect renders its own script from a shared [`TableLayout`]. The
//! identifier column comes first as the dialect's auto-increment key, whether
//! or not `Id` is among the stored columns. Only a caller-designated primary
//! key replaces it.

use tracing::debug;

use crate::dialect::DialectStrategy;
use crate::error::{Result, SqlError};
use crate::schema::{ColumnDefinition, Schema, StandardColumn};

/// Render the idempotent CREATE TABLE script for a schema.
pub fn build_create_table(strategy: &DialectStrategy, schema: &Schema) -> Result<String> {
    let create = strategy
        .create_table
        .ok_or_else(|| SqlError::UnsupportedDialect {
            dialect: strategy.name.to_string(),
        })?;
    let sql = create(strategy, schema)?;
    debug!(dialect = strategy.name, table = schema.table_name(), %sql, "rendered create table");
    Ok(sql)
}

/// Column roles in the generated table.
#[derive(Debug)]
pub struct TableLayout<'a> {
    /// The `Id` column, rendered as the auto-increment primary key.
    pub identity: Option<&'a ColumnDefinition>,
    /// All other columns, in schema order.
    pub columns: Vec<&'a ColumnDefinition>,
    /// A caller-designated primary key that needs its own constraint.
    pub primary_key: Option<&'a ColumnDefinition>,
    /// Non-key columns that get a non-clustered index.
    pub indexes: Vec<&'a ColumnDefinition>,
}

impl<'a> TableLayout<'a> {
    /// Split a schema into layout roles.
    pub fn of(schema: &'a Schema) -> Self {
        let identity = schema.identity();
        let columns: Vec<_> = schema
            .columns()
            .iter()
            .filter(|c| c.role != Some(StandardColumn::Id))
            .collect();
        let primary_key = schema
            .primary_key()
            .filter(|c| c.role != Some(StandardColumn::Id));
        let indexes = columns
            .iter()
            .copied()
            .filter(|c| c.non_clustered_index && !c.primary_key)
            .collect();
        Self {
            identity,
            columns,
            primary_key,
            indexes,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
