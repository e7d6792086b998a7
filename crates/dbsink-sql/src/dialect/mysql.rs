//! MySQL / MariaDB.

use std::fmt::Write as _;

use super::{DialectStrategy, TypeName, fixed_length, text_length};
use crate::ddl::TableLayout;
use crate::error::Result;
use crate::schema::{DataKind, Schema};

pub(super) const STRATEGY: DialectStrategy = DialectStrategy {
    dialect: super::Dialect::MySql,
    name: "MySql",
    quote_open: "`",
    quote_close: "`",
    parameter_prefix: "?",
    qualify_with_schema: false,
    default_values_insert: "() VALUES ()",
    type_name,
    create_table: Some(create_table),
};

const MAX_VARCHAR: u32 = 16_383;
const MAX_CHAR: u32 = 255;
/// Index prefix length for unbounded text columns.
const TEXT_INDEX_PREFIX: u32 = 255;

fn type_name(kind: DataKind, length: Option<i32>) -> Option<TypeName> {
    Some(match kind {
        DataKind::Int32 => TypeName::plain("INT"),
        DataKind::Int64 => TypeName::plain("BIGINT"),
        DataKind::Text => match text_length(length)? {
            Some(n) if n <= MAX_VARCHAR => TypeName::sized("VARCHAR", n),
            _ => TypeName::plain("LONGTEXT"),
        },
        DataKind::FixedText => {
            let n = fixed_length(length).filter(|n| *n <= MAX_CHAR)?;
            TypeName::sized("CHAR", n)
        }
        DataKind::DateTime => TypeName::sized("DATETIME", 6),
        DataKind::Boolean => TypeName::sized("TINYINT", 1),
        DataKind::Float => TypeName::plain("DOUBLE"),
    })
}

/// Single `CREATE TABLE IF NOT EXISTS` with inline key and index clauses.
fn create_table(strategy: &DialectStrategy, schema: &Schema) -> Result<String> {
    let layout = TableLayout::of(schema);
    let table = schema.table_name();

    let mut lines = Vec::with_capacity(layout.columns.len() + layout.indexes.len() + 2);
    if let Some(id) = layout.identity {
        let ty = strategy.column_type(id)?;
        lines.push(format!(
            "{} {ty} NOT NULL AUTO_INCREMENT PRIMARY KEY",
            strategy.quote(&id.name)
        ));
    }
    for column in &layout.columns {
        lines.push(strategy.column_definition(column)?);
    }
    if let Some(pk) = layout.primary_key {
        lines.push(format!("PRIMARY KEY ({})", key_part(strategy, pk)?));
    }
    for (i, column) in layout.indexes.iter().enumerate() {
        lines.push(format!(
            "INDEX {} ({})",
            strategy.quote(&format!("IX{}_{table}", i + 1)),
            key_part(strategy, column)?
        ));
    }

    let mut sql = String::new();
    let _ = writeln!(sql, "CREATE TABLE IF NOT EXISTS {} (", strategy.table_ref(schema));
    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n);\n");
    Ok(sql)
}

/// Quoted column, with a prefix length when the type cannot be indexed whole.
fn key_part(strategy: &DialectStrategy, column: &crate::schema::ColumnDefinition) -> Result<String> {
    let ty = strategy.column_type(column)?;
    let quoted = strategy.quote(&column.name);
    Ok(if ty.name.ends_with("TEXT") {
        format!("{quoted}({TEXT_INDEX_PREFIX})")
    } else {
        quoted
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
