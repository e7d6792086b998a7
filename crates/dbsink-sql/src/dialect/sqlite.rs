//! SQLite.

use std::fmt::Write as _;

use super::{DialectStrategy, TypeName, fixed_length, text_length};
use crate::ddl::TableLayout;
use crate::error::Result;
use crate::schema::{DataKind, Schema};

pub(super) const STRATEGY: DialectStrategy = DialectStrategy {
    dialect: super::Dialect::Sqlite,
    name: "Sqlite",
    quote_open: "[",
    quote_close: "]",
    parameter_prefix: "@",
    qualify_with_schema: false,
    default_values_insert: "DEFAULT VALUES",
    type_name,
    create_table: Some(create_table),
};

fn type_name(kind: DataKind, length: Option<i32>) -> Option<TypeName> {
    Some(match kind {
        DataKind::Int32 | DataKind::Int64 | DataKind::Boolean => TypeName::plain("INTEGER"),
        DataKind::Text => {
            let _ = text_length(length)?;
            TypeName::plain("TEXT")
        }
        DataKind::FixedText => {
            let _ = fixed_length(length)?;
            TypeName::plain("TEXT")
        }
        DataKind::DateTime => TypeName::plain("TEXT"),
        DataKind::Float => TypeName::plain("REAL"),
    })
}

/// `CREATE TABLE IF NOT EXISTS` followed by `CREATE INDEX IF NOT EXISTS`.
fn create_table(strategy: &DialectStrategy, schema: &Schema) -> Result<String> {
    let layout = TableLayout::of(schema);
    let table = schema.table_name();
    let target = strategy.table_ref(schema);

    let mut lines = Vec::with_capacity(layout.columns.len() + 2);
    if let Some(id) = layout.identity {
        lines.push(format!(
            "{} INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT",
            strategy.quote(&id.name)
        ));
    }
    for column in &layout.columns {
        lines.push(strategy.column_definition(column)?);
    }
    if let Some(pk) = layout.primary_key {
        lines.push(format!("PRIMARY KEY ({})", strategy.quote(&pk.name)));
    }

    let mut sql = String::new();
    let _ = writeln!(sql, "CREATE TABLE IF NOT EXISTS {target} (");
    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n);\n");
    for (i, column) in layout.indexes.iter().enumerate() {
        let _ = writeln!(
            sql,
            "CREATE INDEX IF NOT EXISTS {} ON {target} ({});",
            strategy.quote(&format!("IX{}_{table}", i + 1)),
            strategy.quote(&column.name)
        );
    }
    Ok(sql)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
