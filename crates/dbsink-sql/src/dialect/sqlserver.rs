//! SQL Server.

use std::fmt::Write as _;

use super::{DialectStrategy, TypeName, fixed_length, string_literal, text_length};
use crate::ddl::TableLayout;
use crate::error::Result;
use crate::schema::{DataKind, Schema};

pub(super) const STRATEGY: DialectStrategy = DialectStrategy {
    dialect: super::Dialect::SqlServer,
    name: "SqlServer",
    quote_open: "[",
    quote_close: "]",
    parameter_prefix: "@",
    qualify_with_schema: true,
    default_values_insert: "DEFAULT VALUES",
    type_name,
    create_table: Some(create_table),
};

const MAX_NCHAR: u32 = 4000;

fn type_name(kind: DataKind, length: Option<i32>) -> Option<TypeName> {
    Some(match kind {
        DataKind::Int32 => TypeName::plain("INT"),
        DataKind::Int64 => TypeName::plain("BIGINT"),
        DataKind::Text => match text_length(length)? {
            Some(n) if n <= MAX_NCHAR => TypeName::sized("NVARCHAR", n),
            _ => TypeName::max("NVARCHAR"),
        },
        DataKind::FixedText => {
            let n = fixed_length(length).filter(|n| *n <= MAX_NCHAR)?;
            TypeName::sized("NCHAR", n)
        }
        DataKind::DateTime => TypeName::plain("DATETIME"),
        DataKind::Boolean => TypeName::plain("BIT"),
        DataKind::Float => TypeName::plain("FLOAT"),
    })
}

/// Schema guard, then the table guard wrapping CREATE TABLE and its indexes.
fn create_table(strategy: &DialectStrategy, schema: &Schema) -> Result<String> {
    let layout = TableLayout::of(schema);
    let table = schema.table_name();
    let owner = if schema.schema_name().is_empty() {
        "dbo"
    } else {
        schema.schema_name()
    };
    let target = format!("{}.{}", strategy.quote(owner), strategy.quote(table));

    let mut lines = Vec::with_capacity(layout.columns.len() + 2);
    if let Some(id) = layout.identity {
        let ty = strategy.column_type(id)?;
        lines.push(format!("{} {ty} IDENTITY(1,1) NOT NULL", strategy.quote(&id.name)));
    }
    for column in &layout.columns {
        lines.push(strategy.column_definition(column)?);
    }
    if let Some(pk) = schema.primary_key() {
        let clustering = if pk.non_clustered_index || schema.clustered_columnstore_index() {
            "NON"
        } else {
            ""
        };
        lines.push(format!(
            "CONSTRAINT {} PRIMARY KEY {clustering}CLUSTERED ({})",
            strategy.quote(&format!("PK_{table}")),
            strategy.quote(&pk.name)
        ));
    }

    let mut sql = String::new();
    let _ = writeln!(
        sql,
        "IF(NOT EXISTS(SELECT * FROM sys.schemas WHERE name = {}))",
        string_literal(owner)
    );
    sql.push_str("BEGIN\n");
    let _ = writeln!(
        sql,
        "EXEC({})",
        string_literal(&format!(
            "CREATE SCHEMA {} AUTHORIZATION [dbo]",
            strategy.quote(owner)
        ))
    );
    sql.push_str("END\n");
    let _ = writeln!(
        sql,
        "IF NOT EXISTS (SELECT s.name, t.name FROM sys.tables t JOIN sys.schemas s ON t.schema_id = s.schema_id WHERE s.name = {} AND t.name = {})",
        string_literal(owner),
        string_literal(table)
    );
    sql.push_str("BEGIN\n");
    let _ = writeln!(sql, "CREATE TABLE {target} (");
    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n);\n");
    if schema.clustered_columnstore_index() {
        let _ = writeln!(
            sql,
            "CREATE CLUSTERED COLUMNSTORE INDEX {} ON {target};",
            strategy.quote(&format!("CCI_{table}"))
        );
    }
    for (i, column) in layout.indexes.iter().enumerate() {
        let _ = writeln!(
            sql,
            "CREATE NONCLUSTERED INDEX {} ON {target} ({});",
            strategy.quote(&format!("IX{}_{table}", i + 1)),
            strategy.quote(&column.name)
        );
    }
    sql.push_str("END\n");
    Ok(sql)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
