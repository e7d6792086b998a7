//! Parameterized INSERT synthesis.

use crate::dialect::DialectStrategy;
use crate::schema::Schema;
use crate::value::{ColumnValue, ExtractedRow};

/// SQL text plus its named parameters, in placeholder order.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertStatement {
    /// `INSERT INTO <table> (<c0>,<c1>) VALUES (<p0>,<p1>)`.
    pub sql: String,
    /// `(placeholder, value)` pairs; NULLs are kept explicitly.
    pub parameters: Vec<(String, ColumnValue)>,
}

/// Build the INSERT for one extracted row.
///
/// Each row column appears once, in row order, bound to `{prefix}p{index}`.
pub fn build_insert(
    strategy: &DialectStrategy,
    schema: &Schema,
    row: &ExtractedRow,
) -> InsertStatement {
    let table = strategy.table_ref(schema);
    if row.is_empty() {
        return InsertStatement {
            sql: format!("INSERT INTO {table} {}", strategy.default_values_insert),
            parameters: Vec::new(),
        };
    }

    let mut columns = Vec::with_capacity(row.len());
    let mut placeholders = Vec::with_capacity(row.len());
    let mut parameters = Vec::with_capacity(row.len());
    for (index, (column, value)) in row.iter().enumerate() {
        let name = strategy.parameter_name(index);
        columns.push(strategy.quote(column));
        placeholders.push(name.clone());
        parameters.push((name, value.clone()));
    }

    InsertStatement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(","),
            placeholders.join(",")
        ),
        parameters,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::extract::Extractor;
    use crate::schema::{ColumnDefinition, DataKind, SinkOptions, StandardColumn};
    use chrono::DateTime;
    use dbsink_core::{LogEvent, LogLevel, PropertyValue};

    fn age_schema() -> Schema {
        let mut opts = SinkOptions::default();
        opts.columns.store = vec![
            StandardColumn::Message,
            StandardColumn::Level,
            StandardColumn::TimeStamp,
            StandardColumn::Id,
        ];
        opts.columns.additional_columns = vec![ColumnDefinition::new("Age", DataKind::Int32)];
        Schema::build(&opts).unwrap()
    }

    fn event() -> LogEvent {
        let ts = DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z").unwrap();
        LogEvent::new(ts, LogLevel::Information, "hello").with_property("Age", 30)
    }

    #[test]
    fn sql_server_shape() {
        let schema = age_schema();
        let row = Extractor::new(&schema).extract(&event());
        let stmt = build_insert(&Dialect::SqlServer.strategy(), &schema, &row);
        assert_eq!(
            stmt.sql,
            "INSERT INTO [dbo].[Logs] ([Message],[Level],[TimeStamp],[Age]) VALUES (@p0,@p1,@p2,@p3)"
        );
        assert_eq!(stmt.parameters.len(), 4);
        assert_eq!(stmt.parameters[3], ("@p3".to_string(), ColumnValue::Int32(30)));
    }

    #[test]
    fn mysql_and_oracle_shapes() {
        let schema = age_schema();
        let row = Extractor::new(&schema).extract(&event());
        let mysql = build_insert(&Dialect::MySql.strategy(), &schema, &row);
        assert!(mysql.sql.starts_with("INSERT INTO `Logs` (`Message`,"));
        assert!(mysql.sql.ends_with("VALUES (?p0,?p1,?p2,?p3)"));
        let oracle = build_insert(&Dialect::Oracle.strategy(), &schema, &row);
        assert!(oracle.sql.starts_with("INSERT INTO \"Logs\" (\"Message\","));
        assert!(oracle.sql.ends_with("VALUES (:p0,:p1,:p2,:p3)"));
    }

    #[test]
    fn null_parameter_kept() {
        let schema = age_schema();
        let e = event().with_property("Age", PropertyValue::null());
        let row = Extractor::new(&schema).extract(&e);
        let stmt = build_insert(&Dialect::Sqlite.strategy(), &schema, &row);
        assert_eq!(stmt.parameters[3].1, ColumnValue::Null);
    }

    #[test]
    fn empty_row_uses_default_values() {
        let mut opts = SinkOptions::default();
        opts.columns.store = vec![StandardColumn::Id];
        let schema = Schema::build(&opts).unwrap();
        let row = Extractor::new(&schema).extract(&event());
        assert!(row.is_empty());
        let stmt = build_insert(&Dialect::Sqlite.strategy(), &schema, &row);
        assert_eq!(stmt.sql, "INSERT INTO [Logs] DEFAULT VALUES");
        let stmt = build_insert(&Dialect::MySql.strategy(), &schema, &row);
        assert_eq!(stmt.sql, "INSERT INTO `Logs` () VALUES ()");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn one_placeholder_per_column(
                extra in proptest::collection::btree_set("[a-z]{3,8}", 0..8),
                dialect in proptest::sample::select(Dialect::ALL.to_vec()),
            ) {
                let mut opts = SinkOptions::default();
                opts.columns.additional_columns = extra
                    .iter()
                    .map(|n| ColumnDefinition::new(format!("c_{n}"), DataKind::Text))
                    .collect();
                let schema = Schema::build(&opts).unwrap();
                let row = Extractor::new(&schema).extract(&event());
                let strategy = dialect.strategy();
                let stmt = build_insert(&strategy, &schema, &row);
                prop_assert_eq!(stmt.parameters.len(), row.len());
                let (_, values) = stmt.sql.rsplit_once("VALUES (").unwrap();
                let placeholders: Vec<&str> = values.trim_end_matches(')').split(',').collect();
                let names: Vec<&str> = stmt.parameters.iter().map(|(n, _)| n.as_str()).collect();
                prop_assert_eq!(placeholders, names);
                for (i, (name, _)) in stmt.parameters.iter().enumerate() {
                    prop_assert_eq!(name, &strategy.parameter_name(i));
                }
                for column in row.columns() {
                    let quoted = strategy.quote(column);
                    prop_assert!(stmt.sql.contains(&quoted));
                }
            }
        }
    }
}
