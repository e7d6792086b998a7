//! Table provisioning.

use dbsink_sql::{DialectStrategy, Schema, build_create_table};
use tracing::info;

use crate::connection::{ConnectionFactory, DbCommand, DbConnection};
use crate::error::{DriverError, Result, SinkError};

/// Run the idempotent CREATE TABLE for `schema` on one fresh connection.
///
/// Rendering failures (`UnsupportedDialect`, `UnsupportedColumnType`) surface
/// as [`SinkError::Sql`]; execution failures as [`SinkError::Provisioning`].
pub fn provision<F: ConnectionFactory>(
    strategy: &DialectStrategy,
    schema: &Schema,
    factory: &F,
) -> Result<()> {
    let sql = build_create_table(strategy, schema)?;
    execute(factory, &sql).map_err(|source| SinkError::Provisioning { source })?;
    info!(
        dialect = strategy.name,
        table = schema.table_name(),
        "table provisioned"
    );
    Ok(())
}

fn execute<F: ConnectionFactory>(factory: &F, sql: &str) -> std::result::Result<(), DriverError> {
    let mut conn = factory.connect()?;
    conn.open()?;
    let mut command = conn.create_command();
    command.set_text(sql);
    let _ = command.execute_non_query()?;
    Ok(())
}
