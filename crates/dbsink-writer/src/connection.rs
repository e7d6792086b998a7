//! Connection seams.
//!
//! The sinks only need to open a connection, create one command, set its
//! text, bind named parameters and execute. Each driver adapts to these three
//! traits; any `Fn() -> Result<C, DriverError>` closure is a factory.

use dbsink_sql::ColumnValue;

use crate::error::DriverError;

/// A reusable command bound to one connection.
pub trait DbCommand {
    /// Replace the SQL text.
    fn set_text(&mut self, sql: &str);

    /// Bind a named parameter.
    fn add_parameter(&mut self, name: &str, value: &ColumnValue);

    /// Drop all bound parameters.
    fn clear_parameters(&mut self);

    /// Execute, returning the number of affected rows.
    fn execute_non_query(&mut self) -> Result<usize, DriverError>;
}

/// One database connection.
pub trait DbConnection {
    /// Command type borrowing this connection.
    type Command<'c>: DbCommand
    where
        Self: 'c;

    /// Open the connection. Adapters whose connections are live on creation
    /// return `Ok(())`.
    fn open(&mut self) -> Result<(), DriverError>;

    /// Create a command on this connection.
    fn create_command(&mut self) -> Self::Command<'_>;
}

/// Produces a fresh connection per call.
pub trait ConnectionFactory: Send + Sync {
    /// Connection type.
    type Connection: DbConnection;

    /// Obtain a connection.
    fn connect(&self) -> Result<Self::Connection, DriverError>;
}

impl<F, C> ConnectionFactory for F
where
    F: Fn() -> Result<C, DriverError> + Send + Sync,
    C: DbConnection,
{
    type Connection = C;

    fn connect(&self) -> Result<C, DriverError> {
        self()
    }
}


// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
