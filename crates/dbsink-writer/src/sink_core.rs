//! State shared by the audit and batch sinks.

use dbsink_core::LogEvent;
use dbsink_sql::{DialectStrategy, Extractor, InsertStatement, Schema, SinkOptions, build_insert};
use tracing::debug;

use crate::connection::DbCommand;
use crate::error::Result;

/// Immutable schema plus dialect; renders and binds one INSERT per event.
#[derive(Clone, Debug)]
pub struct SinkCore {
    schema: Schema,
    strategy: DialectStrategy,
}

impl SinkCore {
    /// Validate options into a schema for the given dialect.
    pub fn new(options: &SinkOptions, strategy: DialectStrategy) -> Result<Self> {
        let schema = Schema::build(options)?;
        Ok(Self { schema, strategy })
    }

    /// The validated schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The dialect strategy.
    pub fn strategy(&self) -> &DialectStrategy {
        &self.strategy
    }

    /// Render the INSERT for an event.
    pub fn insert_for(&self, event: &LogEvent) -> InsertStatement {
        let row = Extractor::new(&self.schema).extract(event);
        build_insert(&self.strategy, &self.schema, &row)
    }

    /// Reset `command` to the INSERT for `event`.
    pub fn prepare<C: DbCommand>(&self, command: &mut C, event: &LogEvent) {
        let stmt = self.insert_for(event);
        debug!(sql = %stmt.sql, parameters = stmt.parameters.len(), "prepared insert");
        command.set_text(&stmt.sql);
        command.clear_parameters();
        for (name, value) in &stmt.parameters {
            command.add_parameter(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbsink_core::LogLevel;
    use dbsink_sql::{ColumnValue, Dialect, SqlError};
    use crate::connection::testing::RecordingFactory;
    use crate::connection::{ConnectionFactory, DbConnection};
    use crate::error::SinkError;

    #[test]
    fn invalid_options_rejected() {
        let opts = SinkOptions::new("");
        let err = SinkCore::new(&opts, Dialect::Sqlite.strategy()).unwrap_err();
        assert!(matches!(err, SinkError::Sql(SqlError::Configuration(_))));
    }

    #[test]
    fn prepare_replaces_text_and_parameters() {
        let core = SinkCore::new(&SinkOptions::default(), Dialect::Sqlite.strategy()).unwrap();
        let factory = RecordingFactory::default();
        let mut conn = factory.connect().unwrap();
        let mut cmd = conn.create_command();
        cmd.set_text("stale");
        cmd.add_parameter("@stale", &ColumnValue::Null);
        core.prepare(&mut cmd, &LogEvent::now(LogLevel::Debug, "hello"));
        cmd.execute_non_query().unwrap();
        drop(cmd);
        let journal = factory.journal.lock();
        let (sql, params) = &journal.executed[0];
        assert!(sql.starts_with("INSERT INTO [Logs] ([Message],"));
        assert_eq!(params.len(), core.schema().insert_width());
        assert_eq!(params[0], ("@p0".to_string(), ColumnValue::from("hello")));
    }
}
