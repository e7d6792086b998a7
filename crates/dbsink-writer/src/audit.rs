//! Synchronous sink: one connection and one INSERT per event.

use dbsink_core::LogEvent;
use dbsink_sql::{DialectStrategy, SinkOptions};
use tracing::debug;

use crate::connection::{ConnectionFactory, DbCommand, DbConnection};
use crate::error::{DriverError, Result, SinkError};
use crate::provision::provision;
use crate::sink_core::SinkCore;

/// Writes each event as it arrives and returns failures to the caller.
#[derive(Debug)]
pub struct AuditSink<F: ConnectionFactory> {
    core: SinkCore,
    factory: F,
}

impl<F: ConnectionFactory> AuditSink<F> {
    /// Build the sink, provisioning the table when auto-create is on.
    ///
    /// `disable_triggers` cannot be honoured per event, so it is rejected
    /// before any connection is opened.
    pub fn new(options: &SinkOptions, strategy: DialectStrategy, factory: F) -> Result<Self> {
        if options.disable_triggers {
            return Err(SinkError::UnsupportedAuditOption(
                "disable_triggers".to_string(),
            ));
        }
        let core = SinkCore::new(options, strategy)?;
        if options.auto_create_table {
            provision(core.strategy(), core.schema(), &factory)?;
        }
        Ok(Self { core, factory })
    }

    /// Shared schema and dialect.
    pub fn core(&self) -> &SinkCore {
        &self.core
    }

    /// Write one event.
    pub fn emit(&self, event: &LogEvent) -> Result<()> {
        self.write(event).map_err(|source| SinkError::Write { source })
    }

    fn write(&self, event: &LogEvent) -> std::result::Result<(), DriverError> {
        let mut conn = self.factory.connect()?;
        conn.open()?;
        let mut command = conn.create_command();
        self.core.prepare(&mut command, event);
        let _ = command.execute_non_query()?;
        Ok(())
    }

    /// Release the sink.
    pub fn dispose(self) {
        drop(self);
    }
}

impl<F: ConnectionFactory> Drop for AuditSink<F> {
    fn drop(&mut self) {
        debug!(table = self.core.schema().table_name(), "audit sink disposed");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::RecordingFactory;
    use assert_matches::assert_matches;
    use dbsink_core::LogLevel;
    use dbsink_sql::{ColumnValue, Dialect};

    fn options() -> SinkOptions {
        let mut opts = SinkOptions::default();
        opts.auto_create_table = false;
        opts
    }

    // ── construction ──

    #[test]
    fn disable_triggers_rejected_before_connecting() {
        let mut opts = SinkOptions::default();
        opts.disable_triggers = true;
        let factory = RecordingFactory::default();
        let result = AuditSink::new(&opts, Dialect::SqlServer.strategy(), factory.clone());
        assert_matches!(result, Err(SinkError::UnsupportedAuditOption(_)));
        assert_eq!(factory.journal.lock().connects, 0);
    }

    #[test]
    fn auto_create_provisions_once() {
        let factory = RecordingFactory::default();
        let sink = AuditSink::new(&SinkOptions::default(), Dialect::SqlServer.strategy(), factory.clone())
            .unwrap();
        let journal = factory.journal.lock();
        assert_eq!(journal.executed.len(), 1);
        assert!(journal.executed[0].0.contains("CREATE TABLE [dbo].[Logs]"));
        drop(journal);
        sink.dispose();
    }

    // ── emit ──

    #[test]
    fn emit_uses_fresh_connection_per_event() {
        let factory = RecordingFactory::default();
        let sink = AuditSink::new(&options(), Dialect::Sqlite.strategy(), factory.clone()).unwrap();
        sink.emit(&LogEvent::now(LogLevel::Information, "one")).unwrap();
        sink.emit(&LogEvent::now(LogLevel::Information, "two")).unwrap();
        let journal = factory.journal.lock();
        assert_eq!(journal.connects, 2);
        assert_eq!(journal.opens, 2);
        assert_eq!(journal.executed[1].1[0].1, ColumnValue::from("two"));
    }

    #[test]
    fn emit_failure_raises_write_error() {
        let factory = RecordingFactory::failing_at(0);
        let sink = AuditSink::new(&options(), Dialect::Sqlite.strategy(), factory).unwrap();
        assert_matches!(
            sink.emit(&LogEvent::now(LogLevel::Error, "boom")),
            Err(SinkError::Write { .. })
        );
    }
}
