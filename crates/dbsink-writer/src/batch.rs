//! Batched sink: one connection and one reused command per batch.

use std::sync::Arc;
use std::time::Duration;

use dbsink_core::LogEvent;
use dbsink_sql::{DialectStrategy, SinkOptions};
use tracing::debug;

use crate::connection::{ConnectionFactory, DbCommand, DbConnection};
use crate::diagnostics::{BatchWriteFailure, Diagnostics, TracingDiagnostics};
use crate::error::{DriverError, Result, SinkError};
use crate::provision::provision;
use crate::sink_core::SinkCore;

/// Host-side batching parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum events per batch.
    pub batch_posting_limit: usize,
    /// Interval between periodic flushes.
    pub period: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_posting_limit: 50,
            period: Duration::from_secs(5),
        }
    }
}

/// Writes batches of events; failures go to [`Diagnostics`], never to the caller.
pub struct BatchSink<F: ConnectionFactory> {
    core: SinkCore,
    factory: F,
    diagnostics: Arc<dyn Diagnostics>,
    options: BatchOptions,
}

impl<F: ConnectionFactory> BatchSink<F> {
    /// Build the sink, provisioning the table when auto-create is on.
    pub fn new(
        options: &SinkOptions,
        strategy: DialectStrategy,
        factory: F,
        batch: BatchOptions,
    ) -> Result<Self> {
        let core = SinkCore::new(options, strategy)?;
        if options.auto_create_table {
            provision(core.strategy(), core.schema(), &factory)?;
        }
        Ok(Self {
            core,
            factory,
            diagnostics: Arc::new(TracingDiagnostics),
            options: batch,
        })
    }

    /// Replace the failure reporter.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Shared schema and dialect.
    pub fn core(&self) -> &SinkCore {
        &self.core
    }

    /// Batching parameters.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Write `events` in order and return how many were written.
    ///
    /// The first failure aborts the remainder of the batch.
    pub fn emit_batch(&self, events: &[LogEvent]) -> usize {
        if events.is_empty() {
            return 0;
        }
        let mut written = 0;
        match self.write(events, &mut written) {
            Ok(()) => {
                debug!(count = written, "batch written");
            }
            Err(source) => {
                let failure = BatchWriteFailure {
                    attempted: events.len(),
                    written,
                    error: SinkError::Write { source },
                };
                self.diagnostics.batch_failed(&failure);
            }
        }
        written
    }

    fn write(&self, events: &[LogEvent], written: &mut usize) -> std::result::Result<(), DriverError> {
        let mut conn = self.factory.connect()?;
        conn.open()?;
        let mut command = conn.create_command();
        for event in events {
            self.core.prepare(&mut command, event);
            let _ = command.execute_non_query()?;
            *written += 1;
        }
        Ok(())
    }

    /// Release the sink.
    pub fn dispose(self) {
        drop(self);
    }
}

impl<F: ConnectionFactory> Drop for BatchSink<F> {
    fn drop(&mut self) {
        debug!(table = self.core.schema().table_name(), "batch sink disposed");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::RecordingFactory;
    use dbsink_core::LogLevel;
    use dbsink_sql::{ColumnValue, Dialect};
    use parking_lot::Mutex;

    fn sink(factory: &RecordingFactory) -> BatchSink<RecordingFactory> {
        let mut opts = SinkOptions::default();
        opts.auto_create_table = false;
        BatchSink::new(&opts, Dialect::Sqlite.strategy(), factory.clone(), BatchOptions::default())
            .unwrap()
    }

    fn events(n: usize) -> Vec<LogEvent> {
        (0..n)
            .map(|i| LogEvent::now(LogLevel::Information, format!("event {i}")))
            .collect()
    }

    #[test]
    fn defaults() {
        let opts = BatchOptions::default();
        assert_eq!(opts.batch_posting_limit, 50);
        assert_eq!(opts.period, Duration::from_secs(5));
    }

    // ── emit_batch ──

    #[test]
    fn empty_batch_is_noop() {
        let factory = RecordingFactory::default();
        assert_eq!(sink(&factory).emit_batch(&[]), 0);
        assert_eq!(factory.journal.lock().connects, 0);
    }

    #[test]
    fn one_connection_one_command_per_batch() {
        let factory = RecordingFactory::default();
        assert_eq!(sink(&factory).emit_batch(&events(3)), 3);
        let journal = factory.journal.lock();
        assert_eq!(journal.connects, 1);
        assert_eq!(journal.commands, 1);
        assert_eq!(journal.executed.len(), 3);
        assert_eq!(journal.executed[2].1[0].1, ColumnValue::from("event 2"));
        let width = journal.executed[0].1.len();
        assert!(journal.executed.iter().all(|(_, p)| p.len() == width));
    }

    #[test]
    fn failure_aborts_rest_and_reports() {
        let factory = RecordingFactory::failing_at(1);
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink_reports = Arc::clone(&reports);
        let sink = sink(&factory).with_diagnostics(Arc::new(move |f: &BatchWriteFailure| {
            sink_reports.lock().push((f.attempted, f.written));
        }));
        assert_eq!(sink.emit_batch(&events(4)), 1);
        assert_eq!(factory.journal.lock().executed.len(), 1);
        assert_eq!(*reports.lock(), vec![(4, 1)]);
    }
}
