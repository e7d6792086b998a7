//! Out-of-band failure reporting for batched writes.
//!
//! A batch write never propagates its failure to the host pipeline. Instead
//! the sink hands a [`BatchWriteFailure`] to its [`Diagnostics`].

use tracing::error;

use crate::error::SinkError;

/// A batch that stopped part-way.
#[derive(Debug)]
pub struct BatchWriteFailure {
    /// Events in the batch.
    pub attempted: usize,
    /// Events written before the failure.
    pub written: usize,
    /// What went wrong.
    pub error: SinkError,
}

/// Receives batch failures.
pub trait Diagnostics: Send + Sync {
    /// Report one failed batch.
    fn batch_failed(&self, failure: &BatchWriteFailure);
}

/// Logs failures at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn batch_failed(&self, failure: &BatchWriteFailure) {
        error!(
            attempted = failure.attempted,
            written = failure.written,
            error = %failure.error,
            "failed to write batch"
        );
    }
}

impl<F> Diagnostics for F
where
    F: Fn(&BatchWriteFailure) + Send + Sync,
{
    fn batch_failed(&self, failure: &BatchWriteFailure) {
        self(failure);
    }
}
