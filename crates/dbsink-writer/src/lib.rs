//! # dbsink-writer
//!
//! Executes the SQL that `dbsink-sql` renders.
//!
//! - **Connections**: [`ConnectionFactory`] / [`DbConnection`] / [`DbCommand`] seams,
//!   with a `rusqlite` implementation in [`sqlite`]
//! - **Provisioning**: [`provision`] runs the idempotent CREATE TABLE once
//! - **Sinks**: [`AuditSink`] writes one event per call and raises failures;
//!   [`BatchSink`] writes a batch per connection and reports failures to [`Diagnostics`]
//! - **Host**: [`DbSinkLayer`] feeds `tracing` events into a [`BatchSink`]

#![deny(unsafe_code)]

pub mod audit;
pub mod batch;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod layer;
pub mod provision;
pub mod sink_core;
pub mod sqlite;

pub use audit::AuditSink;
pub use batch::{BatchOptions, BatchSink};
pub use connection::{ConnectionFactory, DbCommand, DbConnection};
pub use diagnostics::{BatchWriteFailure, Diagnostics, TracingDiagnostics};
pub use error::{DriverError, Result, SinkError};
pub use layer::{DbSinkLayer, LayerHandle, spawn_flush_task};
pub use provision::provision;
pub use sink_core::SinkCore;
pub use sqlite::{PoolConfig, SqliteConnectionFactory};
