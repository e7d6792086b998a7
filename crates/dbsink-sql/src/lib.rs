//! # dbsink-sql
//!
//! The event-to-row mapping and SQL synthesis engine.
//!
//! - **Schema**: [`Schema::build`] validates [`SinkOptions`] into an immutable column layout
//! - **Extraction**: [`Extractor::extract`] turns one [`LogEvent`](dbsink_core::LogEvent) into an [`ExtractedRow`]
//! - **Properties XML**: [`xml`] renders the property bag for the `Properties` column
//! - **Dialects**: [`DialectStrategy`] table entries for SQL Server, MySQL, SQLite and Oracle
//! - **Statements**: [`build_insert`] and [`build_create_table`]
//!
//! Nothing here touches a database; connections live in `dbsink-writer`.

#![deny(unsafe_code)]

pub mod ddl;
pub mod dialect;
pub mod error;
pub mod extract;
pub mod insert;
pub mod schema;
pub mod value;
pub mod xml;

pub use ddl::build_create_table;
pub use dialect::{Dialect, DialectStrategy, TypeName, TypeSize};
pub use error::{Result, SqlError};
pub use extract::Extractor;
pub use insert::{InsertStatement, build_insert};
pub use schema::{
    BoxError, ColumnDefinition, ColumnOptions, DataKind, LevelColumnOptions,
    LogEventColumnOptions, PropertiesColumnOptions, PropertyFilter, Schema, SinkOptions,
    StandardColumn, TimeStampColumnOptions,
};
pub use value::{ColumnValue, ExtractedRow};
