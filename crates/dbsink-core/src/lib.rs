//! # dbsink-core
//!
//! Shared vocabulary for the dbsink crates.
//!
//! - **Levels**: [`LogLevel`] with stable ordinals and textual names
//! - **Properties**: [`PropertyValue`] tagged union (scalar, sequence, structure, dictionary)
//! - **Templates**: [`MessageTemplate`] parsing and rendering against an event's properties
//! - **Events**: [`LogEvent`], the read-only record every sink consumes
//! - **JSON**: [`json::format_event`] renders a whole event as a JSON document
//! - **Logging**: [`logging::init_subscriber`] for the process-wide `tracing` subscriber

#![deny(unsafe_code)]

pub mod event;
pub mod json;
pub mod level;
pub mod logging;
pub mod property;
pub mod template;

pub use event::{LogEvent, fold_name, names_equal};
pub use level::LogLevel;
pub use property::{PropertyValue, ScalarValue};
pub use template::MessageTemplate;
