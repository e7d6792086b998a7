//! Event → row mapping.
//!
//! Standard columns are computed from the event itself; additional columns
//! are looked up in the property bag by name (ignoring case) and coerced to
//! the column's kind. A value that cannot be coerced is stored as its bare
//! string rendering instead of failing the row.

use chrono::{DateTime, NaiveDateTime};
use dbsink_core::{LogEvent, PropertyValue, ScalarValue, json};

use crate::schema::{ColumnDefinition, DataKind, Schema, StandardColumn};
use crate::value::{ColumnValue, ExtractedRow};
use crate::xml;

/// Maps events onto one schema.
#[derive(Clone, Copy, Debug)]
pub struct Extractor<'a> {
    schema: &'a Schema,
}

impl<'a> Extractor<'a> {
    /// Bind to a schema.
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Produce one value per insert column, in schema order.
    ///
    /// The row always has [`Schema::insert_width`] entries: an additional
    /// column with no matching property gets [`ColumnValue::Null`].
    pub fn extract(&self, event: &LogEvent) -> ExtractedRow {
        let mut row = ExtractedRow::with_capacity(self.schema.insert_width());
        for column in self.schema.insert_columns() {
            let value = match column.role {
                Some(role) => self.standard_value(role, event),
                None => additional_value(column, event),
            };
            row.push(column.name.clone(), value);
        }
        row
    }

    /// Value of a standard column for an event. `Id` is always `Null`.
    pub fn standard_value(&self, role: StandardColumn, event: &LogEvent) -> ColumnValue {
        match role {
            StandardColumn::Id => ColumnValue::Null,
            StandardColumn::Message => ColumnValue::Text(event.render_message()),
            StandardColumn::MessageTemplate => {
                ColumnValue::Text(event.template().text().to_string())
            }
            StandardColumn::Level => {
                if self.schema.level_options().store_as_enum {
                    ColumnValue::Level(event.level())
                } else {
                    ColumnValue::Text(event.level().name().to_string())
                }
            }
            StandardColumn::TimeStamp => {
                let ts = event.timestamp();
                if self.schema.time_stamp_options().convert_to_utc {
                    ColumnValue::DateTime(ts.naive_utc())
                } else {
                    ColumnValue::DateTime(ts.naive_local())
                }
            }
            StandardColumn::Exception => event.exception().into(),
            StandardColumn::Properties => {
                ColumnValue::Text(xml::format_properties(self.schema, event.properties()))
            }
            StandardColumn::LogEvent => ColumnValue::Text(self.event_json(event)),
        }
    }

    fn event_json(&self, event: &LogEvent) -> String {
        if self.schema.log_event_options().exclude_additional_properties {
            let trimmed = event.retain_properties(|name| !self.schema.is_additional_column(name));
            json::format_event(&trimmed)
        } else {
            json::format_event(event)
        }
    }
}

fn additional_value(column: &ColumnDefinition, event: &LogEvent) -> ColumnValue {
    match event.property_ignore_case(&column.name) {
        None => ColumnValue::Null,
        Some(PropertyValue::Scalar(ScalarValue::Null)) if column.allow_null => ColumnValue::Null,
        Some(PropertyValue::Scalar(scalar)) => {
            convert(scalar, column.kind).unwrap_or_else(|| ColumnValue::Text(scalar.to_string()))
        }
        Some(other) => ColumnValue::Text(other.to_string()),
    }
}

/// Coerce a scalar to a column kind. `None` when the value does not fit.
pub fn convert(scalar: &ScalarValue, kind: DataKind) -> Option<ColumnValue> {
    match kind {
        DataKind::Int32 => to_i64(scalar)
            .and_then(|i| i32::try_from(i).ok())
            .map(ColumnValue::Int32),
        DataKind::Int64 => to_i64(scalar).map(ColumnValue::Int64),
        DataKind::Float => to_f64(scalar).map(ColumnValue::Float),
        DataKind::Boolean => to_bool(scalar).map(ColumnValue::Bool),
        DataKind::DateTime => to_datetime(scalar).map(ColumnValue::DateTime),
        DataKind::Text | DataKind::FixedText => match scalar {
            ScalarValue::Null => None,
            other => Some(ColumnValue::Text(other.to_string())),
        },
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_i64(scalar: &ScalarValue) -> Option<i64> {
    match scalar {
        ScalarValue::Int(i) => Some(*i),
        ScalarValue::Float(f) if f.is_finite() => {
            let rounded = f.round();
            // i64::MAX as f64 rounds up to 2^63, which is out of range.
            (rounded >= -9.223_372_036_854_776e18 && rounded < 9.223_372_036_854_776e18)
                .then_some(rounded as i64)
        }
        ScalarValue::Bool(b) => Some(i64::from(*b)),
        ScalarValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(scalar: &ScalarValue) -> Option<f64> {
    match scalar {
        ScalarValue::Int(i) => Some(*i as f64),
        ScalarValue::Float(f) => Some(*f),
        ScalarValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        ScalarValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_bool(scalar: &ScalarValue) -> Option<bool> {
    match scalar {
        ScalarValue::Bool(b) => Some(*b),
        ScalarValue::Int(i) => Some(*i != 0),
        ScalarValue::Text(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn to_datetime(scalar: &ScalarValue) -> Option<NaiveDateTime> {
    match scalar {
        ScalarValue::DateTime(dt) => Some(dt.naive_local()),
        ScalarValue::Text(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_local())
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok()
        }
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
