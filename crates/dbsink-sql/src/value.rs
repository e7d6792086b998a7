//! Typed column values and extracted rows.

use std::fmt;

use chrono::NaiveDateTime;
use dbsink_core::LogLevel;

/// A value ready to bind to one column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
    /// Double precision float.
    Float(f64),
    /// Text.
    Text(String),
    /// Date and time without offset.
    DateTime(NaiveDateTime),
    /// A level stored as its enumeration value; how it binds is up to the driver.
    Level(LogLevel),
}

impl ColumnValue {
    /// Whether this is [`ColumnValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The text inside, if this is [`ColumnValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int32(i) => write!(f, "{i}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Level(level) => write!(f, "{level} ({})", level.as_num()),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One event's values, as `(column name, value)` pairs in schema order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedRow {
    entries: Vec<(String, ColumnValue)>,
}

impl ExtractedRow {
    /// An empty row with room for `capacity` columns.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a column value.
    pub fn push(&mut self, column: impl Into<String>, value: ColumnValue) {
        self.entries.push((column.into(), value));
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Value for a column (exact name).
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == column)
            .map(|(_, v)| v)
    }

    /// Consume into the underlying pairs.
    pub fn into_entries(self) -> Vec<(String, ColumnValue)> {
        self.entries
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_preserves_order_and_lookup() {
        let mut row = ExtractedRow::with_capacity(2);
        row.push("B", ColumnValue::Int32(1));
        row.push("A", ColumnValue::Null);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(row.get("A"), Some(&ColumnValue::Null));
        assert!(row.get("a").is_none());
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn display_forms() {
        assert_eq!(ColumnValue::Null.to_string(), "NULL");
        assert_eq!(ColumnValue::from("x").to_string(), "\"x\"");
        assert_eq!(
            ColumnValue::Level(LogLevel::Warning).to_string(),
            "Warning (3)"
        );
    }

    #[test]
    fn option_conversion() {
        assert_eq!(ColumnValue::from(None::<String>), ColumnValue::Null);
        assert_eq!(ColumnValue::from(Some("a")), ColumnValue::Text("a".into()));
    }
}
