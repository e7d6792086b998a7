//! Event property values.
//!
//! A property bag holds arbitrary value shapes. Rather than probing runtime
//! types, every value is one of four tagged shapes and consumers match on the
//! tag:
//!
//! - [`PropertyValue::Scalar`]: a single [`ScalarValue`]
//! - [`PropertyValue::Sequence`]: an ordered list of values
//! - [`PropertyValue::Structure`]: named fields with an optional type tag
//! - [`PropertyValue::Dictionary`]: scalar keys mapped to values
//!
//! The `Display` impls produce the default string rendering used whenever a
//! value has to land in a text column: top-level scalars render bare, scalars
//! nested inside containers render quoted.

use std::fmt::{self, Write as _};

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::Value;

/// A single primitive value.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Point in time with its original offset.
    DateTime(DateTime<FixedOffset>),
}

impl ScalarValue {
    /// Whether this is [`ScalarValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Write the value with text double-quoted (the nested rendering).
    pub fn write_quoted(&self, out: &mut impl fmt::Write) -> fmt::Result {
        match self {
            Self::Text(s) => {
                out.write_char('"')?;
                for c in s.chars() {
                    match c {
                        '"' => out.write_str("\\\"")?,
                        '\\' => out.write_str("\\\\")?,
                        c => out.write_char(c)?,
                    }
                }
                out.write_char('"')
            }
            other => write!(out, "{other}"),
        }
    }

    /// Render with text double-quoted.
    #[must_use]
    pub fn to_quoted_string(&self) -> String {
        let mut s = String::new();
        let _ = self.write_quoted(&mut s);
        s
    }

    /// JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        }
    }
}

/// A property value of any shape.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// A primitive.
    Scalar(ScalarValue),
    /// An ordered list.
    Sequence(Vec<PropertyValue>),
    /// Named fields, optionally tagged with a type name.
    Structure {
        /// Type name of the captured object, if known.
        type_tag: Option<String>,
        /// Fields in capture order.
        fields: Vec<(String, PropertyValue)>,
    },
    /// Scalar keys mapped to values, in insertion order.
    Dictionary(Vec<(ScalarValue, PropertyValue)>),
}

impl PropertyValue {
    /// Shorthand for a null scalar.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(ScalarValue::Null)
    }

    /// Build a structure value.
    pub fn structure<I, K>(type_tag: Option<&str>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        Self::Structure {
            type_tag: type_tag.map(str::to_string),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The scalar inside, if this is a scalar.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// JSON representation. Structures carry their tag as `_typeTag`;
    /// dictionary keys use their bare rendering.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(s) => s.to_json(),
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Structure { type_tag, fields } => {
                let mut map = serde_json::Map::new();
                for (name, value) in fields {
                    let _ = map.insert(name.clone(), value.to_json());
                }
                if let Some(tag) = type_tag {
                    let _ = map.insert("_typeTag".to_string(), Value::String(tag.clone()));
                }
                Value::Object(map)
            }
            Self::Dictionary(entries) => {
                let mut map = serde_json::Map::new();
                for (key, value) in entries {
                    let _ = map.insert(key.to_string(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }

    fn write_nested(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => s.write_quoted(out),
            other => write!(out, "{other}"),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Sequence(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_nested(f)?;
                }
                f.write_char(']')
            }
            Self::Structure { type_tag, fields } => {
                if let Some(tag) = type_tag {
                    write!(f, "{tag} ")?;
                }
                f.write_str("{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: ")?;
                    value.write_nested(f)?;
                }
                f.write_str(" }")
            }
            Self::Dictionary(entries) => {
                f.write_char('[')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_char('(')?;
                    key.write_quoted(f)?;
                    f.write_str(": ")?;
                    value.write_nested(f)?;
                    f.write_char(')')?;
                }
                f.write_char(']')
            }
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────────────

impl From<ScalarValue> for PropertyValue {
    fn from(value: ScalarValue) -> Self {
        Self::Scalar(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Scalar(ScalarValue::Bool(value))
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Scalar(ScalarValue::Int(i64::from(value)))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Scalar(ScalarValue::Int(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Scalar(ScalarValue::Int(i64::from(value)))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Scalar(ScalarValue::Float(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Scalar(ScalarValue::Text(value.to_string()))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Scalar(ScalarValue::Text(value))
    }
}

impl From<DateTime<FixedOffset>> for PropertyValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Scalar(ScalarValue::DateTime(value))
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Into::into)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(value: Vec<T>) -> Self {
        Self::Sequence(value.into_iter().map(Into::into).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
