//! The log event record.

use chrono::{DateTime, FixedOffset, Utc};

use crate::level::LogLevel;
use crate::property::PropertyValue;
use crate::template::MessageTemplate;

/// A structured log event.
///
/// Events are produced by the host pipeline and are read-only to the sinks:
/// everything after construction takes `&LogEvent`.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    timestamp: DateTime<FixedOffset>,
    level: LogLevel,
    template: MessageTemplate,
    exception: Option<String>,
    properties: Vec<(String, PropertyValue)>,
}

impl LogEvent {
    /// Create an event with no properties and no exception.
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        level: LogLevel,
        template: impl Into<MessageTemplate>,
    ) -> Self {
        Self {
            timestamp,
            level,
            template: template.into(),
            exception: None,
            properties: Vec::new(),
        }
    }

    /// Create an event stamped with the current UTC time.
    pub fn now(level: LogLevel, template: impl Into<MessageTemplate>) -> Self {
        Self::new(Utc::now().fixed_offset(), level, template)
    }

    /// Attach a property, replacing any existing property with the same name.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
        self
    }

    /// Attach an exception description.
    #[must_use]
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Event time with its original offset.
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Severity.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The message template.
    pub fn template(&self) -> &MessageTemplate {
        &self.template
    }

    /// The exception description, if any.
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> &[(String, PropertyValue)] {
        &self.properties
    }

    /// Look up a property by exact name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Look up a property by name, ignoring case (see [`fold_name`]).
    pub fn property_ignore_case(&self, name: &str) -> Option<&PropertyValue> {
        let wanted = fold_name(name);
        self.properties
            .iter()
            .find(|(n, _)| fold_name(n) == wanted)
            .map(|(_, v)| v)
    }

    /// Render the message template against this event's properties.
    pub fn render_message(&self) -> String {
        self.template.render(&self.properties)
    }

    /// A copy of this event keeping only the properties `keep` accepts.
    #[must_use]
    pub fn retain_properties(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        Self {
            properties: self
                .properties
                .iter()
                .filter(|(name, _)| keep(name))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

/// Case-folded form of a property or column name.
///
/// Every case-insensitive name comparison goes through this, so a column and
/// a property that match here match everywhere.
pub fn fold_name(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).collect()
}

/// Whether two names are equal ignoring case.
pub fn names_equal(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
