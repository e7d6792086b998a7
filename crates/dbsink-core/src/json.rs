//! JSON rendering of whole events.
//!
//! Shape:
//!
//! ```text
//! {"TimeStamp":"2024-01-15T12:00:00+08:00","Level":"Information",
//!  "Message":"...","MessageTemplate":"...","Exception":"...",
//!  "Properties":{"Name":"Roc"}}
//! ```
//!
//! `Exception` and `Properties` are omitted when empty.

use chrono::SecondsFormat;
use serde_json::{Map, Value};

use crate::event::LogEvent;

/// Build the JSON document for an event.
pub fn event_to_json(event: &LogEvent) -> Value {
    let mut doc = Map::new();
    let _ = doc.insert(
        "TimeStamp".into(),
        Value::String(
            event
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::AutoSi, false),
        ),
    );
    let _ = doc.insert("Level".into(), Value::String(event.level().to_string()));
    let _ = doc.insert("Message".into(), Value::String(event.render_message()));
    let _ = doc.insert(
        "MessageTemplate".into(),
        Value::String(event.template().text().to_string()),
    );
    if let Some(exception) = event.exception() {
        let _ = doc.insert("Exception".into(), Value::String(exception.to_string()));
    }
    if !event.properties().is_empty() {
        let mut props = Map::new();
        for (name, value) in event.properties() {
            let _ = props.insert(name.clone(), value.to_json());
        }
        let _ = doc.insert("Properties".into(), Value::Object(props));
    }
    Value::Object(doc)
}

/// Serialize an event to a compact JSON string.
pub fn format_event(event: &LogEvent) -> String {
    event_to_json(event).to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogLevel, PropertyValue};
    use chrono::DateTime;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-15T12:00:00+00:00").unwrap()
    }

    #[test]
    fn minimal_event_shape() {
        let e = LogEvent::new(ts(), LogLevel::Warning, "plain");
        let json = event_to_json(&e);
        assert_eq!(json["Level"], "Warning");
        assert_eq!(json["Message"], "plain");
        assert_eq!(json["MessageTemplate"], "plain");
        assert_eq!(json["TimeStamp"], "2024-01-15T12:00:00+00:00");
        assert!(json.get("Exception").is_none());
        assert!(json.get("Properties").is_none());
    }

    #[test]
    fn properties_and_exception_included() {
        let e = LogEvent::new(ts(), LogLevel::Error, "Failed {Op}")
            .with_property("Op", "sync")
            .with_property("Tags", PropertyValue::from(vec!["a", "b"]))
            .with_exception("io error");
        let json = event_to_json(&e);
        assert_eq!(json["Message"], "Failed \"sync\"");
        assert_eq!(json["Exception"], "io error");
        assert_eq!(json["Properties"]["Op"], "sync");
        assert_eq!(json["Properties"]["Tags"][1], "b");
    }

    #[test]
    fn format_event_is_valid_json() {
        let e = LogEvent::new(ts(), LogLevel::Debug, "x").with_property("N", 1);
        let text = format_event(&e);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["Properties"]["N"], 1);
    }
}
