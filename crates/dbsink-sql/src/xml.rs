//! XML rendering of an event's property bag.
//!
//! ```text
//! <properties><property key='Name'>Roc</property><property key='Tags'><sequence><item>a</item></sequence></property></properties>
//! ```
//!
//! Element names come from [`PropertiesColumnOptions`]. Text and attribute
//! values are escaped; property keys used as element names are sanitized.

use std::fmt::Write as _;

use dbsink_core::{PropertyValue, ScalarValue};
use tracing::warn;

use crate::schema::{PropertiesColumnOptions, Schema};

/// Render the `Properties` column value for one event.
pub fn format_properties(schema: &Schema, properties: &[(String, PropertyValue)]) -> String {
    let opts = schema.properties_options();

    let candidates: Vec<&(String, PropertyValue)> = properties
        .iter()
        .filter(|(key, _)| {
            !(opts.exclude_additional_properties && schema.is_additional_column(key))
        })
        .collect();
    let selected = apply_filter(opts, candidates);

    let mut out = String::new();
    let _ = write!(out, "<{}>", opts.root_element_name);
    for (key, value) in selected {
        let rendered = simplify(value, opts);
        if opts.omit_element_if_empty && rendered.is_empty() {
            continue;
        }
        write_keyed(&mut out, opts, &opts.property_element_name, key, &rendered);
    }
    let _ = write!(out, "</{}>", opts.root_element_name);
    out
}

fn apply_filter<'a>(
    opts: &PropertiesColumnOptions,
    candidates: Vec<&'a (String, PropertyValue)>,
) -> Vec<&'a (String, PropertyValue)> {
    let Some(filter) = &opts.filter else {
        return candidates;
    };
    let mut kept = Vec::with_capacity(candidates.len());
    for entry in &candidates {
        match filter.check(&entry.0) {
            Ok(true) => kept.push(*entry),
            Ok(false) => {}
            Err(error) => {
                warn!(key = %entry.0, %error, "property filter failed, storing unfiltered properties");
                return candidates;
            }
        }
    }
    kept
}

/// Render one value as XML content (no enclosing property element).
pub fn simplify(value: &PropertyValue, opts: &PropertiesColumnOptions) -> String {
    match value {
        PropertyValue::Scalar(ScalarValue::Null) => String::new(),
        PropertyValue::Scalar(scalar) => escape(&scalar.to_string()),
        PropertyValue::Sequence(items) => {
            let mut body = String::new();
            for item in items {
                let rendered = simplify(item, opts);
                if opts.omit_element_if_empty && rendered.is_empty() {
                    continue;
                }
                let _ = write!(body, "<{0}>{rendered}</{0}>", opts.item_element_name);
            }
            wrap(&opts.sequence_element_name, "", &body, opts)
        }
        PropertyValue::Structure { type_tag, fields } => {
            let mut body = String::new();
            for (key, field) in fields {
                let rendered = simplify(field, opts);
                if opts.omit_element_if_empty && rendered.is_empty() {
                    continue;
                }
                write_keyed(&mut body, opts, &opts.property_element_name, key, &rendered);
            }
            let attrs = type_tag
                .as_deref()
                .map(|t| format!(" type='{}'", escape(t)))
                .unwrap_or_default();
            wrap(&opts.structure_element_name, &attrs, &body, opts)
        }
        PropertyValue::Dictionary(entries) => {
            let mut body = String::new();
            for (key, entry) in entries {
                let rendered = simplify(entry, opts);
                if opts.omit_element_if_empty && rendered.is_empty() {
                    continue;
                }
                let _ = write!(
                    body,
                    "<{0} key='{1}'>{rendered}</{0}>",
                    opts.item_element_name,
                    escape(&key.to_string())
                );
            }
            wrap(&opts.dictionary_element_name, "", &body, opts)
        }
    }
}

fn wrap(element: &str, attrs: &str, body: &str, opts: &PropertiesColumnOptions) -> String {
    if body.is_empty() && opts.omit_element_if_empty {
        return String::new();
    }
    format!("<{element}{attrs}>{body}</{element}>")
}

fn write_keyed(
    out: &mut String,
    opts: &PropertiesColumnOptions,
    element: &str,
    key: &str,
    rendered: &str,
) {
    let _ = if opts.use_property_key_as_element_name {
        let name = sanitize_element_name(key);
        write!(out, "<{name}>{rendered}</{name}>")
    } else {
        write!(out, "<{element} key='{}'>{rendered}</{element}>", escape(key))
    };
}

/// Escape text for element content or a single-quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Turn an arbitrary key into a valid XML element name.
///
/// Leading characters that cannot start a name get an `x` prefix; anything
/// outside letters, digits, `_`, `-` and `.` becomes `_`.
pub fn sanitize_element_name(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "x".into();
    }
    let mut name = String::with_capacity(key.len() + 1);
    if !key.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.push('x');
    }
    name.extend(key.chars().map(|c| {
        if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
            c
        } else {
            '_'
        }
    }));
    name
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
