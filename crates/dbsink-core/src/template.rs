//! Message templates.
//!
//! A template is text with `{Name}` holes that are filled from the event's
//! properties when the message is rendered. Supported hole syntax:
//!
//! - `{Name}`: plain property; `{@Name}` / `{$Name}` capture hints are accepted
//!   and ignored for lookup
//! - `{Name,10}` / `{Name,-10}`: right / left alignment padding, up to 1024 wide
//! - `{Name:l}`: render text without surrounding quotes
//! - `{{` and `}}`: literal braces
//!
//! A hole whose property is missing renders as its original text. Malformed
//! holes are kept verbatim.

use std::fmt::Write as _;

use crate::property::{PropertyValue, ScalarValue};

/// A parsed message template.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Text(String),
    Property(PropertyToken),
}

#[derive(Clone, Debug, PartialEq)]
struct PropertyToken {
    raw: String,
    name: String,
    alignment: Option<Alignment>,
    format: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Alignment {
    width: usize,
    left: bool,
}

impl MessageTemplate {
    /// Parse template text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            text: text.to_string(),
            tokens: tokenize(text),
        }
    }

    /// The raw, unrendered template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names of the properties referenced by the template, in order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Property(p) => Some(p.name.as_str()),
            Token::Text(_) => None,
        })
    }

    /// Render the template, resolving holes against `properties`.
    #[must_use]
    pub fn render(&self, properties: &[(String, PropertyValue)]) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Property(prop) => {
                    let value = properties
                        .iter()
                        .find(|(name, _)| *name == prop.name)
                        .map(|(_, v)| v);
                    match value {
                        Some(value) => {
                            let rendered = render_value(value, prop.format.as_deref());
                            pad(&mut out, &rendered, prop.alignment);
                        }
                        None => out.push_str(&prop.raw),
                    }
                }
            }
        }
        out
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

fn render_value(value: &PropertyValue, format: Option<&str>) -> String {
    let literal = format.is_some_and(|f| f.contains('l'));
    match value {
        PropertyValue::Scalar(ScalarValue::Text(s)) if literal => s.clone(),
        PropertyValue::Scalar(scalar) => scalar.to_quoted_string(),
        other => other.to_string(),
    }
}

fn pad(out: &mut String, rendered: &str, alignment: Option<Alignment>) {
    let Some(Alignment { width, left }) = alignment else {
        out.push_str(rendered);
        return;
    };
    let _ = if left {
        write!(out, "{rendered:<width$}")
    } else {
        write!(out, "{rendered:>width$}")
    };
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    let _ = chars.next();
                    literal.push('{');
                    continue;
                }
                let Some(end) = text[i + 1..].find('}').map(|e| i + 1 + e) else {
                    literal.push_str(&text[i..]);
                    break;
                };
                let raw = &text[i..=end];
                match parse_hole(raw) {
                    Some(prop) => {
                        if !literal.is_empty() {
                            tokens.push(Token::Text(std::mem::take(&mut literal)));
                        }
                        tokens.push(Token::Property(prop));
                    }
                    None => literal.push_str(raw),
                }
                while chars.peek().is_some_and(|(j, _)| *j <= end) {
                    let _ = chars.next();
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    let _ = chars.next();
                }
                literal.push('}');
            }
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Text(literal));
    }
    tokens
}

/// Parse `{[@$]name[,align][:format]}`.
fn parse_hole(raw: &str) -> Option<PropertyToken> {
    let inner = &raw[1..raw.len() - 1];
    let inner = inner.strip_prefix(['@', '$']).unwrap_or(inner);

    let (head, format) = match inner.split_once(':') {
        Some((head, format)) => (head, Some(format.to_string())),
        None => (inner, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, align)) => (name, Some(parse_alignment(align)?)),
        None => (head, None),
    };

    let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| PropertyToken {
        raw: raw.to_string(),
        name: name.to_string(),
        alignment,
        format,
    })
}

/// Widest accepted alignment; larger widths make the hole plain text.
const MAX_ALIGNMENT: usize = 1024;

fn parse_alignment(spec: &str) -> Option<Alignment> {
    let spec = spec.trim();
    let (left, digits) = match spec.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    let width = digits.parse::<usize>().ok().filter(|w| *w <= MAX_ALIGNMENT)?;
    Some(Alignment { width, left })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, PropertyValue)]) -> Vec<(String, PropertyValue)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn plain_text_renders_unchanged() {
        let t = MessageTemplate::parse("hello world");
        assert_eq!(t.render(&[]), "hello world");
        assert_eq!(t.text(), "hello world");
    }

    #[test]
    fn text_property_is_quoted() {
        let t = MessageTemplate::parse("Hello {Name}");
        let p = props(&[("Name", PropertyValue::from("Roc"))]);
        assert_eq!(t.render(&p), "Hello \"Roc\"");
    }

    #[test]
    fn literal_format_drops_quotes() {
        let t = MessageTemplate::parse("Hello {Name:l}");
        let p = props(&[("Name", PropertyValue::from("Roc"))]);
        assert_eq!(t.render(&p), "Hello Roc");
    }

    #[test]
    fn numbers_render_bare() {
        let t = MessageTemplate::parse("Age {Age}");
        let p = props(&[("Age", PropertyValue::from(30))]);
        assert_eq!(t.render(&p), "Age 30");
    }

    #[test]
    fn capture_hints_are_ignored_for_lookup() {
        let t = MessageTemplate::parse("User {@User} as {$Id}");
        let p = props(&[
            (
                "User",
                PropertyValue::structure(Some("User"), [("Id", PropertyValue::from(1))]),
            ),
            ("Id", PropertyValue::from(7)),
        ]);
        assert_eq!(t.render(&p), "User User { Id: 1 } as 7");
        assert_eq!(t.property_names().collect::<Vec<_>>(), vec!["User", "Id"]);
    }

    #[test]
    fn missing_property_keeps_raw_hole() {
        let t = MessageTemplate::parse("Value {Missing,5:l} end");
        assert_eq!(t.render(&[]), "Value {Missing,5:l} end");
    }

    #[test]
    fn escaped_braces() {
        let t = MessageTemplate::parse("{{literal}} {X}");
        let p = props(&[("X", PropertyValue::from(1))]);
        assert_eq!(t.render(&p), "{literal} 1");
    }

    #[test]
    fn alignment_pads_both_directions() {
        let t = MessageTemplate::parse("[{A,4}][{B,-4}]");
        let p = props(&[("A", PropertyValue::from(1)), ("B", PropertyValue::from(2))]);
        assert_eq!(t.render(&p), "[   1][2   ]");
    }

    #[test]
    fn oversized_alignment_is_text() {
        let t = MessageTemplate::parse("[{A,2000000000}][{B,-1025}][{C,1024}]");
        let p = props(&[
            ("A", PropertyValue::from(1)),
            ("B", PropertyValue::from(2)),
            ("C", PropertyValue::from(3)),
        ]);
        let rendered = t.render(&p);
        assert!(rendered.starts_with("[{A,2000000000}][{B,-1025}]["));
        assert_eq!(rendered.len(), "[{A,2000000000}][{B,-1025}][]".len() + 1024);
        assert_eq!(t.property_names().collect::<Vec<_>>(), vec!["C"]);
    }

    #[test]
    fn unterminated_hole_is_text() {
        let t = MessageTemplate::parse("broken {Name");
        assert_eq!(t.render(&[]), "broken {Name");
        assert_eq!(t.property_names().count(), 0);
    }

    #[test]
    fn invalid_hole_is_text() {
        let t = MessageTemplate::parse("{not valid} {}");
        assert_eq!(t.render(&[]), "{not valid} {}");
    }

    #[test]
    fn positional_hole_matches_numeric_name() {
        let t = MessageTemplate::parse("{0} and {1}");
        let p = props(&[("0", PropertyValue::from("a")), ("1", PropertyValue::from(2))]);
        assert_eq!(t.render(&p), "\"a\" and 2");
    }

    #[test]
    fn multibyte_text_survives() {
        let t = MessageTemplate::parse("北京 {City:l}!");
        let p = props(&[("City", PropertyValue::from("上海"))]);
        assert_eq!(t.render(&p), "北京 上海!");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn brace_free_text_round_trips(s in "[^{}]*") {
                let t = MessageTemplate::parse(&s);
                prop_assert_eq!(t.render(&[]), s);
            }
        }
    }
}
