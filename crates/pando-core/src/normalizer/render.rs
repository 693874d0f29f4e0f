//! Human-readable rendering of structured values.
//!
//! Used when a structured line carries no `level`/`message`, and for
//! non-string payload fragments. The output is a single line in an
//! inspect-like shape with object keys sorted:
//! `{ nested: { n: 1 }, tags: [ 'a', 'b' ], user: 'alice' }`.

use serde_json::Value;

/// Objects and arrays nested deeper than this are elided.
pub const MAX_DEPTH: usize = 25;

/// Render a value for display. Top-level strings are returned verbatim.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => {
            let mut out = String::new();
            write_value(&mut out, other, 0);
            out
        }
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_quoted(out, s),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(_) if depth >= MAX_DEPTH => out.push_str("[Array]"),
        Value::Array(items) => {
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, depth + 1);
            }
            out.push_str(" ]");
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(_) if depth >= MAX_DEPTH => out.push_str("[Object]"),
        Value::Object(map) => {
            // Sorted so the rendering does not depend on map ordering features.
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push_str("{ ");
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    write_quoted(out, key);
                }
                out.push_str(": ");
                write_value(out, item, depth + 1);
            }
            out.push_str(" }");
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('\'');
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
