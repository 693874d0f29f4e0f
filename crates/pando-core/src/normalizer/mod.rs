//! Normalizer: reduces free-text log lines to a canonical (severity, message) row.
//!
//! Parsing is attempted in order, first match wins:
//!
//! 1. structured JSON object with `level` and/or `message`
//! 2. the [`RecognizerChain`] of third-party line shapes
//! 3. fallback: severity `info`, message verbatim
//!
//! A JSON object without either field is replaced by a rendering of the
//! whole object. A JSON object with a `message` but no `level` still goes
//! through the recognizer chain, so a wrapped `"ERROR: boom"` message is
//! classified.

pub mod recognizers;
pub mod render;

use crate::severity::Severity;
use serde::Serialize;
use serde_json::Value;

pub use render::render_value;

/// Severity used when nothing in the line names one.
pub const DEFAULT_SEVERITY: Severity = Severity::Info;

/// Upper bound on how many times one recognizer re-applies to its own output.
const MAX_PEEL: usize = 8;

/// One normalised output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub severity: Severity,
    pub message: String,
}

impl Row {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }
}

/// Signature shared by every recognizer.
pub type RecognizeFn = fn(&str) -> Option<Row>;

/// A named, pure line-shape recognizer.
#[derive(Clone, Copy)]
pub struct Recognizer {
    pub name: &'static str,
    recognize: RecognizeFn,
}

impl Recognizer {
    pub const fn new(name: &'static str, recognize: RecognizeFn) -> Self {
        Self { name, recognize }
    }

    pub fn recognize(&self, line: &str) -> Option<Row> {
        (self.recognize)(line)
    }
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Recognizer").field(&self.name).finish()
    }
}

/// Ordered list of recognizers. Earlier entries take priority.
#[derive(Debug, Clone)]
pub struct RecognizerChain {
    recognizers: Vec<Recognizer>,
}

impl Default for RecognizerChain {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RecognizerChain {
    /// The built-in chain, see [`recognizers::builtin`].
    pub fn builtin() -> Self {
        Self { recognizers: recognizers::builtin() }
    }

    pub fn empty() -> Self {
        Self { recognizers: Vec::new() }
    }

    /// Append a recognizer at the lowest priority.
    pub fn push(&mut self, recognizer: Recognizer) -> &mut Self {
        self.recognizers.push(recognizer);
        self
    }

    /// Remove a recognizer by name. Returns `true` if one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.recognizers.len();
        self.recognizers.retain(|r| r.name != name);
        self.recognizers.len() != before
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.recognizers.iter().map(|r| r.name)
    }

    /// Run the chain. The first recognizer that claims the line wins, then
    /// keeps re-applying to its own message while it still matches, so a
    /// repeated prefix resolves to its last capture.
    pub fn recognize(&self, line: &str) -> Option<(&'static str, Row)> {
        self.recognizers.iter().find_map(|r| {
            let mut row = r.recognize(line)?;
            for _ in 0..MAX_PEEL {
                match r.recognize(&row.message) {
                    Some(inner) => row = inner,
                    None => break,
                }
            }
            Some((r.name, row))
        })
    }
}

/// Result of looking at a line as a JSON object.
struct Structured {
    severity: Option<Severity>,
    message: String,
}

/// Line normalizer with a configurable recognizer chain.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    chain: RecognizerChain,
}

impl Normalizer {
    pub fn new(chain: RecognizerChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &RecognizerChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut RecognizerChain {
        &mut self.chain
    }

    /// Normalise a block of text into independent rows.
    ///
    /// If the whole block is one JSON object (possibly pretty-printed across
    /// several lines) it is normalised as a unit and its message is split
    /// into rows. Otherwise every physical line is normalised on its own,
    /// and a structured message spanning lines is split the same way. Blank
    /// rows are dropped, so no row message contains a newline.
    pub fn normalize(&self, text: &str) -> Vec<Row> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if let Some(structured) = parse_structured(trimmed) {
            return self.split_structured(structured);
        }
        physical_lines(text)
            .flat_map(|line| match parse_structured(line.trim()) {
                Some(structured) => self.split_structured(structured),
                None => vec![self.finish(None, line)],
            })
            .collect()
    }

    /// Normalise one physical line into exactly one row.
    pub fn normalize_line(&self, line: &str) -> Row {
        match parse_structured(line.trim()) {
            Some(structured) => self.finish(structured.severity, &structured.message),
            None => self.finish(None, line),
        }
    }

    fn split_structured(&self, structured: Structured) -> Vec<Row> {
        physical_lines(&structured.message)
            .map(|line| self.finish(structured.severity, line))
            .collect()
    }

    fn finish(&self, severity: Option<Severity>, message: &str) -> Row {
        if let Some(severity) = severity {
            return Row::new(severity, message);
        }
        match self.chain.recognize(message) {
            Some((_, row)) => row,
            None => Row::new(DEFAULT_SEVERITY, message),
        }
    }
}

fn physical_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}

fn parse_structured(trimmed: &str) -> Option<Structured> {
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return None;
    };
    let level = map.get("level").filter(|v| is_present(v));
    let message = map.get("message").filter(|v| is_present(v));
    if level.is_none() && message.is_none() {
        return Some(Structured {
            severity: None,
            message: render_value(&Value::Object(map)),
        });
    }
    Some(Structured {
        severity: level.map(|v| Severity::resolve_value(v, DEFAULT_SEVERITY)),
        message: match message {
            Some(m) => render_value(m),
            None => trimmed.to_string(),
        },
    })
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
