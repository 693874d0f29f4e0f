//! Built-in recognizers for third-party log line shapes.
//!
//! Each recognizer is a pure function from one line of text to an optional
//! [`Row`]. A recognizer only claims a line when the captured level word is a
//! severity an event can carry, so ordinary prose such as `Note: restart
//! pending` or `None: of the replicas responded` falls through to the next
//! recognizer. logfmt claims any severity word after `level=`; threshold-only
//! words such as `none` are read as `info`.

use super::{Recognizer, Row};
use crate::severity::Severity;
use regex::Regex;
use std::sync::LazyLock;

/// Every built-in recognizer, in priority order.
pub fn builtin() -> Vec<Recognizer> {
    vec![
        Recognizer::new("bracketed_timestamp", bracketed_timestamp),
        Recognizer::new("env_logger", env_logger),
        Recognizer::new("tracing_fmt", tracing_fmt),
        Recognizer::new("timestamp_level", timestamp_level),
        Recognizer::new("nginx_error", nginx_error),
        Recognizer::new("logback", logback),
        Recognizer::new("logfmt", logfmt),
        Recognizer::new("level_prefix", level_prefix),
    ]
}

// ISO-8601-ish date and time, with optional fraction and zone.
const ISO_TS: &str =
    r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?";

static ENV_LOGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\[{ISO_TS}\s+(?P<level>[A-Za-z]+)\s+[^\]\s]+\]\s?(?P<msg>.*)$"
    ))
    .expect("static regex")
});

static BRACKETED_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\[{ISO_TS}\]\s*(?:\[(?P<blevel>[A-Za-z]+)\]|(?P<level>[A-Za-z]+)):?\s+(?P<msg>.*)$"
    ))
    .expect("static regex")
});

static TRACING_FMT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\d{{4}}-\d{{2}}-\d{{2}}T\d{{2}}:\d{{2}}:\d{{2}}(?:\.\d+)?(?:Z|[+-]\d{{2}}:\d{{2}})\s+(?P<level>TRACE|DEBUG|INFO|WARN|ERROR)\s+[A-Za-z_][\w:]*(?:\{{[^}}]*\}})*:\s(?P<msg>.*)$"
    ))
    .expect("static regex")
});

static TIMESTAMP_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^{ISO_TS}\s+(?:\[(?P<blevel>[A-Za-z]+)\]|(?P<level>[A-Za-z]+)):?\s+(?P<msg>.*)$"
    ))
    .expect("static regex")
});

static NGINX_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2} \[(?P<level>[a-z]+)\] (?:\d+#\d+: )?(?:\*\d+ )?(?P<msg>.*)$",
    )
    .expect("static regex")
});

static LOGBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\d{4}-\d{2}-\d{2}[ T])?\d{2}:\d{2}:\d{2}[.,]\d{3}\s+\[[^\]]+\]\s+(?P<level>[A-Za-z]+)\s+(?P<msg>.*)$",
    )
    .expect("static regex")
});

static LOGFMT_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:level|lvl|severity)=(?P<level>"[^"]*"|\S+)"#).expect("static regex")
});

static LOGFMT_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:msg|message)=(?P<msg>"(?:[^"\\]|\\.)*"|\S+)"#).expect("static regex")
});

static LEVEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[(?P<blevel>[A-Za-z]+)\]\s*:?|(?P<level>[A-Za-z]+)\s*:)\s*(?P<msg>.*)$")
        .expect("static regex")
});

/// `[2024-01-15T10:00:00Z INFO  my_crate] message`
pub fn env_logger(line: &str) -> Option<Row> {
    level_and_message(&ENV_LOGGER, line)
}

/// `[2024-01-15T10:00:03Z] WARN: message` or `[…] [warn] message`
pub fn bracketed_timestamp(line: &str) -> Option<Row> {
    level_and_message(&BRACKETED_TIMESTAMP, line)
}

/// `2024-01-15T10:00:00.123456Z  INFO my_crate::db: message`
pub fn tracing_fmt(line: &str) -> Option<Row> {
    level_and_message(&TRACING_FMT, line)
}

/// `2024-01-15 10:00:00 ERROR message`
pub fn timestamp_level(line: &str) -> Option<Row> {
    level_and_message(&TIMESTAMP_LEVEL, line)
}

/// `2024/01/15 10:00:00 [error] 1234#0: *1 message`
pub fn nginx_error(line: &str) -> Option<Row> {
    level_and_message(&NGINX_ERROR, line)
}

/// `10:00:05.123 [main] DEBUG o.s.Foo - message`
pub fn logback(line: &str) -> Option<Row> {
    level_and_message(&LOGBACK, line)
}

/// `time=… level=warn msg="quoted text"`.
///
/// When a key repeats, the last occurrence wins.
pub fn logfmt(line: &str) -> Option<Row> {
    let level = LOGFMT_LEVEL
        .captures_iter(line)
        .last()
        .and_then(|c| c.name("level"))
        .map(|m| unquote(m.as_str()))?;
    if !Severity::is_token(&level) {
        return None;
    }
    let message = LOGFMT_MESSAGE
        .captures_iter(line)
        .last()
        .and_then(|c| c.name("msg"))
        .map(|m| unquote(m.as_str()))
        .unwrap_or_else(|| line.trim().to_string());
    Some(Row {
        severity: Severity::resolve_event(&level, Severity::Info),
        message,
    })
}

/// `ERROR: message` or `[warn] message`
pub fn level_prefix(line: &str) -> Option<Row> {
    level_and_message(&LEVEL_PREFIX, line)
}

fn level_and_message(pattern: &Regex, line: &str) -> Option<Row> {
    let caps = pattern.captures(line.trim())?;
    let level = caps.name("level").or_else(|| caps.name("blevel"))?.as_str();
    if !Severity::is_event_token(level) {
        return None;
    }
    Some(Row {
        severity: Severity::resolve_event(level, Severity::Info),
        message: caps.name("msg").map_or("", |m| m.as_str()).trim_end().to_string(),
    })
}

/// Strip surrounding double quotes and undo `\"` / `\\` escapes.
fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
