//! Severity registry: the canonical syslog-style scale and token resolution.
//!
//! Every severity token that enters the hub (a JSON `level` field, a word
//! captured by a recognizer, a trailing channel segment, an observer's
//! subscribe request) is reduced to a [`Severity`] here. Resolution never
//! fails: unknown tokens fall back to a caller-supplied default.
//!
//! Matching order for [`Severity::resolve`]:
//!
//! 1. numeric rank (`"3"` → `error`)
//! 2. alias table (`"warn"` → `warning`, `"fatal"` → `crit`, …)
//! 3. canonical name (`"notice"`)
//! 4. the default

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches ANSI SGR colour escapes so coloured level tokens (e.g. from a
/// producer that pipes an already-coloured terminal log) still resolve.
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));

/// Log severity, ordered from most to least severe.
///
/// `None` is a threshold-only sentinel: it ranks below every real severity
/// and a subscription with a `None` threshold passes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Emerg,
    Alert,
    Crit,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
    None,
}

/// Every real severity in rank order (excludes the `None` sentinel).
pub const ALL: [Severity; 8] = [
    Severity::Emerg,
    Severity::Alert,
    Severity::Crit,
    Severity::Error,
    Severity::Warning,
    Severity::Notice,
    Severity::Info,
    Severity::Debug,
];

const ALIASES: &[(&str, Severity)] = &[
    ("emergency", Severity::Emerg),
    ("panic", Severity::Emerg),
    ("fatal", Severity::Crit),
    ("critical", Severity::Crit),
    ("err", Severity::Error),
    ("warn", Severity::Warning),
    ("wrn", Severity::Warning),
    ("inf", Severity::Info),
    ("information", Severity::Info),
    ("informational", Severity::Info),
    ("dbg", Severity::Debug),
    ("trace", Severity::Debug),
    ("verbose", Severity::Debug),
    ("silly", Severity::Debug),
    ("off", Severity::None),
    ("silent", Severity::None),
];

impl Severity {
    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Emerg => "emerg",
            Severity::Alert => "alert",
            Severity::Crit => "crit",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::None => "none",
        }
    }

    /// Integer rank; lower is more severe. `None` ranks 8.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Severity::rank`]. Returns `None` for ranks above 8.
    pub fn from_rank(rank: u8) -> Option<Severity> {
        match rank {
            0..=7 => Some(ALL[rank as usize]),
            8 => Some(Severity::None),
            _ => None,
        }
    }

    /// Exact canonical name lookup (already normalised input).
    fn from_name(name: &str) -> Option<Severity> {
        ALL.iter()
            .copied()
            .chain(std::iter::once(Severity::None))
            .find(|s| s.name() == name)
    }

    /// Resolve any textual token to a severity, falling back to `default`.
    pub fn resolve(token: &str, default: Severity) -> Severity {
        lookup(&clean_token(token)).unwrap_or(default)
    }

    /// Resolve the level word of an event. `none` and its aliases are
    /// thresholds only, so on an event they count as unknown and yield
    /// `default`.
    pub fn resolve_event(token: &str, default: Severity) -> Severity {
        match lookup(&clean_token(token)) {
            Some(Severity::None) | None => default,
            Some(severity) => severity,
        }
    }

    /// True if `token` names a severity an event can carry.
    pub fn is_event_token(token: &str) -> bool {
        lookup(&clean_token(token)).is_some_and(|s| s != Severity::None)
    }

    /// Resolve a JSON event level: strings go through [`Severity::resolve_event`],
    /// integral numbers are treated as ranks, anything else is `default`.
    pub fn resolve_value(value: &serde_json::Value, default: Severity) -> Severity {
        match value {
            serde_json::Value::String(s) => Severity::resolve_event(s, default),
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|r| u8::try_from(r).ok())
                .filter(|r| *r <= 7)
                .and_then(Severity::from_rank)
                .unwrap_or(default),
            _ => default,
        }
    }

    /// True if `token` names a severity by rank, alias, or canonical name.
    ///
    /// The wildcard `*` is never a severity token.
    pub fn is_token(token: &str) -> bool {
        lookup(&clean_token(token)).is_some()
    }

    /// Whether an event at `self` passes a subscription threshold.
    pub fn passes(self, threshold: Severity) -> bool {
        is_passable(self, threshold)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::Error;

    /// Strict parse used for configuration values; unlike
    /// [`Severity::resolve`] this rejects unknown tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&clean_token(s)).ok_or_else(|| crate::Error::UnknownSeverity(s.to_string()))
    }
}

/// `rank(event) <= rank(threshold)`, and never true for a `None` threshold.
pub fn is_passable(event: Severity, threshold: Severity) -> bool {
    threshold != Severity::None && event.rank() <= threshold.rank()
}

/// Canonical name for a rank, if the rank is valid.
pub fn name_of(rank: u8) -> Option<&'static str> {
    Severity::from_rank(rank).map(Severity::name)
}

fn clean_token(token: &str) -> String {
    ANSI_ESCAPE
        .replace_all(token, "")
        .trim()
        .to_ascii_lowercase()
}

fn lookup(token: &str) -> Option<Severity> {
    if token.is_empty() || token == "*" {
        return None;
    }
    if let Ok(rank) = token.parse::<u8>() {
        return if rank <= 7 { Severity::from_rank(rank) } else { None };
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, s)| *s)
        .or_else(|| Severity::from_name(token))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
