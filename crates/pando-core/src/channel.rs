//! Channel identity: hierarchical channel names and their two spellings.
//!
//! A channel is an ordered list of segments. It has a storage form
//! (`service/worker`, used as the subscription key) and a display form
//! (`service:worker`, what humans type and read). Parsing accepts either
//! delimiter, so the two forms always normalise to the same segments.
//!
//! Subscription channels may carry a trailing severity qualifier
//! (`service:worker:error`). Stripping it is a separate pure step from
//! splitting segments: see [`split_segments`] and [`strip_severity_suffix`].

use crate::severity::Severity;

/// Segment that matches "this segment and everything below it" in final
/// position, or exactly one segment elsewhere.
pub const WILDCARD: &str = "*";
/// Delimiter of the storage form returned by [`ChannelId::canonical_id`].
pub const STORAGE_DELIMITER: char = '/';
/// Delimiter of the display form returned by [`ChannelId::display_name`].
pub const DISPLAY_DELIMITER: char = ':';

/// Split a raw channel string on either delimiter, trimming whitespace and
/// dropping empty segments.
pub fn split_segments(raw: &str) -> Vec<String> {
    raw.split([STORAGE_DELIMITER, DISPLAY_DELIMITER])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove one trailing severity qualifier, returning it alongside the
/// remaining segments.
pub fn strip_severity_suffix(mut segments: Vec<String>) -> (Vec<String>, Option<Severity>) {
    match segments.last() {
        Some(last) if Severity::is_token(last) => {
            let severity = Severity::resolve(last, Severity::Debug);
            segments.pop();
            (segments, Some(severity))
        }
        _ => (segments, None),
    }
}

/// Remove every trailing severity qualifier (`a:b:error:debug` → `a:b`).
pub fn strip_all_severity_suffixes(mut segments: Vec<String>) -> Vec<String> {
    while segments.last().is_some_and(|s| Severity::is_token(s)) {
        segments.pop();
    }
    segments
}

/// A parsed channel identifier. Never empty: an identifier with no segments
/// becomes the root wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId {
    segments: Vec<String>,
}

impl ChannelId {
    /// Build an identifier from segments, re-splitting any that contain a
    /// delimiter.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .flat_map(|s| split_segments(s.as_ref()))
            .collect();
        Self::from_split(segments)
    }

    fn from_split(segments: Vec<String>) -> Self {
        if segments.is_empty() {
            Self { segments: vec![WILDCARD.to_string()] }
        } else {
            Self { segments }
        }
    }

    /// The root wildcard `*`, matching every channel.
    pub fn root() -> Self {
        Self::from_split(Vec::new())
    }

    /// Parse a subscription-style channel: split, then strip one trailing
    /// severity qualifier.
    pub fn parse(raw: &str) -> (Self, Option<Severity>) {
        let (segments, severity) = strip_severity_suffix(split_segments(raw));
        (Self::from_split(segments), severity)
    }

    /// Parse the channel an event was published on. No qualifier is
    /// stripped; `None` when the string holds no segments at all.
    pub fn route(raw: &str) -> Option<Self> {
        let segments = split_segments(raw);
        (!segments.is_empty()).then_some(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Storage form, e.g. `service/worker`.
    pub fn canonical_id(&self) -> String {
        self.segments.join(&STORAGE_DELIMITER.to_string())
    }

    /// Display form, e.g. `service:worker`.
    pub fn display_name(&self) -> String {
        self.segments.join(&DISPLAY_DELIMITER.to_string())
    }

    /// True when the final segment is the wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.segments.last().is_some_and(|s| s == WILDCARD)
    }

    /// Number of segments that are not wildcards.
    pub fn literal_len(&self) -> usize {
        self.segments.iter().filter(|s| *s != WILDCARD).count()
    }

    /// A single-segment root name denotes its whole subtree, so `service`
    /// becomes `service:*`. Multi-segment names are leaves and are returned
    /// unchanged, as are identifiers already ending in `*`.
    pub fn append_wildcard(mut self) -> Self {
        if self.segments.len() == 1 && !self.is_wildcard() {
            self.segments.push(WILDCARD.to_string());
        }
        self
    }

    /// Whether `self`, read as a pattern, covers `channel`.
    ///
    /// A final `*` matches zero or more trailing segments; a `*` anywhere
    /// else matches exactly one segment; every other segment must be equal.
    pub fn matches(&self, channel: &ChannelId) -> bool {
        let segment_matches = |(p, c): (&String, &String)| p == WILDCARD || p == c;
        match self.segments.split_last() {
            Some((last, stem)) if last == WILDCARD => {
                channel.segments.len() >= stem.len()
                    && stem.iter().zip(&channel.segments).all(segment_matches)
            }
            _ => {
                self.segments.len() == channel.segments.len()
                    && self.segments.iter().zip(&channel.segments).all(segment_matches)
            }
        }
    }

    /// Length of the leading run of literal segments that equals the start
    /// of `channel`. `a:*` against `a:b` is 1, `*:b` against `a:b` is 0.
    pub fn literal_prefix_len(&self, channel: &ChannelId) -> usize {
        self.segments
            .iter()
            .zip(&channel.segments)
            .take_while(|(p, c)| p.as_str() != WILDCARD && p == c)
            .count()
    }

    /// True if this pattern is wildcard-free and equal to `channel`.
    pub fn is_exact_for(&self, channel: &ChannelId) -> bool {
        self.literal_len() == self.len() && self == channel
    }

    /// True if `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &ChannelId) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments.iter().zip(&prefix.segments).all(|(a, b)| a == b)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
