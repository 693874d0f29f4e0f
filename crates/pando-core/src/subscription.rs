//! Subscription table: the live set of channel patterns and their thresholds.
//!
//! Patterns are unique: subscribing to a pattern that already exists updates
//! its threshold in place and keeps its position. Iteration order is
//! insertion order.

use crate::channel::{split_segments, strip_all_severity_suffixes, ChannelId};
use crate::severity::Severity;
use std::cmp::Ordering;

/// Threshold used when a subscribe request names no severity.
pub const DEFAULT_THRESHOLD: Severity = Severity::Debug;

/// A (pattern, minimum severity) filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub pattern: ChannelId,
    pub threshold: Severity,
}

impl std::fmt::Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.pattern, self.threshold)
    }
}

/// What a call to [`SubscriptionTable::subscribe`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeResult {
    pub subscription: Subscription,
    /// `false` when an existing pattern was updated.
    pub inserted: bool,
}

/// Normalise a subscribe request into a pattern and threshold.
///
/// The trailing severity qualifier is always stripped from the channel. An
/// explicit `severity` wins over the qualifier; with neither the threshold is
/// [`DEFAULT_THRESHOLD`]. Single-segment roots cover their subtree.
pub fn parse_subscription(raw: &str, severity: Option<Severity>) -> Subscription {
    let (pattern, implied) = ChannelId::parse(raw);
    Subscription {
        pattern: pattern.append_wildcard(),
        threshold: severity.or(implied).unwrap_or(DEFAULT_THRESHOLD),
    }
}

/// Normalise an unsubscribe request: every trailing qualifier is stripped.
pub fn parse_unsubscription(raw: &str) -> ChannelId {
    ChannelId::from_segments(strip_all_severity_suffixes(split_segments(raw))).append_wildcard()
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionTable {
    entries: Vec<Subscription>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, raw: &str, severity: Option<Severity>) -> SubscribeResult {
        self.insert(parse_subscription(raw, severity))
    }

    /// Insert or update an already-normalised subscription.
    pub fn insert(&mut self, subscription: Subscription) -> SubscribeResult {
        match self.entries.iter_mut().find(|s| s.pattern == subscription.pattern) {
            Some(existing) => {
                existing.threshold = subscription.threshold;
                SubscribeResult { subscription, inserted: false }
            }
            None => {
                self.entries.push(subscription.clone());
                SubscribeResult { subscription, inserted: true }
            }
        }
    }

    /// Remove a pattern. Returns the removed subscription, if any.
    pub fn unsubscribe(&mut self, raw: &str) -> Option<Subscription> {
        let pattern = parse_unsubscription(raw);
        let index = self.entries.iter().position(|s| s.pattern == pattern)?;
        Some(self.entries.remove(index))
    }

    /// Active subscriptions in insertion order. The iterator is cheap to
    /// clone, so callers can restart it.
    pub fn list(&self) -> std::slice::Iter<'_, Subscription> {
        self.entries.iter()
    }

    pub fn get(&self, pattern: &ChannelId) -> Option<&Subscription> {
        self.entries.iter().find(|s| &s.pattern == pattern)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every subscription whose pattern covers `channel`.
    pub fn candidates<'a: 'c, 'c>(
        &'a self,
        channel: &'c ChannelId,
    ) -> impl Iterator<Item = &'a Subscription> + 'c {
        self.entries.iter().filter(move |s| s.pattern.matches(channel))
    }

    /// The most specific subscription covering `channel`.
    pub fn best_match(&self, channel: &ChannelId) -> Option<&Subscription> {
        self.entries
            .iter()
            .filter(|s| s.pattern.matches(channel))
            .min_by(|a, b| specificity(&a.pattern, &b.pattern, channel))
    }
}

/// Order two matching patterns, most specific first.
///
/// 1. a wildcard-free pattern equal to the channel beats everything
/// 2. the longer leading literal run matching the channel's prefix
/// 3. more literal (non-wildcard) segments
/// 4. more segments overall
/// 5. lexicographically smaller canonical id
pub fn specificity(a: &ChannelId, b: &ChannelId, channel: &ChannelId) -> Ordering {
    b.is_exact_for(channel)
        .cmp(&a.is_exact_for(channel))
        .then_with(|| b.literal_prefix_len(channel).cmp(&a.literal_prefix_len(channel)))
        .then_with(|| b.literal_len().cmp(&a.literal_len()))
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.canonical_id().cmp(&b.canonical_id()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
