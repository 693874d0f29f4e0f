//! Router: best-match resolution, the severity gate, and unknown-channel
//! signalling.
//!
//! A [`Router`] owns the [`SubscriptionTable`], the unmatched-channel memory
//! and the [`Normalizer`]. It is plain synchronous state: the hub keeps
//! exactly one and feeds it from a single task, so every event and every
//! subscription change is applied in arrival order.
//!
//! Per row the router moves through
//!
//! ```text
//! RECEIVED ─► NORMALIZED ─► MATCHED ───► DELIVERED | SUPPRESSED
//!                       └─► UNMATCHED ─► SIGNALED  | IGNORED
//! ```

use crate::channel::ChannelId;
use crate::error::{Error, Result};
use crate::normalizer::{Normalizer, Row};
use crate::payload::Payload;
use crate::severity::Severity;
use crate::subscription::{SubscribeResult, Subscription, SubscriptionTable};
use crate::types::{Delivery, Outcome};
use chrono::Utc;
use std::collections::BTreeSet;

/// Default name of the reserved self-diagnostic channel.
pub const SELF_CHANNEL: &str = "pando";

/// Sub-channel of the self channel used for observer connection events.
pub const CLIENT_SEGMENT: &str = "client";

/// Default cap on remembered unmatched channels.
pub const MAX_UNMATCHED: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    /// When a wildcard subscription wins for a channel, add a concrete
    /// subscription for that channel at the same threshold.
    pub auto_expand: bool,
    /// Root of the reserved self-diagnostic channel.
    pub self_channel: String,
    /// Most unmatched channels remembered at once. When full, the smallest
    /// remembered name is forgotten and may be signaled again later.
    pub max_unmatched: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            auto_expand: false,
            self_channel: SELF_CHANNEL.to_string(),
            max_unmatched: MAX_UNMATCHED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    table: SubscriptionTable,
    unmatched: BTreeSet<ChannelId>,
    normalizer: Normalizer,
    auto_expand: bool,
    self_channel: ChannelId,
    max_unmatched: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterOptions::default())
    }
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        Self::with_normalizer(options, Normalizer::default())
    }

    pub fn with_normalizer(options: RouterOptions, normalizer: Normalizer) -> Self {
        let self_channel = ChannelId::route(&options.self_channel)
            .unwrap_or_else(|| ChannelId::from_segments([SELF_CHANNEL]));
        Self {
            table: SubscriptionTable::new(),
            unmatched: BTreeSet::new(),
            normalizer,
            auto_expand: options.auto_expand,
            self_channel,
            max_unmatched: options.max_unmatched.max(1),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn normalizer_mut(&mut self) -> &mut Normalizer {
        &mut self.normalizer
    }

    pub fn self_channel(&self) -> &ChannelId {
        &self.self_channel
    }

    /// `<self>:client`, where observer connection events are reported.
    pub fn client_channel(&self) -> ChannelId {
        let mut segments = self.self_channel.segments().to_vec();
        segments.push(CLIENT_SEGMENT.to_string());
        ChannelId::from_segments(segments)
    }

    // -- subscriptions -------------------------------------------------------

    /// Add or update a subscription, then forget every remembered unmatched
    /// channel the pattern now covers so it can be signaled again later.
    pub fn subscribe(&mut self, raw: &str, severity: Option<Severity>) -> SubscribeResult {
        let result = self.table.subscribe(raw, severity);
        let pattern = &result.subscription.pattern;
        self.unmatched.retain(|channel| !pattern.matches(channel));
        tracing::debug!(
            pattern = %result.subscription.pattern,
            threshold = %result.subscription.threshold,
            inserted = result.inserted,
            "subscribe"
        );
        result
    }

    pub fn unsubscribe(&mut self, raw: &str) -> Option<Subscription> {
        let removed = self.table.unsubscribe(raw);
        tracing::debug!(channel = raw, removed = removed.is_some(), "unsubscribe");
        removed
    }

    pub fn subscriptions(&self) -> std::slice::Iter<'_, Subscription> {
        self.table.list()
    }

    pub fn table(&self) -> &SubscriptionTable {
        &self.table
    }

    /// Apply a comma-separated seed list (`a:b,c:warn,svc`). Each entry is
    /// parsed exactly like a runtime subscribe without explicit severity.
    /// Returns the number of entries applied.
    pub fn seed(&mut self, list: &str) -> usize {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| self.subscribe(entry, None))
            .count()
    }

    /// `Preloaded Channels: a:b=debug, c:*=warning`
    pub fn preloaded_summary(&self) -> String {
        let entries: Vec<String> = self.table.list().map(ToString::to_string).collect();
        format!("Preloaded Channels: {}", entries.join(", "))
    }

    // -- routing -------------------------------------------------------------

    /// Decode-level entry point: normalise the payload text and route every
    /// resulting row on the payload's channel.
    pub fn handle_payload(&mut self, payload: &Payload) -> Result<Vec<Outcome>> {
        self.route_text(&payload.channel, &payload.text())
    }

    /// Normalise `text` and route each row independently on `channel`.
    pub fn route_text(&mut self, channel: &str, text: &str) -> Result<Vec<Outcome>> {
        let channel = ChannelId::route(channel)
            .ok_or_else(|| Error::MalformedPayload("channel is empty".to_string()))?;
        let rows = self.normalizer.normalize(text);
        Ok(rows.into_iter().map(|row| self.route_row(&channel, row)).collect())
    }

    pub fn route_row(&mut self, channel: &ChannelId, row: Row) -> Outcome {
        self.route(channel, row.severity, row.message)
    }

    /// Route one already-normalised row.
    pub fn route(&mut self, channel: &ChannelId, severity: Severity, message: String) -> Outcome {
        if let Some(winner) = self.table.best_match(channel).cloned() {
            if self.auto_expand && !winner.pattern.is_exact_for(channel) {
                tracing::debug!(%channel, pattern = %winner.pattern, "auto-expanding subscription");
                self.table.insert(Subscription {
                    pattern: channel.clone(),
                    threshold: winner.threshold,
                });
            }
            if !severity.passes(winner.threshold) {
                return Outcome::Suppressed {
                    channel: channel.clone(),
                    pattern: winner.pattern,
                    severity,
                };
            }
            return Outcome::Delivered(delivery(channel, Some(winner.pattern), severity, message));
        }

        if self.is_self(channel) {
            return Outcome::Delivered(delivery(channel, None, severity, message));
        }

        if self.unmatched.contains(channel) {
            return Outcome::Ignored { channel: channel.clone() };
        }
        if self.unmatched.len() >= self.max_unmatched {
            if let Some(evicted) = self.unmatched.pop_first() {
                tracing::debug!(%evicted, "unmatched memory full, forgetting channel");
            }
        }
        self.unmatched.insert(channel.clone());
        tracing::debug!(%channel, "no subscription for channel");
        let text = format!("No log channel for \"{channel}\"");
        let notice = self.route(&self.self_channel.clone(), Severity::Notice, text);
        Outcome::Signaled {
            channel: channel.clone(),
            notice: notice.into_delivery(),
        }
    }

    /// Emit a self-diagnostic on `channel`, which should be the self channel
    /// or one of its descendants. It is routed like any other row.
    pub fn diagnostic(
        &mut self,
        channel: &ChannelId,
        severity: Severity,
        message: impl Into<String>,
    ) -> Outcome {
        self.route(channel, severity, message.into())
    }

    /// Self-diagnostic on the root self channel.
    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) -> Outcome {
        let channel = self.self_channel.clone();
        self.diagnostic(&channel, severity, message)
    }

    /// True once `channel` has been signaled as unknown and not yet covered.
    pub fn is_remembered(&self, channel: &ChannelId) -> bool {
        self.unmatched.contains(channel)
    }

    /// Display names of every remembered unmatched channel, sorted.
    pub fn unmatched(&self) -> impl Iterator<Item = String> + '_ {
        self.unmatched.iter().map(ChannelId::display_name)
    }

    fn is_self(&self, channel: &ChannelId) -> bool {
        channel.starts_with(&self.self_channel)
    }
}

fn delivery(
    channel: &ChannelId,
    pattern: Option<ChannelId>,
    severity: Severity,
    message: String,
) -> Delivery {
    Delivery {
        ts: Utc::now(),
        channel: channel.clone(),
        pattern,
        severity,
        message,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(raw: &str) -> ChannelId {
        ChannelId::route(raw).unwrap()
    }

    fn route(router: &mut Router, channel: &str, severity: Severity) -> Outcome {
        router.route(&id(channel), severity, "msg".to_string())
    }

    #[test]
    fn exact_subscription_suppresses_below_threshold() {
        let mut router = Router::default();
        router.subscribe("a:*", Some(Severity::Debug));
        router.subscribe("a:b", Some(Severity::Error));
        let outcome = route(&mut router, "a:b", Severity::Warning);
        assert!(matches!(
            outcome,
            Outcome::Suppressed { ref pattern, .. } if pattern.display_name() == "a:b"
        ));
    }

    #[test]
    fn wildcard_delivers_with_event_label() {
        let mut router = Router::default();
        router.subscribe("a:*", Some(Severity::Debug));
        let Outcome::Delivered(delivery) = route(&mut router, "a:c", Severity::Info) else {
            panic!("expected delivery");
        };
        assert_eq!(delivery.label(), "a:c");
        assert_eq!(delivery.pattern.map(|p| p.display_name()), Some("a:*".to_string()));
        assert_eq!(delivery.severity, Severity::Info);
    }

    #[test]
    fn unknown_channel_is_signaled_once() {
        let mut router = Router::default();
        let first = route(&mut router, "x:y", Severity::Info);
        let Outcome::Signaled { channel, notice } = first else {
            panic!("expected signal");
        };
        assert_eq!(channel.display_name(), "x:y");
        let notice = notice.expect("self channel delivers without subscriptions");
        assert_eq!(notice.label(), "pando");
        assert_eq!(notice.severity, Severity::Notice);
        assert_eq!(notice.message, "No log channel for \"x:y\"");

        assert!(matches!(route(&mut router, "x:y", Severity::Info), Outcome::Ignored { .. }));
    }

    #[test]
    fn subscribing_clears_covered_memory() {
        let mut router = Router::default();
        route(&mut router, "x:y", Severity::Info);
        route(&mut router, "z:q", Severity::Info);
        router.subscribe("x", None);
        assert!(!router.is_remembered(&id("x:y")));
        assert!(router.is_remembered(&id("z:q")));

        router.unsubscribe("x");
        assert!(matches!(route(&mut router, "x:y", Severity::Info), Outcome::Signaled { .. }));
    }

    #[test]
    fn self_channel_is_muted_by_none_subscription() {
        let mut router = Router::default();
        router.subscribe("pando:none", None);
        let outcome = route(&mut router, "x:y", Severity::Info);
        assert!(matches!(outcome, Outcome::Signaled { notice: None, .. }));
        assert!(matches!(
            route(&mut router, "pando:client", Severity::Emerg),
            Outcome::Suppressed { .. }
        ));
    }

    #[test]
    fn self_channel_never_signals() {
        let mut router = Router::default();
        let outcome = router.diagnostic(&router.client_channel(), Severity::Debug, "Client connected");
        let Outcome::Delivered(delivery) = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(delivery.label(), "pando:client");
        assert_eq!(delivery.pattern, None);
        assert_eq!(router.unmatched().count(), 0);
    }

    #[test]
    fn unmatched_memory_is_capped() {
        let mut router = Router::new(RouterOptions { max_unmatched: 2, ..Default::default() });
        for raw in ["c:c", "a:a", "b:b"] {
            assert!(matches!(route(&mut router, raw, Severity::Info), Outcome::Signaled { .. }));
        }
        assert_eq!(router.unmatched().collect::<Vec<_>>(), vec!["b:b", "c:c"]);
        assert!(matches!(route(&mut router, "c:c", Severity::Info), Outcome::Ignored { .. }));
        assert!(matches!(route(&mut router, "a:a", Severity::Info), Outcome::Signaled { .. }));
    }

    #[test]
    fn none_threshold_passes_nothing() {
        let mut router = Router::default();
        router.subscribe("a:b", Some(Severity::None));
        assert!(matches!(route(&mut router, "a:b", Severity::Emerg), Outcome::Suppressed { .. }));
    }

    #[test]
    fn auto_expand_adds_concrete_subscription() {
        let mut router = Router::new(RouterOptions { auto_expand: true, ..Default::default() });
        router.subscribe("svc", Some(Severity::Warning));
        route(&mut router, "svc:worker", Severity::Info);
        let listed: Vec<String> = router.subscriptions().map(ToString::to_string).collect();
        assert_eq!(listed, vec!["svc:*=warning", "svc:worker=warning"]);
    }

    #[test]
    fn auto_expand_is_off_by_default() {
        let mut router = Router::default();
        router.subscribe("svc", None);
        route(&mut router, "svc:worker", Severity::Info);
        assert_eq!(router.subscriptions().count(), 1);
    }

    #[test]
    fn seed_list_and_summary() {
        let mut router = Router::default();
        assert_eq!(router.seed(" a:b , svc:warn,, error "), 3);
        assert_eq!(
            router.preloaded_summary(),
            "Preloaded Channels: a:b=debug, svc:*=warning, *=error"
        );
    }

    #[test]
    fn route_text_splits_rows() {
        let mut router = Router::default();
        router.subscribe("*", None);
        let outcomes = router
            .route_text("svc:api", "ERROR: first\nplain second")
            .unwrap();
        let rows: Vec<(Severity, String)> = outcomes
            .into_iter()
            .filter_map(Outcome::into_delivery)
            .map(|d| (d.severity, d.message))
            .collect();
        assert_eq!(
            rows,
            vec![
                (Severity::Error, "first".to_string()),
                (Severity::Info, "plain second".to_string()),
            ]
        );
    }

    #[test]
    fn empty_event_channel_is_malformed() {
        let mut router = Router::default();
        assert!(matches!(router.route_text(" : ", "x"), Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn payload_is_joined_then_routed() {
        let mut router = Router::default();
        router.subscribe("api", Some(Severity::Warning));
        let payload = Payload::new("api:auth", ["WARN:", "token expired"]);
        let outcomes = router.handle_payload(&payload).unwrap();
        let delivery = outcomes[0].delivery().unwrap();
        assert_eq!(delivery.severity, Severity::Warning);
        assert_eq!(delivery.message, "token expired");
    }
}
