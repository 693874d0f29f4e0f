//! Test builders: ergonomic constructors for routers, payloads, and hubs.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use pando_core::config::Config;
use pando_core::{ChannelId, Payload, Router, RouterOptions, Severity};

// ---------------------------------------------------------------------------
// RouterBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a [`Router`] with subscriptions already applied.
///
/// ```rust
/// let router = RouterBuilder::new()
///     .subscribe("a:*", Severity::Debug)
///     .subscribe("a:b", Severity::Error)
///     .build();
/// ```
#[derive(Default)]
pub struct RouterBuilder {
    options: RouterOptions,
    subscriptions: Vec<(String, Option<Severity>)>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(mut self, channel: &str, severity: Severity) -> Self {
        self.subscriptions.push((channel.to_string(), Some(severity)));
        self
    }

    /// Subscribe with the severity taken from the channel's qualifier.
    pub fn subscribe_raw(mut self, channel: &str) -> Self {
        self.subscriptions.push((channel.to_string(), None));
        self
    }

    pub fn auto_expand(mut self) -> Self {
        self.options.auto_expand = true;
        self
    }

    pub fn build(self) -> Router {
        let mut router = Router::new(self.options);
        for (channel, severity) in self.subscriptions {
            router.subscribe(&channel, severity);
        }
        router
    }
}

/// Parse an event channel, panicking on empty input.
pub fn channel(raw: &str) -> ChannelId {
    ChannelId::route(raw).unwrap_or_else(|| panic!("empty channel {raw:?}"))
}

/// A single-fragment payload.
pub fn payload(channel: &str, text: &str) -> Payload {
    Payload::new(channel, [text])
}

/// Config bound to ephemeral localhost ports, banner off, no seed.
pub fn local_config() -> Config {
    let mut config = Config::defaults();
    config.ingest.bind = "127.0.0.1:0".parse().unwrap();
    config.observers.bind = "127.0.0.1:0".parse().unwrap();
    config.app.banner = false;
    config.sink.color = false;
    config
}
