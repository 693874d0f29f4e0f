//! Output line formatting.
//!
//! Every delivered row becomes one line of the shape
//!
//! ```text
//! [2024-01-15T10:00:00.000Z][billing:worker][error]: charge failed
//! ```
//!
//! Colour is applied here and nowhere else. With colour off the output is
//! plain text, which is what the file sink and tests want.

use crate::theme::Theme;
use crossterm::style::ContentStyle;
use pando_core::Delivery;
use std::fmt::Display;

/// Timestamp layout, millisecond precision in UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone)]
pub struct LineFormatter {
    theme: Theme,
    color: bool,
}

impl LineFormatter {
    pub fn new(theme: Theme, color: bool) -> Self {
        Self { theme, color }
    }

    /// A formatter that never emits escape sequences.
    pub fn plain() -> Self {
        Self::new(Theme::load_default(), false)
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn is_colored(&self) -> bool {
        self.color
    }

    pub fn format(&self, delivery: &Delivery) -> String {
        let ts = delivery.ts.format(TIMESTAMP_FORMAT).to_string();
        let label = delivery.label();
        // Colour by the admitting pattern so a wildcard subtree shares one colour.
        let palette_key = delivery
            .pattern
            .as_ref()
            .map_or_else(|| label.clone(), |p| p.display_name());
        format!(
            "[{}][{}][{}]: {}",
            self.paint(self.theme.timestamp, ts),
            self.paint(self.theme.channel_style(&palette_key), label),
            self.paint(self.theme.severity_style(delivery.severity), delivery.severity),
            delivery.message
        )
    }

    fn paint<D: Display>(&self, style: ContentStyle, value: D) -> String {
        if self.color {
            style.apply(value).to_string()
        } else {
            value.to_string()
        }
    }
}
