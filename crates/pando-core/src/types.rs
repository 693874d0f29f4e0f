//! Core types shared by the router and everything downstream of it.
//!
//! A [`Delivery`] is one row that made it through the router and is ready to
//! be formatted; an [`Outcome`] records what the router decided for one
//! normalised row.

use crate::channel::ChannelId;
use crate::severity::Severity;
use chrono::{DateTime, Utc};

/// A routed row, handed to the formatter and from there to observers and the
/// durable sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Time the row was routed (UTC).
    pub ts: DateTime<Utc>,
    /// Channel the event was published on. Its display name is the label.
    pub channel: ChannelId,
    /// Subscription pattern that admitted the row. `None` for self-diagnostics
    /// delivered without a matching subscription.
    pub pattern: Option<ChannelId>,
    pub severity: Severity,
    pub message: String,
}

impl Delivery {
    pub fn label(&self) -> String {
        self.channel.display_name()
    }
}

/// Router decision for one normalised row.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The best-matching subscription let the row through.
    Delivered(Delivery),
    /// A subscription matched but its threshold filtered the row out.
    Suppressed {
        channel: ChannelId,
        pattern: ChannelId,
        severity: Severity,
    },
    /// First row on a channel no subscription covers. `notice` is the
    /// self-diagnostic describing it, present when the diagnostic channel
    /// itself passes routing.
    Signaled {
        channel: ChannelId,
        notice: Option<Delivery>,
    },
    /// Unmatched channel that was already signaled.
    Ignored { channel: ChannelId },
}

impl Outcome {
    /// The delivery carried by this outcome, if any.
    pub fn delivery(&self) -> Option<&Delivery> {
        match self {
            Outcome::Delivered(delivery) => Some(delivery),
            Outcome::Signaled { notice, .. } => notice.as_ref(),
            Outcome::Suppressed { .. } | Outcome::Ignored { .. } => None,
        }
    }

    pub fn into_delivery(self) -> Option<Delivery> {
        match self {
            Outcome::Delivered(delivery) => Some(delivery),
            Outcome::Signaled { notice, .. } => notice,
            Outcome::Suppressed { .. } | Outcome::Ignored { .. } => None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered(_))
    }
}
