//! Domain-specific assertion macros for pando harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! routing decision was wrong.

/// Assert that an outcome is a delivery with the given label, severity and
/// message.
///
/// ```rust
/// assert_delivered!(outcome, "a:c", Severity::Info, "hello");
/// ```
#[macro_export]
macro_rules! assert_delivered {
    ($outcome:expr, $label:expr, $severity:expr, $message:expr) => {{
        match &$outcome {
            pando_core::Outcome::Delivered(delivery) => {
                pretty_assertions::assert_eq!(
                    (delivery.label().as_str(), delivery.severity, delivery.message.as_str()),
                    ($label, $severity, $message)
                );
            }
            other => panic!("assert_delivered! failed: expected delivery, got {:?}", other),
        }
    }};
}

/// Assert that an outcome was suppressed by the given pattern.
#[macro_export]
macro_rules! assert_suppressed {
    ($outcome:expr, $pattern:expr) => {{
        match &$outcome {
            pando_core::Outcome::Suppressed { pattern, .. } => {
                pretty_assertions::assert_eq!(pattern.display_name(), $pattern);
            }
            other => panic!("assert_suppressed! failed: expected suppression, got {:?}", other),
        }
    }};
}

/// Assert that an outcome is the first unknown-channel signal for a channel.
#[macro_export]
macro_rules! assert_signaled {
    ($outcome:expr, $channel:expr) => {{
        match &$outcome {
            pando_core::Outcome::Signaled { channel, .. } => {
                pretty_assertions::assert_eq!(channel.display_name(), $channel);
            }
            other => panic!("assert_signaled! failed: expected signal, got {:?}", other),
        }
    }};
}

/// Assert that a normalised row has the given severity and message.
#[macro_export]
macro_rules! assert_row {
    ($row:expr, $severity:expr, $message:expr) => {{
        let row: &pando_core::Row = &$row;
        pretty_assertions::assert_eq!(
            (row.severity, row.message.as_str()),
            ($severity, $message),
            "row mismatch"
        );
    }};
}
