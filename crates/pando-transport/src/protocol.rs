//! Messages crossing the hub boundary.
//!
//! Observers speak newline-delimited JSON over TCP:
//!
//! ```text
//! → {"type":"subscribe","channel":"billing:*","severity":"warning"}
//! → {"type":"unsubscribe","channel":"billing:*"}
//! ← {"type":"log","line":"[…][billing:worker][error]: charge failed"}
//! ← {"type":"unknown-channel","channel":"search:indexer"}
//! ```
//!
//! Internally every transport talks to the dispatcher through
//! [`HubMessage`]s on one bounded queue.

use pando_core::{Payload, Severity};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Request line sent by an observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObserverRequest {
    Subscribe {
        channel: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<SeverityArg>,
    },
    Unsubscribe {
        channel: String,
    },
}

/// Severity as an observer may spell it: a name/alias or a numeric rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeverityArg {
    Rank(u64),
    Name(String),
}

impl SeverityArg {
    /// Unknown names and out-of-range ranks resolve to `debug`.
    pub fn resolve(&self) -> Severity {
        match self {
            SeverityArg::Rank(rank) => u8::try_from(*rank)
                .ok()
                .and_then(Severity::from_rank)
                .unwrap_or(Severity::Debug),
            SeverityArg::Name(name) => Severity::resolve(name, Severity::Debug),
        }
    }
}

impl ObserverRequest {
    pub fn into_message(self) -> HubMessage {
        match self {
            ObserverRequest::Subscribe { channel, severity } => HubMessage::Subscribe {
                channel,
                severity: severity.as_ref().map(SeverityArg::resolve),
            },
            ObserverRequest::Unsubscribe { channel } => HubMessage::Unsubscribe { channel },
        }
    }
}

/// Event line pushed to every connected observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObserverEvent {
    Log { line: String },
    UnknownChannel { channel: String },
}

/// Everything the dispatcher task consumes, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// A decoded ingestion payload.
    Event(Payload),
    /// A datagram that could not be decoded.
    Malformed { peer: SocketAddr, reason: String },
    Subscribe {
        channel: String,
        severity: Option<Severity>,
    },
    Unsubscribe { channel: String },
    ClientConnected { peer: SocketAddr },
    ClientDisconnected { peer: SocketAddr },
    /// An observer sent a line that is not a valid request.
    BadRequest { peer: SocketAddr, reason: String },
    /// A socket operation failed in one of the listeners. Not fatal.
    TransportFailure { source: &'static str, reason: String },
}
