//! pando: log relay hub.
//!
//! Producers fire JSON datagrams at the hub; the hub normalises each line,
//! routes it against the live subscription table, and fans matching lines
//! out to connected observers and a durable sink.
//!
//! # Architecture
//!
//! ```text
//! Producer ──► IngestListener ──► Dispatcher ──► LineFormatter ──► observers
//!                                    │  ▲                        └──► sink
//!                                    ▼  │
//!                                   Router ◄── ObserverServer (subscribe / unsubscribe)
//! ```
//!
//! The library crates do the work; this crate wires them together so that
//! integration tests can start a real hub on ephemeral ports.

pub mod hub;

pub use hub::{serve, start, Dispatcher, HubHandle};
pub use pando_core::config::Config;
