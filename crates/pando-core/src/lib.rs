//! pando-core: the routing and normalisation core of the pando log hub.
//!
//! Everything here is synchronous and I/O free apart from configuration
//! loading. The transports feed decoded [`Payload`]s into one [`Router`];
//! the router hands back [`Outcome`]s for the hub to format and fan out.
//!
//! # Architecture
//!
//! ```text
//! Payload ──► Normalizer ──► Router ──► Outcome
//!                              │
//!                 ChannelId ◄──┴──► SubscriptionTable
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod payload;
pub mod router;
pub mod severity;
pub mod subscription;
pub mod types;

pub use channel::ChannelId;
pub use error::{Error, Result};
pub use normalizer::{Normalizer, Recognizer, RecognizerChain, Row};
pub use payload::Payload;
pub use router::{Router, RouterOptions};
pub use severity::Severity;
pub use subscription::{Subscription, SubscriptionTable};
pub use types::{Delivery, Outcome};
