//! pando-transport: the network edges of the pando hub.
//!
//! - [`IngestListener`]: UDP datagrams from producers
//! - [`ObserverServer`]: newline-delimited JSON over TCP for observers
//! - [`sink`]: the durable append-only output
//! - [`Producer`]: the sending side used by `pando send`
//!
//! Every inbound edge feeds the dispatcher through one bounded
//! `mpsc::Sender<HubMessage>`.

pub mod error;
pub mod ingest;
pub mod observers;
pub mod producer;
pub mod protocol;
pub mod sink;

pub use error::{Result, TransportError};
pub use ingest::IngestListener;
pub use observers::ObserverServer;
pub use producer::Producer;
pub use protocol::{HubMessage, ObserverEvent, ObserverRequest, SeverityArg};
pub use sink::{SinkHandle, SinkTarget};
