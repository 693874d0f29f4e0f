//! Error types for pando-transport.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

#[derive(Debug, Error)]
pub enum TransportError {
    /// A listener could not bind its address. Fatal at startup.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The durable sink file could not be opened. Fatal at startup.
    #[error("cannot open sink {}: {source}", path.display())]
    OpenSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Payload(#[from] pando_core::Error),

    /// The encoded payload does not fit in one datagram.
    #[error("payload of {0} bytes exceeds the datagram limit")]
    PayloadTooLarge(usize),

    #[error("line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// The dispatcher queue is closed; the hub is shutting down.
    #[error("hub is shut down")]
    HubClosed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
