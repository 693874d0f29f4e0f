//! UDP ingestion listener.
//!
//! Each datagram carries exactly one JSON [`Payload`]. Decoding happens here
//! so the dispatcher only ever sees well-formed events; anything else is
//! reported as [`HubMessage::Malformed`] and otherwise dropped.

use crate::error::{Result, TransportError};
use crate::protocol::HubMessage;
use pando_core::Payload;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM: usize = 65_507;

/// Name reported with ingest transport failures.
pub const SOURCE: &str = "ingest";

pub struct IngestListener {
    socket: UdpSocket,
}

impl IngestListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive datagrams until `shutdown` fires or the hub goes away.
    ///
    /// Receive errors are logged and the loop keeps going; a single bad
    /// datagram never stops ingestion.
    pub async fn run(self, hub: mpsc::Sender<HubMessage>, shutdown: CancellationToken) {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        tracing::warn!(error = %e, "ingest receive failed");
                        let failure = HubMessage::TransportFailure {
                            source: SOURCE,
                            reason: e.to_string(),
                        };
                        if hub.send(failure).await.is_err() {
                            break;
                        }
                        continue;
                    }
                },
            };

            let message = match Payload::decode(&buf[..len]) {
                Ok(payload) => HubMessage::Event(payload),
                Err(e) => {
                    tracing::debug!(%peer, error = %e, "dropping malformed datagram");
                    HubMessage::Malformed { peer, reason: e.to_string() }
                }
            };
            if hub.send(message).await.is_err() {
                break;
            }
        }
        tracing::debug!("ingest listener stopped");
    }
}
