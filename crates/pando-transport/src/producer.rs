//! Producer client: sends events to a hub over UDP.
//!
//! Delivery is fire-and-forget: a datagram that is sent but never received
//! (hub down, packet lost) is not reported.

use crate::error::{Result, TransportError};
use crate::ingest::MAX_DATAGRAM;
use pando_core::Payload;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::UdpSocket;

pub struct Producer {
    socket: UdpSocket,
    target: SocketAddr,
}

impl Producer {
    /// Bind an ephemeral local socket of the same family as `target`.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        let local: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| TransportError::Bind { addr: local, source })?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub async fn send(&self, payload: &Payload) -> Result<()> {
        let bytes = payload.encode()?;
        if bytes.len() > MAX_DATAGRAM {
            return Err(TransportError::PayloadTooLarge(bytes.len()));
        }
        self.socket.send_to(&bytes, self.target).await?;
        tracing::debug!(channel = %payload.channel, bytes = bytes.len(), "sent");
        Ok(())
    }

    /// Send one event built from text fragments.
    pub async fn send_text<I, S>(&self, channel: &str, what: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(&Payload::new(channel, what)).await
    }

    /// Send every non-blank line of `reader` as its own event. Returns the
    /// number of events sent.
    pub async fn send_lines<R>(&self, channel: &str, reader: R) -> Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut sent = 0;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            self.send_text(channel, [line]).await?;
            sent += 1;
        }
        Ok(sent)
    }
}
