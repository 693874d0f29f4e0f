//! TCP observer server.
//!
//! Every connection gets its own task. Request lines are parsed and
//! forwarded to the dispatcher; events from the shared broadcast channel are
//! written back. A slow observer lags and loses lines, it never blocks the
//! dispatcher.

use crate::error::{Result, TransportError};
use crate::protocol::{HubMessage, ObserverEvent, ObserverRequest};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;

/// Longest request line accepted from an observer.
pub const MAX_REQUEST_LINE: usize = 8 * 1024;

/// Name reported with observer transport failures.
pub const SOURCE: &str = "observers";

pub struct ObserverServer {
    listener: TcpListener,
}

impl ObserverServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept observers until `shutdown` fires.
    pub async fn run(
        self,
        hub: mpsc::Sender<HubMessage>,
        events: broadcast::Sender<ObserverEvent>,
        shutdown: CancellationToken,
    ) {
        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "observer accept failed");
                        let failure = HubMessage::TransportFailure {
                            source: SOURCE,
                            reason: format!("accept failed: {e}"),
                        };
                        if hub.send(failure).await.is_err() {
                            break;
                        }
                        continue;
                    }
                },
            };
            // Subscribe before spawning so the observer sees its own
            // connection notice.
            let receiver = events.subscribe();
            tokio::spawn(serve_connection(
                stream,
                peer,
                hub.clone(),
                receiver,
                shutdown.clone(),
            ));
        }
        tracing::debug!("observer server stopped");
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    hub: mpsc::Sender<HubMessage>,
    mut events: broadcast::Receiver<ObserverEvent>,
    shutdown: CancellationToken,
) {
    let (reader, writer) = stream.into_split();
    let mut requests = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_REQUEST_LINE));
    let mut responses = FramedWrite::new(writer, LinesCodec::new());

    if hub.send(HubMessage::ClientConnected { peer }).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            request = requests.next() => match request {
                None => break,
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let message = match serde_json::from_str::<ObserverRequest>(&line) {
                        Ok(request) => request.into_message(),
                        Err(e) => HubMessage::BadRequest { peer, reason: e.to_string() },
                    };
                    if hub.send(message).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    let _ = hub
                        .send(HubMessage::BadRequest { peer, reason: e.to_string() })
                        .await;
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) => {
                    let line = match serde_json::to_string(&event) {
                        Ok(line) => line,
                        Err(e) => {
                            tracing::warn!(error = %e, "cannot encode observer event");
                            continue;
                        }
                    };
                    if let Err(e) = responses.send(line).await {
                        tracing::debug!(%peer, error = %e, "observer write failed");
                        let _ = hub
                            .send(HubMessage::TransportFailure {
                                source: SOURCE,
                                reason: format!("write to {peer} failed: {e}"),
                            })
                            .await;
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(%peer, skipped, "observer lagging, lines dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    let _ = hub.send(HubMessage::ClientDisconnected { peer }).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pando_core::Severity;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn requests_in_events_out() {
        let server = ObserverServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (hub_tx, mut hub_rx) = mpsc::channel(8);
        let (events_tx, _) = broadcast::channel(8);
        let shutdown = CancellationToken::new();
        tokio::spawn(server.run(hub_tx, events_tx.clone(), shutdown.clone()));

        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        assert!(matches!(hub_rx.recv().await, Some(HubMessage::ClientConnected { .. })));

        write
            .write_all(b"{\"type\":\"subscribe\",\"channel\":\"a:b\",\"severity\":\"error\"}\nnonsense\n")
            .await
            .unwrap();
        assert_eq!(
            hub_rx.recv().await,
            Some(HubMessage::Subscribe { channel: "a:b".into(), severity: Some(Severity::Error) })
        );
        assert!(matches!(hub_rx.recv().await, Some(HubMessage::BadRequest { .. })));

        events_tx.send(ObserverEvent::Log { line: "hello".into() }).unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(line, r#"{"type":"log","line":"hello"}"#);

        drop(write);
        drop(lines);
        assert!(matches!(hub_rx.recv().await, Some(HubMessage::ClientDisconnected { .. })));
        shutdown.cancel();
    }
}
