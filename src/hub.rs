//! The hub: one dispatcher task wired to the transports.
//!
//! ```text
//! UDP ingest ──┐                              ┌──► broadcast ──► observers
//!              ├──► mpsc<HubMessage> ──► Dispatcher (owns Router)
//! TCP observers┘                              └──► SinkHandle ──► stdout / file
//! ```
//!
//! The dispatcher is the only writer of routing state. Ingest and observer
//! requests are applied strictly in the order they reach the queue.

use anyhow::Context;
use pando_core::config::Config;
use pando_core::{Delivery, Outcome, Router, Severity};
use pando_term::{banner, LineFormatter, Theme};
use pando_transport::sink::{self, SinkHandle, SinkTarget};
use pando_transport::{HubMessage, IngestListener, ObserverEvent, ObserverServer};
use std::net::SocketAddr;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Applies [`HubMessage`]s to the [`Router`] and fans the results out.
pub struct Dispatcher {
    router: Router,
    formatter: LineFormatter,
    events: broadcast::Sender<ObserverEvent>,
    sink: Option<SinkHandle>,
}

impl Dispatcher {
    pub fn new(
        router: Router,
        formatter: LineFormatter,
        events: broadcast::Sender<ObserverEvent>,
        sink: Option<SinkHandle>,
    ) -> Self {
        Self { router, formatter, events, sink }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn handle(&mut self, message: HubMessage) {
        match message {
            HubMessage::Event(payload) => match self.router.handle_payload(&payload) {
                Ok(outcomes) => outcomes.into_iter().for_each(|o| self.emit(o)),
                Err(e) => {
                    let outcome = self.router.notify(Severity::Error, e.to_string());
                    self.emit(outcome);
                }
            },
            HubMessage::Malformed { peer, reason } => {
                let outcome = self
                    .router
                    .notify(Severity::Error, format!("Malformed payload from {peer}: {reason}"));
                self.emit(outcome);
            }
            HubMessage::Subscribe { channel, severity } => {
                self.router.subscribe(&channel, severity);
            }
            HubMessage::Unsubscribe { channel } => {
                self.router.unsubscribe(&channel);
            }
            HubMessage::ClientConnected { peer } => {
                self.client_diagnostic(Severity::Debug, format!("Client connected: {peer}"));
            }
            HubMessage::ClientDisconnected { peer } => {
                self.client_diagnostic(Severity::Debug, format!("Client disconnected: {peer}"));
            }
            HubMessage::TransportFailure { source, reason } => {
                let outcome = self
                    .router
                    .notify(Severity::Error, format!("Transport error ({source}): {reason}"));
                self.emit(outcome);
            }
            HubMessage::BadRequest { peer, reason } => {
                self.client_diagnostic(
                    Severity::Warning,
                    format!("Ignoring request from {peer}: {reason}"),
                );
            }
        }
    }

    /// Hand one router outcome to observers and the sink.
    pub fn emit(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Delivered(delivery) => self.deliver(&delivery),
            Outcome::Signaled { channel, notice } => {
                // No observers connected is not an error.
                let _ = self.events.send(ObserverEvent::UnknownChannel {
                    channel: channel.display_name(),
                });
                if let Some(notice) = notice {
                    self.deliver(&notice);
                }
            }
            Outcome::Suppressed { .. } | Outcome::Ignored { .. } => {}
        }
    }

    /// Startup diagnostics: seeded subscriptions and bound addresses.
    pub fn announce(&mut self, ingest: SocketAddr, observers: SocketAddr) {
        let summary = self.router.preloaded_summary();
        let outcome = self.router.notify(Severity::Debug, summary);
        self.emit(outcome);
        let outcome = self
            .router
            .notify(Severity::Info, format!("Listening for IPC on {ingest}"));
        self.emit(outcome);
        self.client_diagnostic(Severity::Info, format!("Listening for clients on {observers}"));
    }

    /// Process messages until every sender is gone, then hand back the router.
    pub async fn run(mut self, mut rx: mpsc::Receiver<HubMessage>) -> Router {
        while let Some(message) = rx.recv().await {
            self.handle(message);
        }
        tracing::debug!("dispatcher drained");
        self.router
    }

    fn client_diagnostic(&mut self, severity: Severity, message: String) {
        let channel = self.router.client_channel();
        let outcome = self.router.diagnostic(&channel, severity, message);
        self.emit(outcome);
    }

    fn deliver(&self, delivery: &Delivery) {
        let line = self.formatter.format(delivery);
        if let Some(sink) = &self.sink {
            sink.write(line.clone());
        }
        let _ = self.events.send(ObserverEvent::Log { line });
    }
}

// ---------------------------------------------------------------------------
// Running hub
// ---------------------------------------------------------------------------

/// A started hub. Drop it or call [`HubHandle::shutdown`] to stop.
pub struct HubHandle {
    pub ingest_addr: SocketAddr,
    pub observers_addr: SocketAddr,
    shutdown: CancellationToken,
    listeners: Vec<JoinHandle<()>>,
    dispatcher: JoinHandle<Router>,
}

impl HubHandle {
    /// Stop accepting input, let the dispatcher drain, and return the final
    /// router state.
    pub async fn shutdown(self) -> anyhow::Result<Router> {
        self.shutdown.cancel();
        for listener in self.listeners {
            listener.await.context("listener task panicked")?;
        }
        self.dispatcher.await.context("dispatcher task panicked")
    }
}

/// Bind both listeners, seed the router, and start the dispatcher.
pub async fn start(
    config: &Config,
    formatter: LineFormatter,
    sink: Option<SinkHandle>,
) -> anyhow::Result<HubHandle> {
    let ingest = IngestListener::bind(config.ingest.bind)
        .await
        .context("cannot start UDP ingestion")?;
    let observers = ObserverServer::bind(config.observers.bind)
        .await
        .context("cannot start observer server")?;
    let ingest_addr = ingest.local_addr()?;
    let observers_addr = observers.local_addr()?;

    let mut router = Router::new(config.router.options());
    let seeded = router.seed(&config.router.seed);
    tracing::info!(seeded, %ingest_addr, %observers_addr, "hub starting");

    let (tx, rx) = mpsc::channel(config.ingest.queue.max(1));
    let (events, _) = broadcast::channel(config.observers.buffer.max(1));
    let mut dispatcher = Dispatcher::new(router, formatter, events.clone(), sink);
    dispatcher.announce(ingest_addr, observers_addr);

    let shutdown = CancellationToken::new();
    let listeners = vec![
        tokio::spawn(ingest.run(tx.clone(), shutdown.clone())),
        tokio::spawn(observers.run(tx, events, shutdown.clone())),
    ];
    let dispatcher = tokio::spawn(dispatcher.run(rx));

    Ok(HubHandle {
        ingest_addr,
        observers_addr,
        shutdown,
        listeners,
        dispatcher,
    })
}

/// Run the hub in the foreground until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let theme = Theme::resolve(&config.sink.theme).context("cannot load theme")?;
    let target = SinkTarget::from_path(config.sink.path.clone());
    // Escape codes only make sense on a terminal stream.
    let color = config.sink.color && target == SinkTarget::Stdout;

    if config.app.banner {
        println!("{}", banner::render(&config.app.name, &theme, color));
    }

    let (sink, writer) = sink::open(&target, config.sink.buffer)
        .await
        .context("cannot open durable sink")?;
    let hub = start(&config, LineFormatter::new(theme, color), Some(sink)).await?;

    tokio::signal::ctrl_c()
        .await
        .context("cannot listen for Ctrl-C")?;
    tracing::info!("shutting down");

    let router = hub.shutdown().await?;
    tracing::debug!(subscriptions = router.subscriptions().count(), "hub stopped");
    writer
        .await
        .context("sink writer panicked")?
        .context("sink write failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pando_core::Payload;

    fn dispatcher() -> (Dispatcher, broadcast::Receiver<ObserverEvent>) {
        let (events, rx) = broadcast::channel(32);
        (Dispatcher::new(Router::default(), LineFormatter::plain(), events, None), rx)
    }

    fn drain(rx: &mut broadcast::Receiver<ObserverEvent>) -> Vec<ObserverEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn unknown_channel_event_and_notice() {
        let (mut dispatcher, mut rx) = dispatcher();
        dispatcher.handle(HubMessage::Event(Payload::new("x:y", ["hello"])));
        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ObserverEvent::UnknownChannel { channel: "x:y".into() });
        assert!(matches!(
            &events[1],
            ObserverEvent::Log { line } if line.ends_with("[pando][notice]: No log channel for \"x:y\"")
        ));
    }

    #[test]
    fn subscribe_then_deliver() {
        let (mut dispatcher, mut rx) = dispatcher();
        dispatcher.handle(HubMessage::Subscribe { channel: "api".into(), severity: None });
        dispatcher.handle(HubMessage::Event(Payload::new("api:auth", ["WARN: slow"])));
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [ObserverEvent::Log { line }] if line.ends_with("[api:auth][warning]: slow")
        ));
    }

    #[test]
    fn malformed_payload_becomes_error_diagnostic() {
        let (mut dispatcher, mut rx) = dispatcher();
        dispatcher.handle(HubMessage::Malformed {
            peer: "127.0.0.1:9".parse().unwrap(),
            reason: "not JSON".into(),
        });
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [ObserverEvent::Log { line }] if line.contains("[pando][error]: Malformed payload from 127.0.0.1:9")
        ));
    }

    #[test]
    fn transport_failure_becomes_error_diagnostic() {
        let (mut dispatcher, mut rx) = dispatcher();
        dispatcher.handle(HubMessage::TransportFailure {
            source: "ingest",
            reason: "connection reset".into(),
        });
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [ObserverEvent::Log { line }]
                if line.ends_with("[pando][error]: Transport error (ingest): connection reset")
        ));
    }

    #[test]
    fn transport_failure_respects_self_channel_threshold() {
        let (mut dispatcher, mut rx) = dispatcher();
        dispatcher.handle(HubMessage::Subscribe { channel: "pando:none".into(), severity: None });
        dispatcher.handle(HubMessage::TransportFailure {
            source: "observers",
            reason: "accept failed".into(),
        });
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn client_events_go_to_client_channel() {
        let (mut dispatcher, mut rx) = dispatcher();
        dispatcher.handle(HubMessage::ClientConnected { peer: "127.0.0.1:5000".parse().unwrap() });
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [ObserverEvent::Log { line }] if line.contains("[pando:client][debug]: Client connected")
        ));
    }
}
