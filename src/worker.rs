//! Ingest loop: receive, decode, map, send

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{Config, ConfigHandle};
use crate::events::{BridgeEvent, EventSink};
use crate::mapping::HapticEngine;
use crate::packet;
use crate::transport::{InstructionSink, PacketSource, SendOutcome};
use crate::{BridgeError, Result};

/// Receive buffer size. Larger than any Forza layout so oversized datagrams are
/// rejected by length instead of truncated into a valid one.
pub const RECV_BUFFER_LEN: usize = 2048;

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub packets_received: u64,
    pub packets_decoded: u64,
    /// Sled packets and unrecognized lengths.
    pub packets_skipped: u64,
    pub batches_sent: u64,
    pub batches_dropped: u64,
    /// Sends that failed and abandoned the rest of their tick.
    pub send_failures: u64,
}

/// Single-task ingest loop.
///
/// Owns the mapping engine and both transport ends. Configuration arrives through a
/// watch channel and is snapshotted once per packet.
pub struct Worker<S, T> {
    source: S,
    sink: T,
    engine: HapticEngine,
    config: watch::Receiver<Arc<Config>>,
    events: Arc<dyn EventSink>,
    stats: WorkerStats,
}

impl<S, T> Worker<S, T>
where
    S: PacketSource,
    T: InstructionSink,
{
    pub fn new(
        source: S,
        sink: T,
        config: watch::Receiver<Arc<Config>>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let engine = HapticEngine::new(&config.borrow());
        Self { source, sink, engine, config, events, stats: WorkerStats::default() }
    }

    /// Spawn [`Worker::run`] on the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<WorkerStats>> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until cancelled or the packet source fails.
    ///
    /// Cancellation is a clean exit and returns the counters. A receive failure closes
    /// both sockets and is returned.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<WorkerStats> {
        info!("Ingest loop started");
        let mut buf = [0u8; RECV_BUFFER_LEN];

        let outcome = loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Ingest loop cancelled");
                    break Ok(());
                }
                received = self.source.recv(&mut buf) => received,
            };

            match received {
                Ok(len) => self.process(&buf[..len]).await,
                Err(e) => {
                    error!("Telemetry receive failed: {}", e);
                    self.events.report(BridgeEvent::error(format!(
                        "Application encountered an exception: {e}"
                    )));
                    break Err(e);
                }
            }
        };

        self.shutdown();
        outcome.map(|()| self.stats)
    }

    async fn process(&mut self, datagram: &[u8]) {
        self.stats.packets_received += 1;
        let config = self.config.borrow().clone();
        let diagnostics = config.reports_diagnostics();

        if diagnostics {
            self.events.report(BridgeEvent::verbose("Received message from Forza"));
        }

        let snapshot = match packet::decode(datagram) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                self.stats.packets_skipped += 1;
                trace!("Skipping sled packet");
                return;
            }
            Err(e) => {
                self.stats.packets_skipped += 1;
                debug!("Skipping packet: {}", e);
                return;
            }
        };
        self.stats.packets_decoded += 1;

        if diagnostics {
            self.events.report(BridgeEvent::verbose("Data parsed"));
        }

        let events = self.events.as_ref();
        let tick = self.engine.tick(&snapshot, &config, events);
        for batch in tick {
            if diagnostics {
                match batch.to_json() {
                    Ok(json) => events.report(BridgeEvent::verbose(format!(
                        "Sending message to DSX: {json}"
                    ))),
                    Err(e) => debug!("Batch not serializable: {}", e),
                }
            }

            match self.sink.send_batch(&batch).await {
                Ok(SendOutcome::Sent) => {
                    self.stats.batches_sent += 1;
                    if diagnostics {
                        events.report(BridgeEvent::verbose("Message sent to DSX"));
                    }
                }
                Ok(SendOutcome::Dropped) => self.stats.batches_dropped += 1,
                Err(e) => {
                    self.stats.send_failures += 1;
                    warn!("Abandoning tick: {}", e);
                    break;
                }
            }
        }
    }

    fn shutdown(&mut self) {
        let verbose = self.config.borrow().reports_race_state();
        if verbose {
            self.events.report(BridgeEvent::verbose("Cleaning up"));
        }

        self.source.close();
        self.sink.close();

        info!(
            received = self.stats.packets_received,
            decoded = self.stats.packets_decoded,
            skipped = self.stats.packets_skipped,
            sent = self.stats.batches_sent,
            dropped = self.stats.batches_dropped,
            failures = self.stats.send_failures,
            "Ingest loop stopped"
        );
        if verbose {
            self.events.report(BridgeEvent::verbose("Cleanup finished"));
        }
    }
}

/// Handle to a running bridge.
///
/// Dropping the handle does not stop the worker; call [`BridgeHandle::stop`].
pub struct BridgeHandle {
    cancel: CancellationToken,
    config: ConfigHandle,
    join: JoinHandle<Result<WorkerStats>>,
}

impl BridgeHandle {
    pub fn new(
        cancel: CancellationToken,
        config: ConfigHandle,
        join: JoinHandle<Result<WorkerStats>>,
    ) -> Self {
        Self { cancel, config, join }
    }

    /// Publishes configuration replacements to the running worker.
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Token that stops the worker when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request a cooperative stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker to end.
    pub async fn join(self) -> Result<WorkerStats> {
        self.join.await.map_err(|e| BridgeError::Task { details: e.to_string() })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::packet::PacketVariant;
    use crate::test_utils::{PacketBuilder, RecordingSink};
    use crate::types::{InstructionBatch, TriggerSide};
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Datagrams fed from a channel; a closed channel is a receive failure.
    struct ChannelSource {
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
        closed: Arc<Mutex<bool>>,
    }

    #[async_trait::async_trait]
    impl PacketSource for ChannelSource {
        async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
            match self.rx.recv().await {
                Some(datagram) => {
                    buf[..datagram.len()].copy_from_slice(&datagram);
                    Ok(datagram.len())
                }
                None => Err(BridgeError::Receive {
                    source: io::Error::new(io::ErrorKind::ConnectionAborted, "source gone"),
                }),
            }
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    #[derive(Clone, Default)]
    struct MemorySink {
        sent: Arc<Mutex<Vec<InstructionBatch>>>,
        /// Scripted results; empty means success.
        script: Arc<Mutex<VecDeque<Option<io::ErrorKind>>>>,
        closed: Arc<Mutex<bool>>,
    }

    #[async_trait::async_trait]
    impl InstructionSink for MemorySink {
        async fn send_batch(&mut self, batch: &InstructionBatch) -> Result<SendOutcome> {
            if let Some(Some(kind)) = self.script.lock().unwrap().pop_front() {
                return Err(BridgeError::TransportUnreachable {
                    endpoint: "memory".to_string(),
                    source: io::Error::from(kind),
                });
            }
            self.sent.lock().unwrap().push(batch.clone());
            Ok(SendOutcome::Sent)
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct Harness {
        tx: mpsc::UnboundedSender<Vec<u8>>,
        sink: MemorySink,
        source_closed: Arc<Mutex<bool>>,
        config: ConfigHandle,
        cancel: CancellationToken,
        join: JoinHandle<Result<WorkerStats>>,
    }

    fn start(config: Config, events: Arc<dyn EventSink>) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        let source_closed = Arc::new(Mutex::new(false));
        let source = ChannelSource { rx, closed: source_closed.clone() };
        let sink = MemorySink::default();
        let config = ConfigHandle::new(config);
        let cancel = CancellationToken::new();
        let join =
            Worker::new(source, sink.clone(), config.subscribe(), events).spawn(cancel.clone());
        Harness { tx, sink, source_closed, config, cancel, join }
    }

    fn idle_packet() -> Vec<u8> {
        PacketBuilder::new(PacketVariant::HorizonDash).car(2, 200).build()
    }

    fn racing_packet(rpm: f32) -> Vec<u8> {
        PacketBuilder::new(PacketVariant::LegacyDash)
            .race_on(true)
            .engine(8000.0, 1000.0, rpm)
            .power(1000.0)
            .inputs(255, 0)
            .build()
    }

    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn maps_and_sends_each_packet() {
        let h = start(Config::default(), Arc::new(NullSink));
        h.tx.send(idle_packet()).unwrap();
        h.tx.send(racing_packet(4000.0)).unwrap();
        settle().await;

        h.cancel.cancel();
        let stats = h.join.await.unwrap().unwrap();

        let sent = h.sink.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].instructions.len(), 3);
        assert!(sent[1].trigger(TriggerSide::Right).is_some());
        assert!(sent[2].trigger(TriggerSide::Left).is_some());
        assert!(sent[3].light_bar().is_some());

        assert_eq!(stats.packets_received, 2);
        assert_eq!(stats.packets_decoded, 2);
        assert_eq!(stats.batches_sent, 4);
        assert!(*h.source_closed.lock().unwrap());
        assert!(*h.sink.closed.lock().unwrap());
    }

    #[tokio::test]
    async fn skips_sled_and_unknown_lengths() {
        let h = start(Config::default(), Arc::new(NullSink));
        h.tx.send(PacketBuilder::new(PacketVariant::LegacySled).build()).unwrap();
        h.tx.send(vec![0u8; 100]).unwrap();
        h.tx.send(vec![0u8; RECV_BUFFER_LEN]).unwrap();
        settle().await;

        h.cancel.cancel();
        let stats = h.join.await.unwrap().unwrap();
        assert_eq!(stats.packets_received, 3);
        assert_eq!(stats.packets_skipped, 3);
        assert!(h.sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_send_abandons_rest_of_tick() {
        let h = start(Config::default(), Arc::new(NullSink));
        h.sink.script.lock().unwrap().push_back(Some(io::ErrorKind::ConnectionRefused));

        h.tx.send(racing_packet(4000.0)).unwrap();
        h.tx.send(racing_packet(4100.0)).unwrap();
        settle().await;

        h.cancel.cancel();
        let stats = h.join.await.unwrap().unwrap();
        assert_eq!(stats.send_failures, 1);
        // First tick abandoned after the failed throttle send; second tick complete.
        assert_eq!(h.sink.sent.lock().unwrap().len(), 3);
        assert_eq!(stats.batches_sent, 3);
    }

    #[tokio::test]
    async fn picks_up_replaced_config() {
        let h = start(Config::default(), Arc::new(NullSink));
        h.tx.send(idle_packet()).unwrap();
        settle().await;

        let mut next = Config::default();
        next.network.controller_index = 3;
        h.config.replace(next).unwrap();
        h.tx.send(idle_packet()).unwrap();
        settle().await;

        h.cancel.cancel();
        h.join.await.unwrap().unwrap();
        let sent = h.sink.sent.lock().unwrap().clone();
        assert_eq!(sent[0].instructions[0].parameters()[0], 0);
        assert_eq!(sent[1].instructions[0].parameters()[0], 3);
    }

    #[tokio::test]
    async fn receive_failure_ends_loop_with_error() {
        let events = Arc::new(RecordingSink::default());
        let h = start(Config::default(), events.clone());
        drop(h.tx);

        let result = h.join.await.unwrap();
        assert!(matches!(result, Err(BridgeError::Receive { .. })));
        assert!(*h.source_closed.lock().unwrap());
        assert!(*h.sink.closed.lock().unwrap());
        assert!(
            events
                .events()
                .iter()
                .any(|e| e.message.starts_with("Application encountered an exception"))
        );
    }

    #[tokio::test]
    async fn cancellation_is_not_an_error() {
        let events = Arc::new(RecordingSink::default());
        let h = start(Config::default(), events.clone());
        h.cancel.cancel();
        let stats = h.join.await.unwrap().unwrap();
        assert_eq!(stats, WorkerStats::default());
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn diagnostics_follow_verbosity() {
        let mut config = Config::default();
        config.verbosity = 2;
        let events = Arc::new(RecordingSink::default());
        let h = start(config, events.clone());
        h.tx.send(idle_packet()).unwrap();
        settle().await;
        h.cancel.cancel();
        h.join.await.unwrap().unwrap();

        let messages: Vec<String> = events.events().into_iter().map(|e| e.message).collect();
        assert!(messages.iter().any(|m| m == "Received message from Forza"));
        assert!(
            messages
                .iter()
                .any(|m| m.starts_with("Sending message to DSX: {\"instructions\""))
        );
        assert!(messages.iter().any(|m| m == "Message sent to DSX"));
        assert_eq!(messages.last().map(String::as_str), Some("Cleanup finished"));
    }
}
