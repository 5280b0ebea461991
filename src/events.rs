//! One-way event reporting
//!
//! The mapping engine and transport never block on, or read back from, whatever displays
//! their messages. They hand a [`BridgeEvent`] to an [`EventSink`] and move on.

use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Which racing summary a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RacingChannel {
    ThrottleVibration,
    Throttle,
    BrakeVibration,
    Brake,
}

/// Kind and severity of a reported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Per-packet diagnostics.
    Verbose,
    /// Idle summary: car class, CPI and light-bar color.
    NoRace,
    /// Per-trigger racing summary.
    Racing(RacingChannel),
    /// Failures the user should see.
    Error,
}

/// A human-readable message tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeEvent {
    pub kind: EventKind,
    pub message: String,
}

impl BridgeEvent {
    pub fn verbose(message: impl Into<String>) -> Self {
        Self { kind: EventKind::Verbose, message: message.into() }
    }

    pub fn no_race(message: impl Into<String>) -> Self {
        Self { kind: EventKind::NoRace, message: message.into() }
    }

    pub fn racing(channel: RacingChannel, message: impl Into<String>) -> Self {
        Self { kind: EventKind::Racing(channel), message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: EventKind::Error, message: message.into() }
    }
}

/// Receiver of reportable events.
pub trait EventSink: Send + Sync {
    fn report(&self, event: BridgeEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn report(&self, _event: BridgeEvent) {}
}

/// Forwards events to `tracing`.
///
/// Diagnostics go to `debug`, summaries to `info` and errors to `error`, all under the
/// `forza_dsx::events` target so they can be filtered separately from lifecycle logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn report(&self, event: BridgeEvent) {
        match event.kind {
            EventKind::Verbose => debug!(target: "forza_dsx::events", "{}", event.message),
            EventKind::NoRace => {
                info!(target: "forza_dsx::events", race = false, "{}", event.message)
            }
            EventKind::Racing(channel) => {
                // Empty racing messages clear a UI line; nothing to log.
                if !event.message.is_empty() {
                    info!(target: "forza_dsx::events", ?channel, "{}", event.message);
                }
            }
            EventKind::Error => error!(target: "forza_dsx::events", "{}", event.message),
        }
    }
}

/// Forwards events over an unbounded channel, e.g. to a UI task.
///
/// Sending never blocks. Events reported after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn report(&self, event: BridgeEvent) {
        let _ = self.tx.send(event);
    }
}
