//! Transport seams for telemetry in and instructions out
//!
//! The ingest loop only talks to a [`PacketSource`] and an [`InstructionSink`]. The UDP
//! implementations live in [`udp`]; tests substitute in-memory ones.

pub mod udp;

pub use udp::{DsxSender, TelemetryListener};

use std::io;

use crate::Result;
use crate::types::InstructionBatch;

/// Source of raw telemetry datagrams.
#[async_trait::async_trait]
pub trait PacketSource: Send + 'static {
    /// Wait for the next datagram and copy it into `buf`.
    ///
    /// Returns the datagram length. Errors are fatal to the ingest loop.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Release the underlying socket. Later receives fail.
    fn close(&mut self);
}

/// Destination for instruction batches.
#[async_trait::async_trait]
pub trait InstructionSink: Send + 'static {
    /// Send one batch as a single message.
    ///
    /// Returns:
    /// - `Ok(SendOutcome::Sent)` - batch handed to the network
    /// - `Ok(SendOutcome::Dropped)` - a recoverable failure was reported and the batch
    ///   discarded
    /// - `Err(e)` - the destination is unreachable; the caller should abandon the tick
    async fn send_batch(&mut self, batch: &InstructionBatch) -> Result<SendOutcome>;

    /// Release the underlying socket. The next send reconnects and drops its batch.
    fn close(&mut self);
}

/// Result of a send that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Dropped,
}

/// How a failed send is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Destination unreachable or access denied: reported and returned to the caller.
    Unreachable,
    /// Socket no longer usable: reconnect once and drop the batch.
    Closed,
    /// Anything else: reported and swallowed.
    Other,
}

/// Classify an outbound socket error.
pub fn classify(kind: io::ErrorKind) -> FailureClass {
    use io::ErrorKind::*;
    match kind {
        ConnectionRefused | ConnectionReset | HostUnreachable | NetworkUnreachable
        | AddrNotAvailable | PermissionDenied => FailureClass::Unreachable,
        NotConnected | BrokenPipe => FailureClass::Closed,
        _ => FailureClass::Other,
    }
}
