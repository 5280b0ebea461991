//! UDP transport: Forza telemetry in, DSX instructions out

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::{UdpSocket, lookup_host};
use tracing::{debug, info, trace, warn};

use super::{FailureClass, InstructionSink, PacketSource, SendOutcome, classify};
use crate::events::{BridgeEvent, EventSink};
use crate::types::InstructionBatch;
use crate::{BridgeError, Result};

/// Socket Forza sends Data Out packets to.
#[derive(Debug)]
pub struct TelemetryListener {
    socket: Option<UdpSocket>,
    port: u16,
}

impl TelemetryListener {
    /// Bind `0.0.0.0:<port>`. Port 0 picks an ephemeral port.
    pub async fn bind(port: u16) -> Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let socket =
            UdpSocket::bind(addr).await.map_err(|source| BridgeError::Bind { port, source })?;
        let port = socket.local_addr().map(|a| a.port()).unwrap_or(port);
        info!("Listening for Forza telemetry on UDP port {}", port);
        Ok(Self { socket: Some(socket), port })
    }

    /// Bound address, or `None` once closed.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait::async_trait]
impl PacketSource for TelemetryListener {
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let socket = self.socket.as_ref().ok_or_else(|| BridgeError::Receive {
            source: io::Error::new(io::ErrorKind::NotConnected, "telemetry socket closed"),
        })?;
        let len = socket.recv(buf).await.map_err(|source| BridgeError::Receive { source })?;
        trace!("Received {} byte datagram", len);
        Ok(len)
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("Telemetry socket on port {} closed", self.port);
        }
    }
}

enum Link {
    Connected(UdpSocket),
    /// The last connect attempt failed; sends are dropped until restart.
    Failed,
    /// Closed on purpose; the next send reconnects.
    Closed,
}

/// Connected socket to the DSX instruction endpoint.
pub struct DsxSender {
    endpoint: String,
    link: Link,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for DsxSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsxSender")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl DsxSender {
    /// Open a socket connected to `endpoint` (`host:port`).
    ///
    /// A failed connect is reported to `events` and leaves the sender in a failed state
    /// rather than returning an error; every later send is reported and dropped.
    pub async fn connect(endpoint: impl Into<String>, events: Arc<dyn EventSink>) -> Self {
        let endpoint = endpoint.into();
        events.report(BridgeEvent::verbose(format!(
            "DSX is using {endpoint}. Attempting to connect.."
        )));

        let link = match open(&endpoint).await {
            Ok(socket) => {
                info!("Connected to DSX at {}", endpoint);
                Link::Connected(socket)
            }
            Err(e) => {
                warn!("{}", e);
                events.report(BridgeEvent::error(connect_message(&e)));
                Link::Failed
            }
        };

        Self { endpoint, link, events }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.link, Link::Connected(_))
    }

    /// Whether the last connect attempt failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.link, Link::Failed)
    }

    async fn reconnect(&mut self) {
        self.link = match open(&self.endpoint).await {
            Ok(socket) => {
                debug!("Reconnected to DSX at {}", self.endpoint);
                Link::Connected(socket)
            }
            Err(e) => {
                warn!("{}", e);
                self.events.report(BridgeEvent::error(connect_message(&e)));
                Link::Failed
            }
        };
    }

    async fn handle_failure(&mut self, error: io::Error) -> Result<SendOutcome> {
        self.events.report(BridgeEvent::error(format!("Error sending message: {error}")));
        match classify(error.kind()) {
            FailureClass::Unreachable => {
                self.events.report(BridgeEvent::error(format!("Couldn't access port. {error}")));
                Err(BridgeError::TransportUnreachable {
                    endpoint: self.endpoint.clone(),
                    source: error,
                })
            }
            FailureClass::Closed => {
                self.events.report(BridgeEvent::error("Connection closed. Restarting..."));
                self.reconnect().await;
                Ok(SendOutcome::Dropped)
            }
            FailureClass::Other => {
                self.events.report(BridgeEvent::error(format!("Unknown error: {error}")));
                let unknown = BridgeError::transport(self.endpoint.clone(), Some(error));
                warn!("{}", unknown);
                Ok(SendOutcome::Dropped)
            }
        }
    }
}

#[async_trait::async_trait]
impl InstructionSink for DsxSender {
    async fn send_batch(&mut self, batch: &InstructionBatch) -> Result<SendOutcome> {
        let payload = batch.to_json()?;

        let result = match &self.link {
            Link::Connected(socket) => socket.send(payload.as_bytes()).await,
            Link::Closed => {
                let closed = BridgeError::TransportClosed { endpoint: self.endpoint.clone() };
                debug!("{}", closed);
                self.events.report(BridgeEvent::error("Connection closed. Restarting..."));
                self.reconnect().await;
                return Ok(SendOutcome::Dropped);
            }
            Link::Failed => {
                self.events.report(BridgeEvent::error(format!(
                    "Unknown error: not connected to DSX at {}",
                    self.endpoint
                )));
                return Ok(SendOutcome::Dropped);
            }
        };

        match result {
            Ok(_) => {
                trace!("Sent {} byte batch to DSX", payload.len());
                Ok(SendOutcome::Sent)
            }
            Err(error) => self.handle_failure(error).await,
        }
    }

    fn close(&mut self) {
        if self.is_connected() {
            debug!("DSX socket to {} closed", self.endpoint);
        }
        if !self.is_failed() {
            self.link = Link::Closed;
        }
    }
}

/// Resolve `endpoint`, bind an ephemeral local socket of the same family and connect.
async fn open(endpoint: &str) -> Result<UdpSocket> {
    let failure =
        |source: io::Error| BridgeError::ConnectFailure { endpoint: endpoint.to_string(), source };

    let target = lookup_host(endpoint).await.map_err(failure)?.next().ok_or_else(|| {
        failure(io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses for host"))
    })?;
    let local = if target.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };

    let socket = UdpSocket::bind(local).await.map_err(failure)?;
    socket.connect(target).await.map_err(failure)?;
    Ok(socket)
}

fn connect_message(error: &BridgeError) -> String {
    match std::error::Error::source(error) {
        Some(source) => format!("Error connecting: {error}: {source}"),
        None => format!("Error connecting: {error}"),
    }
}
