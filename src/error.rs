//! Error types for the telemetry bridge.
//!
//! All errors implement `std::error::Error` and carry structured context so the ingest
//! loop can decide whether a failure skips a packet, abandons a tick, or ends the run.
//!
//! ## Error Categories
//!
//! - **Decode Errors**: datagrams whose length matches no known Forza layout
//! - **Transport Errors**: outbound DSX socket unreachable, closed, or failing to connect
//! - **Ingest Errors**: binding or reading the inbound telemetry socket
//! - **Config Errors**: unreadable or invalid configuration files
//!
//! ## Recovery
//!
//! ```rust
//! use forza_dsx::BridgeError;
//!
//! let error = BridgeError::UnsupportedPacketLength { len: 17 };
//! assert!(error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for the bridge.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("Unsupported telemetry packet length: {len} bytes")]
    UnsupportedPacketLength { len: usize },

    #[error("DSX endpoint {endpoint} unreachable")]
    TransportUnreachable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("DSX socket to {endpoint} is closed")]
    TransportClosed { endpoint: String },

    #[error("Failed to connect to DSX at {endpoint}")]
    ConnectFailure {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send to DSX: {context}")]
    Transport {
        context: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Failed to bind telemetry socket on port {port}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to receive telemetry")]
    Receive {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize instruction batch")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Ingest task failed: {details}")]
    Task { details: String },

    #[error("Config file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// Returns whether the ingest loop can keep running after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::UnsupportedPacketLength { .. } => true,
            BridgeError::TransportUnreachable { .. } => true,
            BridgeError::TransportClosed { .. } => true,
            BridgeError::Transport { .. } => true,
            BridgeError::Serialization { .. } => true,
            BridgeError::ConnectFailure { .. } => false,
            BridgeError::Bind { .. } => false,
            BridgeError::Receive { .. } => false,
            BridgeError::Task { .. } => false,
            BridgeError::Config { .. } => false,
            BridgeError::ConfigFile { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BridgeError::UnsupportedPacketLength { .. } => vec![
                "Set Forza's Data Out packet format to 'Car Dash'",
                "Check that nothing else is sending to the telemetry port",
            ],
            BridgeError::TransportUnreachable { .. } => vec![
                "Ensure DSX is running",
                "Check the DSX UDP port in DSX settings matches dsx_port",
            ],
            BridgeError::TransportClosed { .. } => {
                vec!["The socket is reopened automatically on the next send"]
            }
            BridgeError::ConnectFailure { .. } => vec![
                "Verify dsx_host resolves to a reachable address",
                "Restart the bridge once DSX is available",
            ],
            BridgeError::Transport { .. } => vec![
                "Check system network resources",
                "Restart the bridge if the error persists",
            ],
            BridgeError::Bind { .. } => vec![
                "Check no other application is using the telemetry port",
                "Choose a different forza_port and update Forza's Data Out port",
            ],
            BridgeError::Receive { .. } => vec![
                "Check system network resources",
                "Restart the bridge",
            ],
            BridgeError::Serialization { .. } => vec!["Report this as a bug"],
            BridgeError::Task { .. } => vec![
                "Check the log for a panic message",
                "Restart the bridge",
            ],
            BridgeError::Config { .. } => vec![
                "Check the value ranges in the configuration file",
                "Delete the offending key to fall back to its default",
            ],
            BridgeError::ConfigFile { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
        }
    }

    /// Helper constructor for configuration validation errors.
    pub fn config(context: impl Into<String>, details: impl Into<String>) -> Self {
        BridgeError::Config { context: context.into(), details: details.into() }
    }

    /// Helper constructor for unclassified transport failures.
    pub fn transport(context: impl Into<String>, source: Option<std::io::Error>) -> Self {
        BridgeError::Transport { context: context.into(), source }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization { source: err }
    }
}

impl From<serde_yaml_ng::Error> for BridgeError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        BridgeError::Config { context: "YAML".to_string(), details: err.to_string() }
    }
}
