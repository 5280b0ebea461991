//! Forza telemetry to DualSense haptics bridge.
//!
//! Listens for Forza "Data Out" UDP packets and turns them into DSX instructions that
//! drive the DualSense adaptive triggers and light bar.
//!
//! # Features
//!
//! - **All Data Out layouts**: FM7 sled/dash, FM8 dash, Forza Horizon dash
//! - **Grip-loss feedback**: throttle and brake triggers vibrate as the tires let go
//! - **Light bar**: car class color in menus, RPM gauge while racing
//! - **Live tuning**: replace the configuration of a running bridge without a restart
//!
//! # Pipeline
//!
//! ```text
//! UDP in -> packet::decode -> mapping::HapticEngine -> transport::DsxSender -> UDP out
//! ```
//!
//! Everything runs on one task ([`worker::Worker`]); decode and mapping are synchronous.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use forza_dsx::{Config, ForzaDsx, TracingSink};
//!
//! #[tokio::main]
//! async fn main() -> forza_dsx::Result<()> {
//!     let bridge = ForzaDsx::start(Config::default(), Arc::new(TracingSink)).await?;
//!     tokio::signal::ctrl_c().await.ok();
//!     bridge.stop();
//!     let stats = bridge.join().await?;
//!     println!("{} packets", stats.packets_received);
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod events;
pub mod mapping;
pub mod packet;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod transport;
pub mod types;
pub mod worker;

pub use config::{Config, ConfigHandle, TriggerEffectMode};
pub use error::*;
pub use events::{BridgeEvent, ChannelSink, EventKind, EventSink, NullSink, TracingSink};
pub use mapping::HapticEngine;
pub use types::*;
pub use worker::{BridgeHandle, Worker, WorkerStats};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use transport::{DsxSender, TelemetryListener};

/// Entry point for running the bridge over UDP.
pub struct ForzaDsx;

impl ForzaDsx {
    /// Bind the telemetry port, connect to DSX and spawn the ingest loop.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration fails validation
    /// - The telemetry port cannot be bound
    ///
    /// A DSX endpoint that cannot be reached is reported through `events` and does not
    /// prevent startup.
    pub async fn start(config: Config, events: Arc<dyn EventSink>) -> Result<BridgeHandle> {
        config.validate()?;

        let listener = TelemetryListener::bind(config.network.forza_port).await?;
        let sender = DsxSender::connect(config.network.dsx_endpoint(), events.clone()).await;
        info!(
            forza_port = listener.port(),
            dsx = sender.endpoint(),
            "Bridge starting"
        );

        let handle = ConfigHandle::new(config);
        let cancel = CancellationToken::new();
        let join = Worker::new(listener, sender, handle.subscribe(), events).spawn(cancel.clone());

        Ok(BridgeHandle::new(cancel, handle, join))
    }
}
