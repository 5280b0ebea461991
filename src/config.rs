//! Bridge configuration
//!
//! Every knob the mapping engine and transport read lives in [`Config`]. Configurations
//! load from YAML, fall back to defaults for missing keys, and are validated before
//! use:
//!
//! ```rust
//! use forza_dsx::config::{Config, TriggerEffectMode};
//!
//! let config = Config::from_yaml_str(
//!     r#"
//! throttle:
//!   mode: resistance
//!   intensity: 0.5
//! network:
//!   dsx_port: 7000
//! "#,
//! )
//! .unwrap();
//! assert_eq!(config.throttle.mode, TriggerEffectMode::Resistance);
//! assert_eq!(config.network.dsx_port, 7000);
//! assert_eq!(config.network.forza_port, 5300);
//! ```
//!
//! A running worker never holds a lock on its configuration. [`ConfigHandle`] publishes
//! whole replacement snapshots over a watch channel and the ingest loop picks up the
//! latest one at the top of each tick.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{BridgeError, Result};

/// Per-trigger feedback selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEffectMode {
    /// Trigger left at normal (no resistance).
    None,
    /// Resistance only, never vibrates.
    Resistance,
    /// Resistance, switching to vibration while losing grip.
    Vibration,
}

/// Right trigger (throttle) tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub mode: TriggerEffectMode,
    /// EWMA alpha for the resistance channel.
    pub ewma_alpha_resistance: f32,
    /// EWMA alpha for the vibration frequency channel.
    pub ewma_alpha_frequency: f32,
    /// Mean combined tire slip above which the car is losing grip.
    pub grip_loss: f32,
    /// Rear-axle slip only counts as grip loss above this accelerator input (0-255).
    pub grip_loss_accelerator_floor: u8,
    /// Combined acceleration (m/s²) mapped to maximum resistance.
    pub acceleration_limit: f32,
    /// Weight of lateral acceleration in the combined acceleration.
    pub turn_accel_weight: f32,
    /// Weight of longitudinal acceleration in the combined acceleration.
    pub forward_accel_weight: f32,
    pub min_resistance: f32,
    pub max_resistance: f32,
    pub min_griploss_stiffness: f32,
    pub max_griploss_stiffness: f32,
    /// Smoothed vibration frequencies at or below this fall back to plain resistance.
    pub min_vibration: f32,
    pub max_vibration: f32,
    /// Trigger position where vibration begins; accelerator inputs at or below it
    /// suppress vibration.
    pub vibration_start: i32,
    pub intensity: f32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            mode: TriggerEffectMode::Vibration,
            ewma_alpha_resistance: 0.01,
            ewma_alpha_frequency: 0.9,
            grip_loss: 0.6,
            grip_loss_accelerator_floor: 200,
            acceleration_limit: 10.0,
            turn_accel_weight: 0.5,
            forward_accel_weight: 1.0,
            min_resistance: 0.0,
            max_resistance: 6.0,
            min_griploss_stiffness: 1.0,
            max_griploss_stiffness: 200.0,
            min_vibration: 3.0,
            max_vibration: 55.0,
            vibration_start: 5,
            intensity: 1.0,
        }
    }
}

/// Left trigger (brake) tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakeConfig {
    pub mode: TriggerEffectMode,
    pub ewma_alpha_resistance: f32,
    pub ewma_alpha_frequency: f32,
    /// Mean combined tire slip above which braking is losing grip.
    pub grip_loss: f32,
    /// Grip loss only counts above this brake input (0-255).
    pub grip_loss_brake_floor: u8,
    pub min_resistance: f32,
    pub max_resistance: f32,
    /// Stiffness at full brake while vibrating.
    pub min_stiffness: f32,
    /// Stiffness at zero brake while vibrating.
    pub max_stiffness: f32,
    pub min_vibration: f32,
    pub max_vibration: f32,
    pub vibration_start: i32,
    pub intensity: f32,
}

impl Default for BrakeConfig {
    fn default() -> Self {
        Self {
            mode: TriggerEffectMode::Vibration,
            ewma_alpha_resistance: 0.5,
            ewma_alpha_frequency: 1.0,
            grip_loss: 0.4,
            grip_loss_brake_floor: 100,
            min_resistance: 0.0,
            max_resistance: 7.0,
            min_stiffness: 1.0,
            max_stiffness: 200.0,
            min_vibration: 3.0,
            max_vibration: 35.0,
            vibration_start: 20,
            intensity: 1.0,
        }
    }
}

/// Light bar tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightBarConfig {
    /// RPM ratio (0-1 between idle and max) at which the bar turns red.
    pub redline_ratio: f32,
}

impl Default for LightBarConfig {
    fn default() -> Self {
        Self { redline_ratio: 0.9 }
    }
}

/// Race detection tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceDetectionConfig {
    /// Consecutive frozen-RPM, zero-power packets after which the race is considered over.
    pub stall_accumulator_limit: u32,
}

impl Default for RaceDetectionConfig {
    fn default() -> Self {
        Self { stall_accumulator_limit: 200 }
    }
}

/// UDP endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Local port Forza sends Data Out packets to.
    pub forza_port: u16,
    pub dsx_host: String,
    pub dsx_port: u16,
    /// DualSense controller index used in every instruction.
    pub controller_index: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            forza_port: 5300,
            dsx_host: "127.0.0.1".to_string(),
            dsx_port: 6969,
            controller_index: 0,
        }
    }
}

impl NetworkConfig {
    /// `host:port` of the DSX endpoint.
    pub fn dsx_endpoint(&self) -> String {
        format!("{}:{}", self.dsx_host, self.dsx_port)
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub throttle: ThrottleConfig,
    pub brake: BrakeConfig,
    pub light_bar: LightBarConfig,
    pub race: RaceDetectionConfig,
    pub network: NetworkConfig,
    /// 0 = errors only, 1 = race summaries, 2 = per-packet diagnostics.
    pub verbosity: u8,
}

impl Config {
    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let yaml = std::fs::read_to_string(path).map_err(|source| BridgeError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Serialize to YAML, e.g. to write out a template.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Whether race summaries should be reported.
    pub fn reports_race_state(&self) -> bool {
        self.verbosity > 0
    }

    /// Whether per-packet diagnostics should be reported.
    pub fn reports_diagnostics(&self) -> bool {
        self.verbosity > 1
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let t = &self.throttle;
        let b = &self.brake;

        for (name, alpha) in [
            ("throttle.ewma_alpha_resistance", t.ewma_alpha_resistance),
            ("throttle.ewma_alpha_frequency", t.ewma_alpha_frequency),
            ("brake.ewma_alpha_resistance", b.ewma_alpha_resistance),
            ("brake.ewma_alpha_frequency", b.ewma_alpha_frequency),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(BridgeError::config(name, format!("{alpha} is outside (0, 1]")));
            }
        }

        for (name, value) in [
            ("throttle.grip_loss", t.grip_loss),
            ("throttle.turn_accel_weight", t.turn_accel_weight),
            ("throttle.forward_accel_weight", t.forward_accel_weight),
            ("throttle.min_resistance", t.min_resistance),
            ("throttle.max_resistance", t.max_resistance),
            ("throttle.min_griploss_stiffness", t.min_griploss_stiffness),
            ("throttle.max_griploss_stiffness", t.max_griploss_stiffness),
            ("throttle.min_vibration", t.min_vibration),
            ("throttle.max_vibration", t.max_vibration),
            ("throttle.intensity", t.intensity),
            ("brake.grip_loss", b.grip_loss),
            ("brake.min_resistance", b.min_resistance),
            ("brake.max_resistance", b.max_resistance),
            ("brake.min_stiffness", b.min_stiffness),
            ("brake.max_stiffness", b.max_stiffness),
            ("brake.min_vibration", b.min_vibration),
            ("brake.max_vibration", b.max_vibration),
            ("brake.intensity", b.intensity),
            ("light_bar.redline_ratio", self.light_bar.redline_ratio),
        ] {
            if !value.is_finite() {
                return Err(BridgeError::config(name, format!("{value} is not a finite number")));
            }
        }

        if !(t.acceleration_limit.is_finite() && t.acceleration_limit > 0.0) {
            return Err(BridgeError::config(
                "throttle.acceleration_limit",
                format!("{} must be positive", t.acceleration_limit),
            ));
        }

        for (name, intensity) in [
            ("throttle.intensity", t.intensity),
            ("brake.intensity", b.intensity),
        ] {
            if intensity < 0.0 {
                return Err(BridgeError::config(name, format!("{intensity} is negative")));
            }
        }

        if self.network.forza_port == 0 {
            return Err(BridgeError::config("network.forza_port", "port 0 is not allowed"));
        }
        if self.network.dsx_port == 0 {
            return Err(BridgeError::config("network.dsx_port", "port 0 is not allowed"));
        }
        if self.network.dsx_host.trim().is_empty() {
            return Err(BridgeError::config("network.dsx_host", "host is empty"));
        }

        Ok(())
    }
}

/// Publishes configuration snapshots to a running worker.
///
/// Cloning the handle shares the same channel, so a settings surface and the binary can
/// both replace the configuration.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<Config>>>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    /// Receiver the ingest loop reads snapshots from.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.tx.subscribe()
    }

    /// The latest published snapshot.
    pub fn current(&self) -> Arc<Config> {
        self.tx.borrow().clone()
    }

    /// Validate and publish a replacement. The worker applies it on its next tick.
    pub fn replace(&self, config: Config) -> Result<()> {
        config.validate()?;
        self.tx.send_replace(Arc::new(config));
        debug!("Configuration replaced");
        Ok(())
    }
}
