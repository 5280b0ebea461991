//! Core types shared by the decoder, mapping engine and transport.
//!
//! - [`TelemetrySnapshot`] is one decoded Forza packet, grouped by domain
//!   (engine, motion, wheels, car identity, inputs, lap progress)
//! - [`HapticInstruction`] is one typed DSX command; [`InstructionBatch`] is the
//!   unit the transport sends as a single datagram
//!
//! ## Usage Example
//!
//! ```rust
//! use forza_dsx::types::{HapticInstruction, InstructionBatch, Rgb, TriggerEffect, TriggerSide};
//!
//! let batch = InstructionBatch::new(vec![
//!     HapticInstruction::light_bar(0, Rgb::new(255, 0, 0)),
//!     HapticInstruction::trigger(0, TriggerSide::Right, TriggerEffect::Resistance { value: 4 }),
//! ]);
//! let json = batch.to_json().unwrap();
//! assert!(json.starts_with(r#"{"instructions":["#));
//! ```

mod instruction;
mod snapshot;

pub use instruction::{
    HapticInstruction, InstructionBatch, Rgb, TriggerEffect, TriggerSide, codes,
};
pub use snapshot::{
    CarData, Corners, EngineData, InputData, LapData, MotionData, TelemetrySnapshot, Vec3,
    WheelData,
};
