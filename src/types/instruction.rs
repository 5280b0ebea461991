//! Outbound DSX instructions and their wire encoding
//!
//! DSX reads a JSON object with an `instructions` array. Each entry is
//! `{"type": <code>, "parameters": [...]}` where the meaning of each positional
//! parameter depends on the instruction type and trigger mode. The typed variants
//! below are flattened into that positional layout only at serialization time.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// DSX instruction type codes.
pub mod codes {
    pub const TRIGGER_UPDATE: u8 = 1;
    pub const RGB_UPDATE: u8 = 2;

    pub const MODE_NORMAL: i32 = 0;
    pub const MODE_CUSTOM_TRIGGER_VALUE: i32 = 12;
    pub const MODE_RESISTANCE: i32 = 13;

    pub const CUSTOM_VIBRATE_RESISTANCE: i32 = 9;
}

/// Which adaptive trigger an instruction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TriggerSide {
    /// L2, mapped to the brake.
    Left = 1,
    /// R2, mapped to the throttle.
    Right = 2,
}

/// Effect applied to an adaptive trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEffect {
    /// No resistance.
    Normal,
    /// Uniform stiffness.
    Resistance { value: i32 },
    /// Vibration at `frequency` on top of `resistance`, starting at trigger position `start`.
    VibrateResistance { frequency: i32, resistance: i32, start: i32 },
}

impl TriggerEffect {
    /// DSX trigger mode code for this effect.
    pub fn mode_code(&self) -> i32 {
        match self {
            TriggerEffect::Normal => codes::MODE_NORMAL,
            TriggerEffect::Resistance { .. } => codes::MODE_RESISTANCE,
            TriggerEffect::VibrateResistance { .. } => codes::MODE_CUSTOM_TRIGGER_VALUE,
        }
    }
}

/// Light-bar color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
}

/// A single haptic command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticInstruction {
    TriggerUpdate { controller: u8, side: TriggerSide, effect: TriggerEffect },
    LightBarUpdate { controller: u8, color: Rgb },
}

impl HapticInstruction {
    pub fn trigger(controller: u8, side: TriggerSide, effect: TriggerEffect) -> Self {
        HapticInstruction::TriggerUpdate { controller, side, effect }
    }

    pub fn light_bar(controller: u8, color: Rgb) -> Self {
        HapticInstruction::LightBarUpdate { controller, color }
    }

    /// DSX instruction type code.
    pub fn type_code(&self) -> u8 {
        match self {
            HapticInstruction::TriggerUpdate { .. } => codes::TRIGGER_UPDATE,
            HapticInstruction::LightBarUpdate { .. } => codes::RGB_UPDATE,
        }
    }

    /// Positional parameter list in DSX order.
    pub fn parameters(&self) -> Vec<i32> {
        match *self {
            HapticInstruction::TriggerUpdate { controller, side, effect } => {
                let mut params = vec![controller as i32, side as i32, effect.mode_code()];
                match effect {
                    TriggerEffect::Normal => params.extend([0, 0]),
                    TriggerEffect::Resistance { value } => params.extend([0, value]),
                    TriggerEffect::VibrateResistance { frequency, resistance, start } => params
                        .extend([
                            codes::CUSTOM_VIBRATE_RESISTANCE,
                            frequency,
                            resistance,
                            start,
                            0,
                            0,
                            0,
                            0,
                        ]),
                }
                params
            }
            HapticInstruction::LightBarUpdate { controller, color } => {
                vec![controller as i32, color.r as i32, color.g as i32, color.b as i32]
            }
        }
    }
}

impl Serialize for HapticInstruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Instruction", 2)?;
        state.serialize_field("type", &self.type_code())?;
        state.serialize_field("parameters", &self.parameters())?;
        state.end()
    }
}

/// Instructions sent together in one datagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct InstructionBatch {
    pub instructions: Vec<HapticInstruction>,
}

impl InstructionBatch {
    pub fn new(instructions: Vec<HapticInstruction>) -> Self {
        Self { instructions }
    }

    pub fn single(instruction: HapticInstruction) -> Self {
        Self { instructions: vec![instruction] }
    }

    /// Encode as the JSON payload DSX expects.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// First trigger effect for `side`, if the batch carries one.
    pub fn trigger(&self, side: TriggerSide) -> Option<TriggerEffect> {
        self.instructions.iter().find_map(|i| match i {
            HapticInstruction::TriggerUpdate { side: s, effect, .. } if *s == side => Some(*effect),
            _ => None,
        })
    }

    /// First light-bar color, if the batch carries one.
    pub fn light_bar(&self) -> Option<Rgb> {
        self.instructions.iter().find_map(|i| match i {
            HapticInstruction::LightBarUpdate { color, .. } => Some(*color),
            _ => None,
        })
    }
}
