//! Byte offsets of Forza "Data Out" fields.
//!
//! Sled offsets are absolute. Dash offsets are given for the FM7 layout and must be
//! shifted by [`super::PacketVariant::dash_offset`] before reading.

// Packet sizes
pub const SLED_LEN: usize = 232;
pub const LEGACY_DASH_LEN: usize = 311;
pub const HORIZON_DASH_LEN: usize = 324;
pub const EXTENDED_DASH_LEN: usize = 331;

/// Forza Horizon inserts 12 undocumented bytes between the sled and dash sections.
pub const HORIZON_DASH_SHIFT: usize = 12;

// ── Sled section ────────────────────────────────────────────────────────────
pub const IS_RACE_ON: usize = 0; // i32
pub const TIMESTAMP_MS: usize = 4; // u32

pub const ENGINE_MAX_RPM: usize = 8; // f32
pub const ENGINE_IDLE_RPM: usize = 12; // f32
pub const CURRENT_ENGINE_RPM: usize = 16; // f32

pub const ACCELERATION: usize = 20; // f32 x3
pub const VELOCITY: usize = 32; // f32 x3
pub const ANGULAR_VELOCITY: usize = 44; // f32 x3

pub const YAW: usize = 56; // f32
pub const PITCH: usize = 60; // f32
pub const ROLL: usize = 64; // f32

pub const NORMALIZED_SUSPENSION_TRAVEL: usize = 68; // f32 x4
pub const TIRE_SLIP_RATIO: usize = 84; // f32 x4
pub const WHEEL_ROTATION_SPEED: usize = 100; // f32 x4
pub const WHEEL_ON_RUMBLE_STRIP: usize = 116; // i32 x4
pub const WHEEL_IN_PUDDLE_DEPTH: usize = 132; // f32 x4
pub const SURFACE_RUMBLE: usize = 148; // f32 x4
pub const TIRE_SLIP_ANGLE: usize = 164; // f32 x4
pub const TIRE_COMBINED_SLIP: usize = 180; // f32 x4
pub const SUSPENSION_TRAVEL_METERS: usize = 196; // f32 x4

pub const CAR_ORDINAL: usize = 212; // i32
pub const CAR_CLASS: usize = 216; // i32
pub const CAR_PERFORMANCE_INDEX: usize = 220; // i32
pub const DRIVETRAIN_TYPE: usize = 224; // i32
pub const NUM_CYLINDERS: usize = 228; // i32

// ── Dash section (before variant shift) ─────────────────────────────────────
pub const POSITION: usize = 232; // f32 x3
pub const SPEED: usize = 244; // f32
pub const POWER: usize = 248; // f32
pub const TORQUE: usize = 252; // f32
pub const TIRE_TEMP: usize = 256; // f32 x4
pub const BOOST: usize = 272; // f32
pub const FUEL: usize = 276; // f32
pub const DISTANCE_TRAVELED: usize = 280; // f32
pub const BEST_LAP: usize = 284; // f32
pub const LAST_LAP: usize = 288; // f32
pub const CURRENT_LAP: usize = 292; // f32
pub const CURRENT_RACE_TIME: usize = 296; // f32
pub const LAP_NUMBER: usize = 300; // u16
pub const RACE_POSITION: usize = 302; // u8
pub const ACCELERATOR: usize = 303; // u8
pub const BRAKE: usize = 304; // u8
pub const CLUTCH: usize = 305; // u8
pub const HANDBRAKE: usize = 306; // u8
pub const GEAR: usize = 307; // u8
pub const STEER: usize = 308; // i8
pub const NORMALIZED_DRIVING_LINE: usize = 309; // i8
pub const NORMALIZED_AI_BRAKE_DIFFERENCE: usize = 310; // i8

// ── FM8 extension (extended dash only, never shifted) ───────────────────────
pub const TIRE_WEAR: usize = 311; // f32 x4
pub const TRACK_ORDINAL: usize = 327; // i32
