//! Forza "Data Out" packet decoding
//!
//! Forza emits one of several fixed binary layouts depending on the title and the
//! selected output format. The layout is identified solely by datagram length:
//!
//! | Length | Variant | Dash shift |
//! |---|---|---|
//! | 232 | [`PacketVariant::LegacySled`] | n/a (not mapped) |
//! | 311 | [`PacketVariant::LegacyDash`] | 0 |
//! | 324 | [`PacketVariant::HorizonDash`] | 12 |
//! | 331 | [`PacketVariant::ExtendedDash`] | 0 |
//!
//! All values are little-endian. Decoding a correctly-sized buffer never fails; the
//! format carries no checksum, so corrupt data decodes to garbage values rather than
//! errors.
//!
//! ```rust
//! use forza_dsx::packet::{self, PacketVariant};
//!
//! let buf = [0u8; 324];
//! assert_eq!(PacketVariant::from_len(buf.len()).unwrap(), PacketVariant::HorizonDash);
//! let snapshot = packet::decode(&buf).unwrap().expect("dash packets decode");
//! assert!(!snapshot.is_race_on);
//! ```

pub mod layout;

use crate::types::{
    CarData, Corners, EngineData, InputData, LapData, MotionData, TelemetrySnapshot, Vec3,
    WheelData,
};
use crate::{BridgeError, Result};

/// Recognized Forza packet layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketVariant {
    /// FM7 "sled": physics only, no driver inputs. Not usable for haptics.
    LegacySled,
    /// FM7 "car dash".
    LegacyDash,
    /// FM8 "car dash" with tire wear and track ordinal.
    ExtendedDash,
    /// Forza Horizon 4/5 "car dash", dash fields shifted by 12 bytes.
    HorizonDash,
}

impl PacketVariant {
    /// Select a variant by exact datagram length.
    pub fn from_len(len: usize) -> Result<Self> {
        match len {
            layout::SLED_LEN => Ok(PacketVariant::LegacySled),
            layout::LEGACY_DASH_LEN => Ok(PacketVariant::LegacyDash),
            layout::EXTENDED_DASH_LEN => Ok(PacketVariant::ExtendedDash),
            layout::HORIZON_DASH_LEN => Ok(PacketVariant::HorizonDash),
            _ => Err(BridgeError::UnsupportedPacketLength { len }),
        }
    }

    /// Total datagram length of this variant.
    pub fn packet_len(self) -> usize {
        match self {
            PacketVariant::LegacySled => layout::SLED_LEN,
            PacketVariant::LegacyDash => layout::LEGACY_DASH_LEN,
            PacketVariant::ExtendedDash => layout::EXTENDED_DASH_LEN,
            PacketVariant::HorizonDash => layout::HORIZON_DASH_LEN,
        }
    }

    /// Shift applied to every dash field offset.
    pub fn dash_offset(self) -> usize {
        match self {
            PacketVariant::HorizonDash => layout::HORIZON_DASH_SHIFT,
            _ => 0,
        }
    }

    /// Whether packets of this variant can drive the mapping engine.
    pub fn is_supported(self) -> bool {
        !matches!(self, PacketVariant::LegacySled)
    }
}

/// Decode one datagram.
///
/// Returns `Ok(None)` for sled packets, which carry no driver inputs and are skipped,
/// and [`BridgeError::UnsupportedPacketLength`] for any unrecognized length.
pub fn decode(buf: &[u8]) -> Result<Option<TelemetrySnapshot>> {
    let variant = PacketVariant::from_len(buf.len())?;
    Ok(decode_variant(variant, buf))
}

/// Decode a buffer whose variant has already been selected.
///
/// Returns `None` for unsupported variants or when `buf` is not exactly
/// `variant.packet_len()` bytes.
pub fn decode_variant(variant: PacketVariant, buf: &[u8]) -> Option<TelemetrySnapshot> {
    if !variant.is_supported() || buf.len() != variant.packet_len() {
        return None;
    }

    let r = Reader { buf, shift: variant.dash_offset() };
    let extended = variant == PacketVariant::ExtendedDash;

    Some(TelemetrySnapshot {
        is_race_on: r.i32(layout::IS_RACE_ON) != 0,
        timestamp_ms: r.u32(layout::TIMESTAMP_MS),
        engine: EngineData {
            max_rpm: r.f32(layout::ENGINE_MAX_RPM),
            idle_rpm: r.f32(layout::ENGINE_IDLE_RPM),
            current_rpm: r.f32(layout::CURRENT_ENGINE_RPM),
            power: r.dash_f32(layout::POWER),
            torque: r.dash_f32(layout::TORQUE),
            boost: r.dash_f32(layout::BOOST),
        },
        motion: MotionData {
            acceleration: r.vec3(layout::ACCELERATION),
            velocity: r.vec3(layout::VELOCITY),
            angular_velocity: r.vec3(layout::ANGULAR_VELOCITY),
            yaw: r.f32(layout::YAW),
            pitch: r.f32(layout::PITCH),
            roll: r.f32(layout::ROLL),
            position: r.vec3(layout::POSITION + r.shift),
            speed: r.dash_f32(layout::SPEED),
        },
        wheels: WheelData {
            normalized_suspension_travel: r.corners_f32(layout::NORMALIZED_SUSPENSION_TRAVEL),
            tire_slip_ratio: r.corners_f32(layout::TIRE_SLIP_RATIO),
            rotation_speed: r.corners_f32(layout::WHEEL_ROTATION_SPEED),
            on_rumble_strip: r.corners_i32(layout::WHEEL_ON_RUMBLE_STRIP),
            puddle_depth: r.corners_f32(layout::WHEEL_IN_PUDDLE_DEPTH),
            surface_rumble: r.corners_f32(layout::SURFACE_RUMBLE),
            tire_slip_angle: r.corners_f32(layout::TIRE_SLIP_ANGLE),
            tire_combined_slip: r.corners_f32(layout::TIRE_COMBINED_SLIP),
            suspension_travel_meters: r.corners_f32(layout::SUSPENSION_TRAVEL_METERS),
            tire_temp: r.corners_f32(layout::TIRE_TEMP + r.shift),
            tire_wear: extended.then(|| r.corners_f32(layout::TIRE_WEAR)),
        },
        car: CarData {
            ordinal: r.i32(layout::CAR_ORDINAL),
            class: r.i32(layout::CAR_CLASS),
            performance_index: r.i32(layout::CAR_PERFORMANCE_INDEX),
            drivetrain: r.i32(layout::DRIVETRAIN_TYPE),
            num_cylinders: r.i32(layout::NUM_CYLINDERS),
        },
        inputs: InputData {
            accelerator: r.dash_u8(layout::ACCELERATOR),
            brake: r.dash_u8(layout::BRAKE),
            clutch: r.dash_u8(layout::CLUTCH),
            handbrake: r.dash_u8(layout::HANDBRAKE),
            gear: r.dash_u8(layout::GEAR),
            steer: r.dash_u8(layout::STEER) as i8,
            normalized_driving_line: r.dash_u8(layout::NORMALIZED_DRIVING_LINE) as i8,
            normalized_ai_brake_difference: r.dash_u8(layout::NORMALIZED_AI_BRAKE_DIFFERENCE)
                as i8,
        },
        lap: LapData {
            fuel: r.dash_f32(layout::FUEL),
            distance_traveled: r.dash_f32(layout::DISTANCE_TRAVELED),
            best_lap: r.dash_f32(layout::BEST_LAP),
            last_lap: r.dash_f32(layout::LAST_LAP),
            current_lap: r.dash_f32(layout::CURRENT_LAP),
            current_race_time: r.dash_f32(layout::CURRENT_RACE_TIME),
            lap_number: r.u16(layout::LAP_NUMBER + r.shift),
            race_position: r.dash_u8(layout::RACE_POSITION),
            track_ordinal: extended.then(|| r.i32(layout::TRACK_ORDINAL)),
        },
    })
}

/// Fixed-offset little-endian reads over a buffer whose length was checked up front.
struct Reader<'a> {
    buf: &'a [u8],
    shift: usize,
}

impl Reader<'_> {
    fn bytes4(&self, offset: usize) -> [u8; 4] {
        let b = self.buf;
        [b[offset], b[offset + 1], b[offset + 2], b[offset + 3]]
    }

    fn f32(&self, offset: usize) -> f32 {
        f32::from_le_bytes(self.bytes4(offset))
    }

    fn i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.bytes4(offset))
    }

    fn u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.bytes4(offset))
    }

    fn u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.buf[offset], self.buf[offset + 1]])
    }

    fn dash_f32(&self, offset: usize) -> f32 {
        self.f32(offset + self.shift)
    }

    fn dash_u8(&self, offset: usize) -> u8 {
        self.buf[offset + self.shift]
    }

    fn vec3(&self, offset: usize) -> Vec3 {
        Vec3 { x: self.f32(offset), y: self.f32(offset + 4), z: self.f32(offset + 8) }
    }

    fn corners_f32(&self, offset: usize) -> Corners<f32> {
        Corners {
            front_left: self.f32(offset),
            front_right: self.f32(offset + 4),
            rear_left: self.f32(offset + 8),
            rear_right: self.f32(offset + 12),
        }
    }

    fn corners_i32(&self, offset: usize) -> Corners<i32> {
        Corners {
            front_left: self.i32(offset),
            front_right: self.i32(offset + 4),
            rear_left: self.i32(offset + 8),
            rear_right: self.i32(offset + 12),
        }
    }
}
