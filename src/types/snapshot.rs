//! Decoded telemetry snapshot

use serde::Serialize;

/// Three-axis vector in Forza's car-local frame (X right, Y up, Z forward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One value per wheel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Corners<T> {
    pub front_left: T,
    pub front_right: T,
    pub rear_left: T,
    pub rear_right: T,
}

impl Corners<f32> {
    /// Mean of the absolute values of all four wheels.
    pub fn mean_abs(&self) -> f32 {
        (self.front_left.abs()
            + self.front_right.abs()
            + self.rear_left.abs()
            + self.rear_right.abs())
            / 4.0
    }

    /// Mean of the absolute values of the front axle.
    pub fn front_mean_abs(&self) -> f32 {
        (self.front_left.abs() + self.front_right.abs()) / 2.0
    }

    /// Mean of the absolute values of the rear axle.
    pub fn rear_mean_abs(&self) -> f32 {
        (self.rear_left.abs() + self.rear_right.abs()) / 2.0
    }
}

/// Engine state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineData {
    pub max_rpm: f32,
    pub idle_rpm: f32,
    pub current_rpm: f32,
    /// Watts. Zero or negative when the engine is not driving the car.
    pub power: f32,
    /// Newton meters.
    pub torque: f32,
    pub boost: f32,
}

/// Motion of the car body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MotionData {
    /// m/s², car-local.
    pub acceleration: Vec3,
    /// m/s, car-local.
    pub velocity: Vec3,
    /// rad/s, car-local.
    pub angular_velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    /// World position in meters.
    pub position: Vec3,
    /// m/s.
    pub speed: f32,
}

/// Per-wheel physics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelData {
    /// 0.0 = max stretch, 1.0 = max compression.
    pub normalized_suspension_travel: Corners<f32>,
    pub tire_slip_ratio: Corners<f32>,
    /// rad/s.
    pub rotation_speed: Corners<f32>,
    /// Non-zero when the wheel is on a rumble strip.
    pub on_rumble_strip: Corners<i32>,
    pub puddle_depth: Corners<f32>,
    pub surface_rumble: Corners<f32>,
    pub tire_slip_angle: Corners<f32>,
    /// 0.0 upwards; 1.0 or more means total loss of grip.
    pub tire_combined_slip: Corners<f32>,
    pub suspension_travel_meters: Corners<f32>,
    pub tire_temp: Corners<f32>,
    /// Only carried by the extended (FM8) dash layout.
    pub tire_wear: Option<Corners<f32>>,
}

/// Identity of the car being driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CarData {
    pub ordinal: i32,
    /// 0 (D) through 5 (S2); higher values are X class. Non-positive while in menus.
    pub class: i32,
    /// 0-999 in game, clamped to 255 for color mapping. Non-positive while in menus.
    pub performance_index: i32,
    /// 0 = FWD, 1 = RWD, 2 = AWD.
    pub drivetrain: i32,
    pub num_cylinders: i32,
}

/// Driver controls as raw bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InputData {
    pub accelerator: u8,
    pub brake: u8,
    pub clutch: u8,
    pub handbrake: u8,
    pub gear: u8,
    /// -127 (full left) to 127 (full right).
    pub steer: i8,
    pub normalized_driving_line: i8,
    pub normalized_ai_brake_difference: i8,
}

impl InputData {
    pub fn accelerator_normalized(&self) -> f32 {
        self.accelerator as f32 / 255.0
    }

    pub fn brake_normalized(&self) -> f32 {
        self.brake as f32 / 255.0
    }

    pub fn clutch_normalized(&self) -> f32 {
        self.clutch as f32 / 255.0
    }

    pub fn handbrake_normalized(&self) -> f32 {
        self.handbrake as f32 / 255.0
    }

    pub fn steer_normalized(&self) -> f32 {
        (self.steer as f32 / 127.0).clamp(-1.0, 1.0)
    }
}

/// Lap and race progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LapData {
    pub fuel: f32,
    pub distance_traveled: f32,
    pub best_lap: f32,
    pub last_lap: f32,
    pub current_lap: f32,
    pub current_race_time: f32,
    pub lap_number: u16,
    pub race_position: u8,
    /// Only carried by the extended (FM8) dash layout.
    pub track_ordinal: Option<i32>,
}

/// One decoded Forza telemetry packet.
///
/// Produced by [`crate::packet::decode`] from exactly one datagram and never mutated
/// afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Forza's own race flag. Unreliable in Horizon titles, see
    /// [`crate::mapping::RaceStateTracker`].
    pub is_race_on: bool,
    pub timestamp_ms: u32,
    pub engine: EngineData,
    pub motion: MotionData,
    pub wheels: WheelData,
    pub car: CarData,
    pub inputs: InputData,
    pub lap: LapData,
}
