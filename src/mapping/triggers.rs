//! Adaptive trigger effects for throttle (R2) and brake (L2)

use super::MAX_SLIP;
use super::curve::map_floor;
use super::filter::ChannelFilter;
use crate::config::{BrakeConfig, ThrottleConfig, TriggerEffectMode};
use crate::types::{Corners, TriggerEffect, Vec3};

/// Combined tire slip averaged over the car and per axle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlipSummary {
    pub combined: f32,
    pub front: f32,
    pub rear: f32,
}

impl SlipSummary {
    pub fn from_wheels(combined_slip: &Corners<f32>) -> Self {
        Self {
            combined: combined_slip.mean_abs(),
            front: combined_slip.front_mean_abs(),
            rear: combined_slip.rear_mean_abs(),
        }
    }
}

/// Apply an intensity multiplier and floor to the integer DSX expects.
pub fn scale(value: i32, intensity: f32) -> i32 {
    (value as f32 * intensity).floor() as i32
}

/// Which branch produced a trigger effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPath {
    /// Mode is `none`.
    Off,
    /// Grip-loss vibration branch, including its fallback to resistance.
    Vibration,
    /// Plain resistance.
    Resistance,
}

/// Effect for one trigger plus the smoothed values reported for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOutcome {
    pub effect: TriggerEffect,
    pub path: TriggerPath,
    pub frequency: i32,
    pub resistance: i32,
}

impl TriggerOutcome {
    fn off() -> Self {
        Self { effect: TriggerEffect::Normal, path: TriggerPath::Off, frequency: 0, resistance: 0 }
    }
}

/// Weighted magnitude of lateral (X) and longitudinal (Z) acceleration.
pub fn average_acceleration(acceleration: &Vec3, config: &ThrottleConfig) -> f32 {
    (config.turn_accel_weight * acceleration.x * acceleration.x
        + config.forward_accel_weight * acceleration.z * acceleration.z)
        .sqrt()
}

/// Front wheels slipping, or rears slipping under heavy throttle.
pub fn throttle_losing_grip(slip: &SlipSummary, accelerator: u8, config: &ThrottleConfig) -> bool {
    slip.front > config.grip_loss
        || (slip.rear > config.grip_loss && accelerator > config.grip_loss_accelerator_floor)
}

/// Wheels slipping while braking hard.
pub fn brake_losing_grip(slip: &SlipSummary, brake: u8, config: &BrakeConfig) -> bool {
    slip.combined > config.grip_loss && brake > config.grip_loss_brake_floor
}

/// Right trigger effect.
pub fn throttle_effect(
    avg_accel: f32,
    slip: &SlipSummary,
    accelerator: u8,
    config: &ThrottleConfig,
    filter: &mut ChannelFilter,
) -> TriggerOutcome {
    match config.mode {
        TriggerEffectMode::None => TriggerOutcome::off(),
        TriggerEffectMode::Vibration if throttle_losing_grip(slip, accelerator, config) => {
            let frequency = map_floor(
                slip.combined,
                config.grip_loss,
                MAX_SLIP,
                0.0,
                config.max_vibration,
            );
            let resistance = map_floor(
                avg_accel,
                0.0,
                config.acceleration_limit,
                config.min_griploss_stiffness,
                config.max_griploss_stiffness,
            );
            let resistance = filter.resistance.update(resistance, config.ewma_alpha_resistance);
            let frequency = filter.frequency.update(frequency, config.ewma_alpha_frequency);

            if frequency as f32 <= config.min_vibration
                || i32::from(accelerator) <= config.vibration_start
            {
                TriggerOutcome {
                    effect: TriggerEffect::Resistance {
                        value: scale(resistance, config.intensity),
                    },
                    path: TriggerPath::Vibration,
                    frequency: 0,
                    resistance: 0,
                }
            } else {
                TriggerOutcome {
                    effect: TriggerEffect::VibrateResistance {
                        frequency: scale(frequency, config.intensity),
                        resistance: scale(resistance, config.intensity),
                        start: scale(config.vibration_start, config.intensity),
                    },
                    path: TriggerPath::Vibration,
                    frequency,
                    resistance,
                }
            }
        }
        _ => {
            let resistance = map_floor(
                avg_accel,
                0.0,
                config.acceleration_limit,
                config.min_resistance,
                config.max_resistance,
            );
            let resistance = filter.resistance.update(resistance, config.ewma_alpha_resistance);
            TriggerOutcome {
                effect: TriggerEffect::Resistance { value: scale(resistance, config.intensity) },
                path: TriggerPath::Resistance,
                frequency: 0,
                resistance,
            }
        }
    }
}

/// Left trigger effect.
pub fn brake_effect(
    slip: &SlipSummary,
    brake: u8,
    config: &BrakeConfig,
    filter: &mut ChannelFilter,
) -> TriggerOutcome {
    let brake_input = f32::from(brake);
    match config.mode {
        TriggerEffectMode::None => TriggerOutcome::off(),
        TriggerEffectMode::Vibration if brake_losing_grip(slip, brake, config) => {
            let frequency = map_floor(
                slip.combined,
                config.grip_loss,
                MAX_SLIP,
                0.0,
                config.max_vibration,
            );
            // Stiffness falls as the pedal goes down.
            let resistance =
                map_floor(brake_input, 0.0, 255.0, config.max_stiffness, config.min_stiffness);
            let resistance = filter.resistance.update(resistance, config.ewma_alpha_resistance);
            let frequency = filter.frequency.update(frequency, config.ewma_alpha_frequency);

            let effect = if frequency as f32 <= config.min_vibration {
                TriggerEffect::Resistance { value: 0 }
            } else {
                TriggerEffect::VibrateResistance {
                    frequency: scale(frequency, config.intensity),
                    resistance: scale(resistance, config.intensity),
                    start: scale(config.vibration_start, config.intensity),
                }
            };
            TriggerOutcome { effect, path: TriggerPath::Vibration, frequency, resistance }
        }
        _ => {
            let resistance =
                map_floor(brake_input, 0.0, 255.0, config.min_resistance, config.max_resistance);
            let resistance = filter.resistance.update(resistance, config.ewma_alpha_resistance);
            TriggerOutcome {
                effect: TriggerEffect::Resistance { value: scale(resistance, config.intensity) },
                path: TriggerPath::Resistance,
                frequency: 0,
                resistance,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::filter::FilterBank;

    fn uniform_slip(value: f32) -> SlipSummary {
        SlipSummary { combined: value, front: value, rear: value }
    }

    #[test]
    fn slip_summary_uses_axle_means() {
        let wheels =
            Corners { front_left: 1.0, front_right: -1.0, rear_left: 3.0, rear_right: 3.0 };
        let slip = SlipSummary::from_wheels(&wheels);
        assert_eq!(slip, SlipSummary { combined: 2.0, front: 1.0, rear: 3.0 });
    }

    #[test]
    fn scale_floors() {
        assert_eq!(scale(7, 0.5), 3);
        assert_eq!(scale(200, 1.0), 200);
        assert_eq!(scale(-3, 0.5), -2);
        assert_eq!(scale(55, 0.0), 0);
    }

    #[test]
    fn average_acceleration_weights_axes() {
        let config = ThrottleConfig {
            turn_accel_weight: 0.25,
            forward_accel_weight: 1.0,
            ..Default::default()
        };
        let accel = Vec3 { x: 4.0, y: 100.0, z: 3.0 };
        // sqrt(0.25 * 16 + 9) = sqrt(13)
        assert_eq!(average_acceleration(&accel, &config), 13f32.sqrt());
    }

    #[test]
    fn rear_slip_needs_heavy_throttle() {
        let config = ThrottleConfig::default();
        let slip = SlipSummary { combined: 0.5, front: 0.1, rear: 1.0 };
        assert!(!throttle_losing_grip(&slip, 200, &config));
        assert!(throttle_losing_grip(&slip, 201, &config));

        let slip = SlipSummary { combined: 0.5, front: 0.7, rear: 0.0 };
        assert!(throttle_losing_grip(&slip, 0, &config));
    }

    #[test]
    fn throttle_off_mode_is_normal() {
        let config = ThrottleConfig { mode: TriggerEffectMode::None, ..Default::default() };
        let mut filters = FilterBank::default();
        let outcome = throttle_effect(5.0, &uniform_slip(3.0), 255, &config, &mut filters.throttle);
        assert_eq!(outcome.effect, TriggerEffect::Normal);
        assert_eq!(outcome.path, TriggerPath::Off);
        assert_eq!(filters, FilterBank::default());
    }

    #[test]
    fn throttle_resistance_tracks_acceleration() {
        let config = ThrottleConfig {
            mode: TriggerEffectMode::Resistance,
            ewma_alpha_resistance: 1.0,
            ..Default::default()
        };
        let mut filters = FilterBank::default();
        // 5 m/s² of 10 maps halfway into 0..6
        let outcome = throttle_effect(5.0, &uniform_slip(3.0), 255, &config, &mut filters.throttle);
        assert_eq!(outcome.effect, TriggerEffect::Resistance { value: 3 });
        assert_eq!(outcome.path, TriggerPath::Resistance);
        assert_eq!(filters.throttle.resistance.value(), 3);
    }

    #[test]
    fn throttle_vibrates_when_losing_grip() {
        let config = ThrottleConfig {
            ewma_alpha_resistance: 1.0,
            ewma_alpha_frequency: 1.0,
            intensity: 0.5,
            ..Default::default()
        };
        let mut filters = FilterBank::default();
        // slip 2.8 of [0.6, 5] -> 0.5 * 55 = 27.5; accel 10 of 10 -> 200
        let outcome =
            throttle_effect(10.0, &uniform_slip(2.8), 255, &config, &mut filters.throttle);
        assert_eq!(outcome.frequency, 27);
        assert_eq!(outcome.resistance, 200);
        assert_eq!(
            outcome.effect,
            TriggerEffect::VibrateResistance { frequency: 13, resistance: 100, start: 2 }
        );
    }

    #[test]
    fn throttle_vibration_degrades_below_min_frequency() {
        let config = ThrottleConfig {
            ewma_alpha_resistance: 1.0,
            ewma_alpha_frequency: 1.0,
            min_vibration: 10.0,
            ..Default::default()
        };
        let mut filters = FilterBank::default();
        // slip just past grip loss maps to a frequency of 0
        let outcome =
            throttle_effect(10.0, &uniform_slip(0.61), 255, &config, &mut filters.throttle);
        assert_eq!(outcome.effect, TriggerEffect::Resistance { value: 200 });
        assert_eq!(outcome.path, TriggerPath::Vibration);
        assert_eq!((outcome.frequency, outcome.resistance), (0, 0));
        // Filter state keeps the smoothed values.
        assert_eq!(filters.throttle.resistance.value(), 200);
    }

    #[test]
    fn throttle_vibration_degrades_at_vibration_start() {
        let config = ThrottleConfig {
            ewma_alpha_resistance: 1.0,
            ewma_alpha_frequency: 1.0,
            vibration_start: 5,
            ..Default::default()
        };
        let mut filters = FilterBank::default();
        let slip = SlipSummary { combined: 4.0, front: 4.0, rear: 4.0 };
        let outcome = throttle_effect(0.0, &slip, 5, &config, &mut filters.throttle);
        assert!(matches!(outcome.effect, TriggerEffect::Resistance { .. }));
        assert_eq!((outcome.frequency, outcome.resistance), (0, 0));
    }

    #[test]
    fn grip_loss_at_or_past_slip_ceiling_maps_to_zero_frequency() {
        let mut filters = FilterBank::default();
        for grip_loss in [MAX_SLIP, 7.5] {
            let config = ThrottleConfig {
                grip_loss,
                ewma_alpha_resistance: 1.0,
                ewma_alpha_frequency: 1.0,
                ..Default::default()
            };
            let slip = uniform_slip(grip_loss + 1.0);
            assert!(throttle_losing_grip(&slip, 255, &config));

            let outcome = throttle_effect(10.0, &slip, 255, &config, &mut filters.throttle);
            assert_eq!(outcome.path, TriggerPath::Vibration);
            assert_eq!(outcome.effect, TriggerEffect::Resistance { value: 200 });
            assert_eq!(filters.throttle.frequency.value(), 0);
        }
    }

    #[test]
    fn brake_resistance_follows_pedal() {
        let config = BrakeConfig {
            mode: TriggerEffectMode::Resistance,
            ewma_alpha_resistance: 1.0,
            ..Default::default()
        };
        let mut filters = FilterBank::default();
        let outcome = brake_effect(&uniform_slip(0.0), 255, &config, &mut filters.brake);
        assert_eq!(outcome.effect, TriggerEffect::Resistance { value: 7 });

        let outcome = brake_effect(&uniform_slip(0.0), 0, &config, &mut filters.brake);
        assert_eq!(outcome.effect, TriggerEffect::Resistance { value: 0 });
    }

    #[test]
    fn brake_default_smoothing_starts_from_stiff() {
        let config = BrakeConfig::default();
        let mut filters = FilterBank::default();
        // No grip loss: 0.5 * 0 + 0.5 * 200
        let outcome = brake_effect(&uniform_slip(0.0), 0, &config, &mut filters.brake);
        assert_eq!(outcome.resistance, 100);
        assert_eq!(outcome.path, TriggerPath::Resistance);
    }

    #[test]
    fn brake_vibration_inverts_stiffness() {
        let config = BrakeConfig {
            ewma_alpha_resistance: 1.0,
            ewma_alpha_frequency: 1.0,
            ..Default::default()
        };
        let mut filters = FilterBank::default();
        // slip 2.7 of [0.4, 5] -> 0.5 * 35 = 17.5; full brake -> min stiffness
        let outcome = brake_effect(&uniform_slip(2.7), 255, &config, &mut filters.brake);
        assert_eq!(outcome.frequency, 17);
        assert_eq!(outcome.resistance, 1);
        assert_eq!(
            outcome.effect,
            TriggerEffect::VibrateResistance { frequency: 17, resistance: 1, start: 20 }
        );
    }

    #[test]
    fn brake_low_frequency_emits_literal_zero() {
        let config = BrakeConfig {
            ewma_alpha_resistance: 1.0,
            ewma_alpha_frequency: 1.0,
            ..Default::default()
        };
        let mut filters = FilterBank::default();
        let outcome = brake_effect(&uniform_slip(0.5), 101, &config, &mut filters.brake);
        assert_eq!(outcome.effect, TriggerEffect::Resistance { value: 0 });
        assert!(outcome.resistance > 0);
    }

    #[test]
    fn brake_grip_loss_needs_pedal() {
        let config = BrakeConfig::default();
        assert!(!brake_losing_grip(&uniform_slip(3.0), 100, &config));
        assert!(brake_losing_grip(&uniform_slip(3.0), 101, &config));
        assert!(!brake_losing_grip(&uniform_slip(0.4), 255, &config));
    }
}
