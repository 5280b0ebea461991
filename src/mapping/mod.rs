//! Telemetry to haptics mapping
//!
//! [`HapticEngine`] owns every piece of state that survives between packets: the race
//! debounce, the trigger filters and the remembered car class. Each packet produces a
//! [`Tick`], an iterator over the instruction batches to send for it:
//!
//! - not racing: one batch `{light bar, left trigger, right trigger}` with both triggers
//!   released and the light bar showing the car's class color;
//! - racing: three batches, right trigger, then left trigger, then the RPM light bar.
//!
//! Batches are computed on demand. A caller that stops iterating part way through a
//! tick leaves the filters of the channels it never reached untouched.
//!
//! ```rust
//! use forza_dsx::config::Config;
//! use forza_dsx::events::NullSink;
//! use forza_dsx::mapping::HapticEngine;
//! use forza_dsx::types::{Rgb, TelemetrySnapshot, TriggerEffect, TriggerSide};
//!
//! let config = Config::default();
//! let mut engine = HapticEngine::new(&config);
//!
//! let mut snapshot = TelemetrySnapshot::default();
//! snapshot.car.class = 2;
//! snapshot.car.performance_index = 200;
//!
//! let batches = engine.map(&snapshot, &config, &NullSink);
//! assert_eq!(batches.len(), 1);
//! assert_eq!(batches[0].light_bar(), Some(Rgb::new(165, 70, 29)));
//! assert_eq!(batches[0].trigger(TriggerSide::Left), Some(TriggerEffect::Normal));
//! ```

mod color;
mod curve;
mod filter;
mod race_state;
mod triggers;

pub use color::{CLASS_TIERS, CLASS_X, CarClassMemory, MAX_CPI, class_color, rpm_color, rpm_ratio};
pub use curve::map_range;
pub use filter::{ChannelFilter, Ewma, FilterBank, ewma};
pub use race_state::{DEFAULT_STALL_LIMIT, RaceStateTracker};
pub use triggers::{
    SlipSummary, TriggerOutcome, TriggerPath, average_acceleration, brake_effect,
    brake_losing_grip, scale, throttle_effect, throttle_losing_grip,
};

use tracing::trace;

use crate::config::Config;
use crate::events::{BridgeEvent, EventSink, RacingChannel};
use crate::types::{
    HapticInstruction, InstructionBatch, TelemetrySnapshot, TriggerEffect, TriggerSide,
};

/// Combined slip treated as the top of the vibration frequency range.
pub const MAX_SLIP: f32 = 5.0;

/// Long-lived mapping state.
#[derive(Debug, Clone, Default)]
pub struct HapticEngine {
    race: RaceStateTracker,
    filters: FilterBank,
    car: CarClassMemory,
}

impl HapticEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            race: RaceStateTracker::new(config.race.stall_accumulator_limit),
            filters: FilterBank::default(),
            car: CarClassMemory::default(),
        }
    }

    /// Begin mapping one packet.
    ///
    /// Race state and car memory are updated immediately; trigger filters only as the
    /// returned iterator reaches each channel.
    pub fn tick<'a>(
        &'a mut self,
        snapshot: &'a TelemetrySnapshot,
        config: &'a Config,
        events: &'a dyn EventSink,
    ) -> Tick<'a> {
        self.race.set_limit(config.race.stall_accumulator_limit);
        let in_race = self.race.update(
            snapshot.is_race_on,
            snapshot.engine.current_rpm,
            snapshot.engine.power,
        );
        self.car.observe(snapshot.car.class, snapshot.car.performance_index);

        trace!(
            in_race,
            flag = snapshot.is_race_on,
            stall = self.race.stall_accumulator(),
            "Mapping packet"
        );

        Tick {
            engine: self,
            snapshot,
            config,
            events,
            slip: SlipSummary::from_wheels(&snapshot.wheels.tire_combined_slip),
            in_race,
            stage: if in_race { Stage::Throttle } else { Stage::Idle },
        }
    }

    /// Map one packet and collect every batch.
    pub fn map(
        &mut self,
        snapshot: &TelemetrySnapshot,
        config: &Config,
        events: &dyn EventSink,
    ) -> Vec<InstructionBatch> {
        self.tick(snapshot, config, events).collect()
    }

    pub fn race_state(&self) -> &RaceStateTracker {
        &self.race
    }

    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    pub fn car_memory(&self) -> &CarClassMemory {
        &self.car
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Throttle,
    Brake,
    LightBar,
    Done,
}

/// Instruction batches for one packet, computed lazily.
pub struct Tick<'a> {
    engine: &'a mut HapticEngine,
    snapshot: &'a TelemetrySnapshot,
    config: &'a Config,
    events: &'a dyn EventSink,
    slip: SlipSummary,
    in_race: bool,
    stage: Stage,
}

impl Tick<'_> {
    /// Effective race state for this packet.
    pub fn in_race(&self) -> bool {
        self.in_race
    }

    fn controller(&self) -> u8 {
        self.config.network.controller_index
    }

    fn summary(&self, event: BridgeEvent) {
        if self.config.reports_race_state() {
            self.events.report(event);
        }
    }

    fn idle(&mut self) -> InstructionBatch {
        let memory = self.engine.car;
        let color = memory.color();
        self.summary(BridgeEvent::no_race(format!(
            "No race going on. Normal Triggers. Car's Class = {}; CPI = {}; CPI Ratio = {}; Color [{}, {}, {}]",
            memory.class(),
            memory.performance_index(),
            memory.cpi_ratio(),
            color.r,
            color.g,
            color.b
        )));

        let controller = self.controller();
        InstructionBatch::new(vec![
            HapticInstruction::light_bar(controller, color),
            HapticInstruction::trigger(controller, TriggerSide::Left, TriggerEffect::Normal),
            HapticInstruction::trigger(controller, TriggerSide::Right, TriggerEffect::Normal),
        ])
    }

    fn throttle(&mut self) -> InstructionBatch {
        let config: &Config = self.config;
        let config = &config.throttle;
        let accelerator = self.snapshot.inputs.accelerator;
        let avg_accel = average_acceleration(&self.snapshot.motion.acceleration, config);
        let outcome = throttle_effect(
            avg_accel,
            &self.slip,
            accelerator,
            config,
            &mut self.engine.filters.throttle,
        );

        match outcome.path {
            TriggerPath::Vibration => self.summary(BridgeEvent::racing(
                RacingChannel::ThrottleVibration,
                format!(
                    "Setting Throttle to vibration mode with freq: {}, Resistance: {}",
                    outcome.frequency, outcome.resistance
                ),
            )),
            TriggerPath::Resistance => {
                self.summary(BridgeEvent::racing(RacingChannel::ThrottleVibration, String::new()))
            }
            TriggerPath::Off => {}
        }
        self.summary(BridgeEvent::racing(
            RacingChannel::Throttle,
            format!(
                "Average Acceleration: {}; Throttle Resistance: {}; Accelerator: {}",
                avg_accel, outcome.resistance, accelerator
            ),
        ));

        InstructionBatch::single(HapticInstruction::trigger(
            self.controller(),
            TriggerSide::Right,
            outcome.effect,
        ))
    }

    fn brake(&mut self) -> InstructionBatch {
        let brake = self.snapshot.inputs.brake;
        let outcome =
            brake_effect(&self.slip, brake, &self.config.brake, &mut self.engine.filters.brake);

        match outcome.path {
            TriggerPath::Vibration => self.summary(BridgeEvent::racing(
                RacingChannel::BrakeVibration,
                format!(
                    "Setting Brake to vibration mode with freq: {}, Resistance: {}",
                    outcome.frequency, outcome.resistance
                ),
            )),
            TriggerPath::Resistance => {
                self.summary(BridgeEvent::racing(RacingChannel::BrakeVibration, String::new()))
            }
            TriggerPath::Off => {}
        }
        self.summary(BridgeEvent::racing(
            RacingChannel::Brake,
            format!(
                "Brake: {}; Brake Resistance: {}; Tire Slip: {}",
                brake, outcome.resistance, self.slip.combined
            ),
        ));

        InstructionBatch::single(HapticInstruction::trigger(
            self.controller(),
            TriggerSide::Left,
            outcome.effect,
        ))
    }

    fn light_bar(&mut self) -> InstructionBatch {
        let engine = &self.snapshot.engine;
        let color = rpm_color(
            engine.current_rpm,
            engine.idle_rpm,
            engine.max_rpm,
            self.config.light_bar.redline_ratio,
        );

        if self.config.reports_diagnostics() {
            self.events.report(BridgeEvent::verbose(format!(
                "Engine RPM: {}; Engine Max RPM: {}; Engine Idle RPM: {}",
                engine.current_rpm, engine.max_rpm, engine.idle_rpm
            )));
        }

        InstructionBatch::single(HapticInstruction::light_bar(self.controller(), color))
    }
}

impl Iterator for Tick<'_> {
    type Item = InstructionBatch;

    fn next(&mut self) -> Option<InstructionBatch> {
        let (batch, next) = match self.stage {
            Stage::Idle => (self.idle(), Stage::Done),
            Stage::Throttle => (self.throttle(), Stage::Brake),
            Stage::Brake => (self.brake(), Stage::LightBar),
            Stage::LightBar => (self.light_bar(), Stage::Done),
            Stage::Done => return None,
        };
        self.stage = next;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.stage {
            Stage::Idle | Stage::LightBar => 1,
            Stage::Throttle => 3,
            Stage::Brake => 2,
            Stage::Done => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Tick<'_> {}
