//! Race-active debounce
//!
//! Horizon titles sometimes leave `IsRaceOn` set while the player sits in a menu. When
//! that happens the engine RPM freezes and power drops to zero, so a long run of
//! identical RPM readings with no power overrides the game's flag.

/// Default number of stalled packets tolerated before the race is considered over.
pub const DEFAULT_STALL_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceStateTracker {
    last_engine_rpm: f32,
    stall_accumulator: u32,
    stall_limit: u32,
}

impl Default for RaceStateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_LIMIT)
    }
}

impl RaceStateTracker {
    pub fn new(stall_limit: u32) -> Self {
        Self { last_engine_rpm: 0.0, stall_accumulator: 0, stall_limit }
    }

    /// Feed one packet and return the effective race state.
    pub fn update(&mut self, is_race_on: bool, current_rpm: f32, power: f32) -> bool {
        let stalled = current_rpm.to_bits() == self.last_engine_rpm.to_bits() && power <= 0.0;
        if stalled {
            self.stall_accumulator = self.stall_accumulator.saturating_add(1);
        } else {
            self.stall_accumulator = 0;
        }
        self.last_engine_rpm = current_rpm;

        is_race_on && !self.is_stalled()
    }

    /// Whether the accumulator has passed the limit.
    pub fn is_stalled(&self) -> bool {
        self.stall_accumulator > self.stall_limit
    }

    pub fn stall_accumulator(&self) -> u32 {
        self.stall_accumulator
    }

    pub fn last_engine_rpm(&self) -> f32 {
        self.last_engine_rpm
    }

    /// Apply a new limit from configuration. The accumulator is kept.
    pub fn set_limit(&mut self, stall_limit: u32) {
        self.stall_limit = stall_limit;
    }
}
