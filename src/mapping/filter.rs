//! EWMA smoothing for trigger channels

/// Exponentially-weighted moving average step: `alpha * input + (1 - alpha) * previous`.
pub fn ewma(input: f32, previous: f32, alpha: f32) -> f32 {
    alpha * input + (1.0 - alpha) * previous
}

/// Integer EWMA accumulator.
///
/// Every update is floored and the floored value becomes the next `previous`, so the
/// state never carries fractional residue between packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ewma {
    value: i32,
}

impl Ewma {
    pub const fn new(initial: i32) -> Self {
        Self { value: initial }
    }

    /// Blend `input` into the state and return the new value.
    pub fn update(&mut self, input: i32, alpha: f32) -> i32 {
        self.value = ewma(input as f32, self.value as f32, alpha).floor() as i32;
        self.value
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

/// Smoothing state for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFilter {
    pub resistance: Ewma,
    pub frequency: Ewma,
}

impl ChannelFilter {
    pub const fn new(resistance: i32, frequency: i32) -> Self {
        Self { resistance: Ewma::new(resistance), frequency: Ewma::new(frequency) }
    }
}

/// Throttle and brake smoothing state, owned by the mapping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterBank {
    pub throttle: ChannelFilter,
    pub brake: ChannelFilter,
}

impl Default for FilterBank {
    fn default() -> Self {
        // Brake starts at the drivetrain's default trigger stiffness.
        Self { throttle: ChannelFilter::new(1, 0), brake: ChannelFilter::new(200, 0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn initial_state() {
        let bank = FilterBank::default();
        assert_eq!(bank.throttle.resistance.value(), 1);
        assert_eq!(bank.throttle.frequency.value(), 0);
        assert_eq!(bank.brake.resistance.value(), 200);
        assert_eq!(bank.brake.frequency.value(), 0);
    }

    #[test]
    fn update_floors_and_feeds_back() {
        let mut filter = Ewma::new(0);
        assert_eq!(filter.update(3, 0.5), 1);
        assert_eq!(filter.update(3, 0.5), 2);
        assert_eq!(filter.update(-3, 0.5), -1);
        assert_eq!(filter.value(), -1);
    }

    proptest! {
        #[test]
        fn alpha_one_returns_input(input in -1000i32..1000, previous in -1000i32..1000) {
            let mut filter = Ewma::new(previous);
            prop_assert_eq!(filter.update(input, 1.0), input);
        }

        #[test]
        fn alpha_zero_returns_previous(input in -1000i32..1000, previous in -1000i32..1000) {
            let mut filter = Ewma::new(previous);
            prop_assert_eq!(filter.update(input, 0.0), previous);
        }

        #[test]
        fn partial_alpha_lands_strictly_between(
            input in -1000i32..1000,
            previous in -1000i32..1000,
            alpha in 0.01f32..0.99,
        ) {
            prop_assume!(input != previous);
            let blended = ewma(input as f32, previous as f32, alpha);
            let (lo, hi) = (input.min(previous) as f32, input.max(previous) as f32);
            prop_assert!(blended > lo && blended < hi);

            // The floored state stays within the closed interval.
            let mut filter = Ewma::new(previous);
            let value = filter.update(input, alpha);
            prop_assert!(value >= input.min(previous) && value <= input.max(previous));
        }
    }
}
