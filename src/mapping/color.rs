//! Light-bar colors
//!
//! While idle the light bar shows the car's class color, dimmed by its performance
//! index. While racing it tracks engine RPM from green to red.

use crate::types::Rgb;

/// Performance index mapped to full brightness.
pub const MAX_CPI: i32 = 255;

/// Forza class tiers in ascending order with their in-game colors.
pub const CLASS_TIERS: [(i32, Rgb); 6] = [
    (0, Rgb::new(107, 185, 236)), // D
    (1, Rgb::new(234, 202, 49)),  // C
    (2, Rgb::new(211, 90, 37)),   // B
    (3, Rgb::new(187, 59, 34)),   // A
    (4, Rgb::new(128, 54, 243)),  // S1
    (5, Rgb::new(75, 88, 229)),   // S2
];

/// X class, shown at full brightness regardless of performance index.
pub const CLASS_X: Rgb = Rgb::new(105, 182, 72);

/// Green never drops below this while racing.
const MIN_RPM_GREEN: i32 = 50;

/// Idle color for `class` dimmed by `ratio`.
///
/// The first tier whose value is not below `class` wins, so a class exactly on a tier
/// boundary gets that tier's color. Classes above S2 get [`CLASS_X`].
pub fn class_color(class: i32, ratio: f32) -> Rgb {
    match CLASS_TIERS.iter().find(|(tier, _)| class <= *tier) {
        Some((_, base)) => Rgb::new(dim(base.r, ratio), dim(base.g, ratio), dim(base.b, ratio)),
        None => CLASS_X,
    }
}

fn dim(channel: u8, ratio: f32) -> u8 {
    to_channel((ratio * channel as f32).floor() as i32)
}

/// Racing color for the current RPM.
///
/// Red rises with the RPM ratio between idle and max; green holds a floor of 50 and is
/// inverted at or above `redline_ratio`. Blue is always off.
pub fn rpm_color(current_rpm: f32, idle_rpm: f32, max_rpm: f32, redline_ratio: f32) -> Rgb {
    let ratio = rpm_ratio(current_rpm, idle_rpm, max_rpm);
    let red = (ratio * 255.0).floor() as i32;
    let mut green = red.max(MIN_RPM_GREEN);
    if ratio >= redline_ratio {
        green = 255 - green;
    }
    Rgb::new(to_channel(red), to_channel(green), 0)
}

/// Position of `current_rpm` between idle and max.
///
/// Not clamped; a car at the limiter or below idle produces values outside 0..=1, and a
/// zero range (menus) produces a non-finite ratio.
pub fn rpm_ratio(current_rpm: f32, idle_rpm: f32, max_rpm: f32) -> f32 {
    (current_rpm - idle_rpm) / (max_rpm - idle_rpm)
}

/// Saturate into a color channel.
fn to_channel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Last valid car class and performance index.
///
/// Menus report non-positive values; the idle color keeps showing the last car driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarClassMemory {
    class: i32,
    performance_index: i32,
}

impl CarClassMemory {
    /// Record the packet's class and index where valid.
    pub fn observe(&mut self, class: i32, performance_index: i32) {
        if class > 0 {
            self.class = class;
        }
        if performance_index > 0 {
            self.performance_index = performance_index.min(MAX_CPI);
        }
    }

    pub fn class(&self) -> i32 {
        self.class
    }

    /// Remembered index, at most [`MAX_CPI`].
    pub fn performance_index(&self) -> i32 {
        self.performance_index
    }

    /// Index as a brightness ratio in 0..=1.
    pub fn cpi_ratio(&self) -> f32 {
        self.performance_index as f32 / MAX_CPI as f32
    }

    pub fn color(&self) -> Rgb {
        class_color(self.class, self.cpi_ratio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_class_selects_its_own_tier() {
        assert_eq!(class_color(1, 1.0), Rgb::new(234, 202, 49));
        assert_eq!(class_color(5, 1.0), Rgb::new(75, 88, 229));
        assert_eq!(class_color(6, 0.5), CLASS_X);
        assert_eq!(class_color(-4, 1.0), Rgb::new(107, 185, 236));
    }

    #[test]
    fn zero_ratio_is_black_except_x() {
        for class in 0..=5 {
            assert_eq!(class_color(class, 0.0), Rgb::BLACK, "class {class}");
        }
        assert_eq!(class_color(7, 0.0), CLASS_X);
    }

    #[test]
    fn class_b_at_cpi_200() {
        assert_eq!(class_color(2, 200.0 / 255.0), Rgb::new(165, 70, 29));
    }

    #[test]
    fn rpm_color_ramps_then_inverts_green() {
        // Below idle: red saturates at 0, green at its floor.
        assert_eq!(rpm_color(500.0, 1000.0, 8000.0, 0.9), Rgb::new(0, 50, 0));
        // Halfway
        assert_eq!(rpm_color(4500.0, 1000.0, 8000.0, 0.9), Rgb::new(127, 127, 0));
        // Past redline: green = 255 - 242
        assert_eq!(rpm_color(7650.0, 1000.0, 8000.0, 0.9), Rgb::new(242, 13, 0));
        // Over max clamps red
        assert_eq!(rpm_color(9000.0, 1000.0, 8000.0, 0.9), Rgb::new(255, 0, 0));
    }

    #[test]
    fn degenerate_rpm_range_does_not_panic() {
        let color = rpm_color(0.0, 0.0, 0.0, 0.9);
        assert_eq!(color.b, 0);
    }

    #[test]
    fn memory_keeps_last_valid_values() {
        let mut memory = CarClassMemory::default();
        memory.observe(3, 700);
        assert_eq!(memory.class(), 3);
        assert_eq!(memory.performance_index(), 255);

        memory.observe(0, -1);
        assert_eq!(memory.class(), 3);
        assert_eq!(memory.performance_index(), 255);
        assert_eq!(memory.color(), Rgb::new(187, 59, 34));

        memory.observe(2, 100);
        assert_eq!(memory.class(), 2);
        assert_eq!(memory.performance_index(), 100);
    }
}
