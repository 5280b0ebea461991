//! Clamped linear interpolation

/// Map `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// `x` is clamped into the input range first: values above `in_max` become `in_max`,
/// then values below `in_min` become `in_min`. Either range may be inverted
/// (`out_min > out_max` maps high inputs to low outputs).
///
/// ```rust
/// use forza_dsx::mapping::map_range;
///
/// assert_eq!(map_range(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
/// assert_eq!(map_range(20.0, 0.0, 10.0, 0.0, 100.0), 100.0);
/// // Inverted output range
/// assert_eq!(map_range(0.0, 0.0, 255.0, 200.0, 1.0), 200.0);
/// ```
pub fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    // Not f32::clamp: that panics when in_min > in_max.
    let x = if x > in_max {
        in_max
    } else if x < in_min {
        in_min
    } else {
        x
    };
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// [`map_range`] floored to an integer.
pub(crate) fn map_floor(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> i32 {
    map_range(x, in_min, in_max, out_min, out_max).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_to_bounds() {
        assert_eq!(map_range(-3.0, 0.0, 10.0, 1.0, 6.0), 1.0);
        assert_eq!(map_range(13.0, 0.0, 10.0, 1.0, 6.0), 6.0);
    }

    #[test]
    fn inverted_output_range() {
        assert_eq!(map_range(255.0, 0.0, 255.0, 200.0, 1.0), 1.0);
        assert_eq!(map_floor(127.5, 0.0, 255.0, 200.0, 0.0), 100);
    }

    #[test]
    fn floors_toward_negative_infinity() {
        assert_eq!(map_floor(0.5, 0.0, 1.0, -1.0, 0.0), -1);
    }

    proptest! {
        #[test]
        fn identity_range_is_identity(
            x in -1000.0f32..1000.0,
            lo in -500.0f32..0.0,
            span in 1.0f32..500.0,
        ) {
            let hi = lo + span;
            let expected = if x > hi { hi } else if x < lo { lo } else { x };
            let mapped = map_range(x, lo, hi, lo, hi);
            prop_assert!((mapped - expected).abs() <= 1e-3 * (1.0 + expected.abs()));
        }

        #[test]
        fn monotonic_within_domain(
            a in 0.0f32..10.0,
            b in 0.0f32..10.0,
            out_min in -100.0f32..100.0,
            out_span in 0.0f32..500.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let out_max = out_min + out_span;
            prop_assert!(map_range(lo, 0.0, 10.0, out_min, out_max)
                <= map_range(hi, 0.0, 10.0, out_min, out_max));
        }

        #[test]
        fn outside_domain_clamps_to_nearest_bound(
            x in 10.0f32..1.0e6,
            out_min in -100.0f32..100.0,
            out_max in -100.0f32..100.0,
        ) {
            let upper = map_range(x, 0.0, 10.0, out_min, out_max);
            prop_assert!((upper - out_max).abs() <= 1e-3);
            prop_assert_eq!(map_range(-x, 0.0, 10.0, out_min, out_max), out_min);
        }
    }
}
