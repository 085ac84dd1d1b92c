//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Largest magnitude accepted for dice counts, faces, characteristics and modifier payloads.
pub const INPUT_LIMIT: u16 = 1000;

/// Whether an unsigned count or face value is within [`INPUT_LIMIT`].
#[must_use]
pub fn within_limit(value: usize) -> bool {
    value <= usize::from(INPUT_LIMIT)
}

/// Whether a signed value's magnitude is within [`INPUT_LIMIT`].
#[must_use]
pub fn within_signed_limit(value: i64) -> bool {
    value.unsigned_abs() <= u64::from(INPUT_LIMIT)
}

/// Convert a dice count or outcome index to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a signed threshold into a slice bound, saturating negatives to 0.
#[must_use]
pub fn threshold_to_index(value: i32) -> usize {
    usize::try_from(value.max(0)).unwrap_or(0)
}

/// Convert a signed count to usize, saturating negatives to 0.
#[must_use]
pub fn count_to_usize(value: i32) -> usize {
    usize::try_from(value.max(0)).unwrap_or(0)
}

/// Ceil a f64 into an index, returning 0 for negative or non-finite values.
#[must_use]
pub fn ceil_f64_to_index(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.ceil()).unwrap_or(usize::MAX)
}

/// Integer division rounding up, used for halving damage.
#[must_use]
pub const fn div_ceil(value: usize, divisor: usize) -> usize {
    if divisor == 0 {
        return value;
    }
    value.div_ceil(divisor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_saturate_at_zero() {
        assert_eq!(threshold_to_index(-3), 0);
        assert_eq!(threshold_to_index(4), 4);
        assert_eq!(count_to_usize(-1), 0);
    }

    #[test]
    fn ceil_handles_fractions_and_nan() {
        assert_eq!(ceil_f64_to_index(3.5), 4);
        assert_eq!(ceil_f64_to_index(3.0), 3);
        assert_eq!(ceil_f64_to_index(f64::NAN), 0);
        assert_eq!(ceil_f64_to_index(-2.0), 0);
    }

    #[test]
    fn div_ceil_rounds_up() {
        assert_eq!(div_ceil(0, 2), 0);
        assert_eq!(div_ceil(3, 2), 2);
        assert_eq!(div_ceil(4, 2), 2);
        assert_eq!(div_ceil(5, 0), 5);
    }
}
