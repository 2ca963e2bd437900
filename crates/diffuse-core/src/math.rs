//! Level and time conversions.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`ms_to_countdown`] - Ramp duration to a sample countdown
//! - [`rescale_countdown`] - Keep a countdown's duration across a sample-rate change

use libm::{exp, floor, log, round};

/// Floor applied before taking the log of a level, about -200 dB.
pub const SILENCE_FLOOR: f64 = 1e-10;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use diffuse_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
/// assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    const FACTOR: f64 = core::f64::consts::LN_10 / 20.0;
    exp(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Values at or below [`SILENCE_FLOOR`] clamp to -200 dB instead of
/// producing `-inf`.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    log(linear.max(SILENCE_FLOOR)) * 20.0 / core::f64::consts::LN_10
}

/// Convert a ramp duration in milliseconds to a countdown in samples.
///
/// Rounds to the nearest sample and never returns less than 1, so a
/// scheduled ramp always has a finite, positive countdown.
#[inline]
pub fn ms_to_countdown(ms: f64, sample_rate: f64) -> u64 {
    let samples = round(ms * sample_rate / 1000.0);
    if samples < 1.0 { 1 } else { samples as u64 }
}

/// Rescale an in-flight countdown when the sample rate changes.
///
/// The remaining wall-clock time is preserved; the result is at least 1.
#[inline]
pub fn rescale_countdown(countdown: u64, from_rate: f64, to_rate: f64) -> u64 {
    let scaled = round(countdown as f64 * to_rate / from_rate);
    if scaled < 1.0 { 1 } else { scaled as u64 }
}

/// Wall-clock samples needed to exhaust `countdown` at the given velocity.
///
/// Never 0, so a ramp always advances.
#[inline]
pub(crate) fn velocity_scaled(countdown: u64, velocity: f64) -> u64 {
    (floor(countdown as f64 / velocity) as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_round_trip() {
        for db in [-60.0, -12.0, -3.0, 0.0, 6.0] {
            assert!((linear_to_db(db_to_linear(db)) - db).abs() < 1e-9);
        }
    }

    #[test]
    fn silence_is_clamped() {
        assert!((linear_to_db(0.0) + 200.0).abs() < 1e-9);
        assert!(linear_to_db(-1.0).is_finite());
    }

    #[test]
    fn countdown_rounds_and_clamps() {
        assert_eq!(ms_to_countdown(10.0, 1000.0), 10);
        assert_eq!(ms_to_countdown(1000.0, 44100.0), 44100);
        // 0.4 samples rounds to 0 and is clamped
        assert_eq!(ms_to_countdown(0.01, 40000.0), 1);
        // 10.5 samples rounds away from zero
        assert_eq!(ms_to_countdown(10.5, 1000.0), 11);
    }

    #[test]
    fn rescale_preserves_duration() {
        assert_eq!(rescale_countdown(441, 44100.0, 48000.0), 480);
        assert_eq!(rescale_countdown(480, 48000.0, 24000.0), 240);
        assert_eq!(rescale_countdown(1, 48000.0, 8000.0), 1);
    }

    #[test]
    fn velocity_helpers() {
        assert_eq!(velocity_scaled(10, 1.0), 10);
        assert_eq!(velocity_scaled(10, 2.0), 5);
        assert_eq!(velocity_scaled(1, 4.0), 1);
    }
}
