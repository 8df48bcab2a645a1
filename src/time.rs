use hifitime::{Epoch, Unit};

use crate::constants::{Days, JD};

/// The single time representation used throughout the pipeline.
///
/// Calendar/timezone rendering is left to callers; inside the crate every
/// instant is a [`hifitime::Epoch`].
pub type Instant = Epoch;

/// Signed span from `from` to `to`, in fractional days.
///
/// Argument
/// --------
/// * `from`: the reference instant
/// * `to`: the instant being measured
///
/// Return
/// ------
/// * `to - from` expressed in days (negative when `to` precedes `from`)
pub fn days_between(from: Instant, to: Instant) -> Days {
    (to - from).to_unit(Unit::Day)
}

/// Shift an instant by a fractional number of days.
pub fn add_days(instant: Instant, days: Days) -> Instant {
    instant + Unit::Day * days
}

/// Midpoint of two instants.
pub fn midpoint(a: Instant, b: Instant) -> Instant {
    add_days(a, 0.5 * days_between(a, b))
}

/// Transformation from julian date (JD, UTC) to an [`Instant`]
pub fn instant_from_jd(jd: JD) -> Instant {
    Epoch::from_jde_utc(jd)
}

/// Transformation from an [`Instant`] to julian date (JD, UTC)
pub fn instant_to_jd(instant: Instant) -> JD {
    instant.to_jde_utc_days()
}

/// Exact integer key for an instant, used to memoise per-instant queries.
pub(crate) fn instant_key(instant: Instant) -> i128 {
    instant.to_tai_duration().total_nanoseconds()
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_days_between() {
        let t0 = instant_from_jd(2459215.5);
        let t1 = instant_from_jd(2459217.25);
        assert_abs_diff_eq!(days_between(t0, t1), 1.75, epsilon = 1e-9);
        assert_abs_diff_eq!(days_between(t1, t0), -1.75, epsilon = 1e-9);
    }

    #[test]
    fn test_add_days() {
        let t0 = instant_from_jd(2459215.5);
        let t1 = add_days(t0, 0.125);
        assert_abs_diff_eq!(instant_to_jd(t1), 2459215.625, epsilon = 1e-9);

        let t2 = add_days(t0, -0.5);
        assert_abs_diff_eq!(instant_to_jd(t2), 2459215.0, epsilon = 1e-9);
    }

    #[test]
    fn test_midpoint() {
        let t0 = instant_from_jd(2459215.5);
        let t1 = instant_from_jd(2459245.5);
        assert_abs_diff_eq!(instant_to_jd(midpoint(t0, t1)), 2459230.5, epsilon = 1e-9);
    }

    #[test]
    fn test_jd_round_trip() {
        let jd = 2451545.0;
        assert_abs_diff_eq!(instant_to_jd(instant_from_jd(jd)), jd, epsilon = 1e-9);
    }

    #[test]
    fn test_instant_key_is_exact() {
        let t0 = instant_from_jd(2459215.5);
        assert_eq!(instant_key(t0), instant_key(add_days(t0, 0.0)));
        assert_ne!(instant_key(t0), instant_key(add_days(t0, 1e-6)));
    }
}
