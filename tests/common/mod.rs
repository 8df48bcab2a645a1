#![allow(dead_code)]

use approx::assert_abs_diff_eq;
use aspect_scan::angle_math::normalize;
use aspect_scan::bodies::Body;
use aspect_scan::constants::Degree;
use aspect_scan::event::AspectEvent;
use aspect_scan::position::PositionProvider;
use aspect_scan::time::{add_days, days_between, instant_from_jd, Instant};

pub const J2000: f64 = 2451545.0;

pub fn day(days: f64) -> Instant {
    add_days(instant_from_jd(J2000), days)
}

pub fn days_since_j2000(instant: Instant) -> f64 {
    days_between(instant_from_jd(J2000), instant)
}

/// Bodies moving at constant angular rate from J2000; unlisted bodies are unavailable.
pub struct LinearMotion {
    pub tracks: Vec<(Body, Degree, f64)>,
}

impl LinearMotion {
    pub fn new(tracks: &[(Body, Degree, f64)]) -> Self {
        LinearMotion {
            tracks: tracks.to_vec(),
        }
    }
}

impl PositionProvider for LinearMotion {
    fn longitude(&self, body: Body, instant: Instant) -> Option<Degree> {
        let &(_, lon0, rate) = self.tracks.iter().find(|(b, _, _)| *b == body)?;
        Some(normalize(lon0 + rate * days_since_j2000(instant)))
    }
}

pub fn assert_event(event: &AspectEvent, aspect: &str, expected_day: f64, epsilon: f64) {
    assert_eq!(event.aspect, aspect, "unexpected aspect in {event}");
    assert_abs_diff_eq!(
        days_since_j2000(event.instant),
        expected_day,
        epsilon = epsilon
    );
    assert!(event.angular_error <= 0.01, "{event} not exact enough");
}
