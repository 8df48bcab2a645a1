use std::cmp::Ordering;
use std::fmt;

use crate::aspects::AspectDefinition;
use crate::bodies::Body;
use crate::constants::Degree;
use crate::solver::Refinement;
use crate::time::Instant;

/// A refined, committed aspect occurrence.
///
/// `body_a`/`body_b` keep the order in which the scanner paired them; deduplication
/// treats the pair as unordered.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectEvent {
    pub instant: Instant,
    pub body_a: Body,
    pub body_b: Body,
    pub aspect: String,
    pub abbreviation: String,
    /// Arc measured on the aspect's convention at `instant`
    pub measured_angle: Degree,
    /// Distance from the aspect's target, always `>= 0`
    pub angular_error: Degree,
    pub lon_a: Degree,
    pub lon_b: Degree,
}

impl AspectEvent {
    pub fn from_refinement(
        body_a: Body,
        body_b: Body,
        definition: &AspectDefinition,
        refinement: &Refinement,
    ) -> Self {
        AspectEvent {
            instant: refinement.instant,
            body_a,
            body_b,
            aspect: definition.name().to_string(),
            abbreviation: definition.abbreviation().to_string(),
            measured_angle: refinement.measured_angle,
            angular_error: refinement.error.abs(),
            lon_a: refinement.lon_a,
            lon_b: refinement.lon_b,
        }
    }

    /// Short label such as `"Jupiter-Saturn Conj"`.
    pub fn description(&self) -> String {
        format!("{}-{} {}", self.body_a, self.body_b, self.abbreviation)
    }

    /// Total order used for the final output: instant, then bodies, then aspect name.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.instant
            .partial_cmp(&other.instant)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.body_a.cmp(&other.body_a))
            .then_with(|| self.body_b.cmp(&other.body_b))
            .then_with(|| self.aspect.cmp(&other.aspect))
    }
}

impl fmt::Display for AspectEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.4}°, error {:.6}°)",
            self.instant,
            self.description(),
            self.measured_angle,
            self.angular_error
        )
    }
}

/// Sort events by [`AspectEvent::chronological_cmp`].
pub fn sort_chronologically(events: &mut [AspectEvent]) {
    events.sort_by(|a, b| a.chronological_cmp(b));
}
