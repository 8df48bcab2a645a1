//! # Exact-time refinement
//!
//! The coarse scan only knows that an aspect holds *somewhere near* a step instant `t0`.
//! [`ExactTimeSolver`] narrows that down to the instant where the angular error
//!
//! ```text
//! e(t) = | measured_arc(t) - target |      (seam-corrected, oppositions against 180°)
//! ```
//!
//! is smallest, using a derivative-free bisection over the bracket
//! `[t0 - lead_days, t0 + horizon_days]`.
//!
//! Algorithm
//! -----------------
//! 1. **Confinement.** Over a month the error of a fast pair has several minima (the Moon
//!    meets every aspect again after one synodic month), and comparing endpoints that far
//!    apart can steer the search to the next occurrence. The bracket is therefore first
//!    cut down to the first local minimum at or after `t0`: the error is sampled at
//!    `t0 + d_k` with `d_0 = 0`, `d_1 = expansion_days`, `d_(k+1) = min(2 d_k, horizon_days)`
//!    until it rises, giving
//!
//!    ```text
//!    [t0 - lead_days, t0 + d_1]            rises at d_1 (minimum at or before t0)
//!    [t0 + d_(k-2), t0 + d_k]              rises at d_k, k >= 2
//!    [t0 + d_(k-1), t0 + horizon_days]     still falling at the horizon
//!    ```
//!
//! 2. **Bisection.** At each iteration the error is evaluated at the bracket midpoint; the
//!    bracket then shrinks towards whichever endpoint has the smaller error. The loop
//!    stops as soon as the midpoint error drops below `tolerance`, or after
//!    `max_iterations`, and returns the best midpoint seen. For a locally symmetric error
//!    curve the smaller endpoint is always on the side of the minimum, so the minimum
//!    stays bracketed.
//!
//! Endpoint errors are carried over from the previous iteration instead of being
//! re-queried; providers are deterministic, so this changes cost, not results.
//!
//! Failure handling
//! -----------------
//! * An unavailable position counts as an infinite error and is never selected.
//! * If no midpoint ever had a finite error, the candidate is [`SolveError::Unresolved`].
//! * The returned instant is re-measured; an error above `acceptance` is
//!   [`SolveError::Rejected`] (the bisection settled on a local, not the true, minimum).
use thiserror::Error;
use tracing::trace;

use crate::aspect_errors::AspectError;
use crate::aspects::AspectDefinition;
use crate::bodies::Body;
use crate::constants::{
    Days, Degree, DEFAULT_ACCEPTANCE_TOLERANCE, DEFAULT_HORIZON_DAYS, DEFAULT_LEAD_DAYS,
    DEFAULT_MAX_ITERATIONS, DEFAULT_EXPANSION_DAYS, DEFAULT_SOLVER_TOLERANCE,
};
use crate::position::PositionProvider;
use crate::time::{add_days, midpoint, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Bracket start, in days before the coarse hit
    pub lead_days: Days,
    /// Bracket end, in days after the coarse hit
    pub horizon_days: Days,
    /// First forward step of the bracket confinement, doubled until the error rises
    pub expansion_days: Days,
    /// Early-exit threshold on the midpoint error
    pub tolerance: Degree,
    pub max_iterations: usize,
    /// Largest error a refined instant may keep after the post-check
    pub acceptance: Degree,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            lead_days: DEFAULT_LEAD_DAYS,
            horizon_days: DEFAULT_HORIZON_DAYS,
            expansion_days: DEFAULT_EXPANSION_DAYS,
            tolerance: DEFAULT_SOLVER_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            acceptance: DEFAULT_ACCEPTANCE_TOLERANCE,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), AspectError> {
        let invalid = |msg: &str| Err(AspectError::InvalidScanConfig(msg.to_string()));

        if !self.lead_days.is_finite() || self.lead_days < 0.0 {
            return invalid("solver lead_days must be a non-negative number");
        }
        if !self.horizon_days.is_finite() || self.horizon_days < 0.0 {
            return invalid("solver horizon_days must be a non-negative number");
        }
        if !self.expansion_days.is_finite() || self.expansion_days <= 0.0 {
            return invalid("solver expansion_days must be a positive number");
        }
        if self.lead_days + self.horizon_days <= 0.0 {
            return invalid("solver bracket must have a positive width");
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return invalid("solver tolerance must be a non-negative number");
        }
        if !self.acceptance.is_finite() || self.acceptance < 0.0 {
            return invalid("solver acceptance must be a non-negative number");
        }
        if self.max_iterations == 0 {
            return invalid("solver max_iterations must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SolveError {
    #[error("no finite angular error anywhere in the search bracket")]
    Unresolved,

    #[error("refined error {error}° at {instant} exceeds acceptance {acceptance}°")]
    Rejected {
        instant: Instant,
        error: Degree,
        acceptance: Degree,
    },
}

/// Outcome of a bisection over an arbitrary error function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub instant: Instant,
    pub error: Degree,
    pub iterations: usize,
    /// `true` when the midpoint error fell below the tolerance before the cap
    pub converged: bool,
}

/// A refined aspect instant with the longitudes re-measured there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refinement {
    pub instant: Instant,
    pub lon_a: Degree,
    pub lon_b: Degree,
    pub measured_angle: Degree,
    pub error: Degree,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExactTimeSolver {
    config: SolverConfig,
}

impl ExactTimeSolver {
    pub fn new(config: SolverConfig) -> Self {
        ExactTimeSolver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Cut `[t0 - lead, t0 + horizon]` down to the first local minimum at or after `t0`.
    ///
    /// Returns both bracket ends with their errors.
    fn confine<F>(&self, t0: Instant, eval: &mut F) -> ((Instant, Degree), (Instant, Degree))
    where
        F: FnMut(Instant) -> Degree,
    {
        let horizon = self.config.horizon_days;
        let lead_start = add_days(t0, -self.config.lead_days);

        let mut before = (lead_start, eval(lead_start));
        let mut current = (t0, eval(t0));
        if horizon <= 0.0 {
            return (before, current);
        }

        let mut offset = self.config.expansion_days.min(horizon);
        loop {
            let t = add_days(t0, offset);
            let sample = (t, eval(t));
            if sample.1 > current.1 {
                trace!(offset, "error rises, bracket confined");
                return (before, sample);
            }
            if offset >= horizon {
                return (current, sample);
            }
            before = current;
            current = sample;
            offset = (offset * 2.0).min(horizon);
        }
    }

    /// Bisection without the acceptance post-check.
    fn bisect<F>(&self, t0: Instant, mut error_at: F) -> Result<Solution, SolveError>
    where
        F: FnMut(Instant) -> Option<Degree>,
    {
        let mut eval = |t: Instant| {
            error_at(t)
                .filter(|e| e.is_finite())
                .unwrap_or(f64::INFINITY)
        };

        let ((mut left, mut f_left), (mut right, mut f_right)) = self.confine(t0, &mut eval);

        let mut best: Option<(Instant, Degree)> = None;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let mid = midpoint(left, right);
            let f_mid = eval(mid);

            if f_mid.is_finite() && best.map_or(true, |(_, e)| f_mid < e) {
                best = Some((mid, f_mid));
            }
            if f_mid < self.config.tolerance {
                converged = true;
                break;
            }

            if f_left < f_right {
                right = mid;
                f_right = f_mid;
            } else {
                left = mid;
                f_left = f_mid;
            }
        }

        let (instant, error) = best.ok_or(SolveError::Unresolved)?;
        trace!(iterations, converged, error, "bisection finished");

        Ok(Solution {
            instant,
            error,
            iterations,
            converged,
        })
    }

    fn accept(&self, instant: Instant, error: Degree) -> Result<(), SolveError> {
        if error > self.config.acceptance {
            return Err(SolveError::Rejected {
                instant,
                error,
                acceptance: self.config.acceptance,
            });
        }
        Ok(())
    }

    /// Minimise an arbitrary angular-error function around `t0`.
    ///
    /// Arguments
    /// -----------------
    /// * `t0`: coarse instant where a match was detected
    /// * `error_at`: angular error in degrees at an instant, `None` when unavailable
    ///
    /// Return
    /// ----------
    /// * The best midpoint found, re-measured and within the acceptance tolerance, or a
    ///   [`SolveError`].
    pub fn solve_with<F>(&self, t0: Instant, mut error_at: F) -> Result<Solution, SolveError>
    where
        F: FnMut(Instant) -> Option<Degree>,
    {
        let solution = self.bisect(t0, &mut error_at)?;
        let error = error_at(solution.instant)
            .filter(|e| e.is_finite())
            .ok_or(SolveError::Unresolved)?;
        self.accept(solution.instant, error)?;
        Ok(Solution { error, ..solution })
    }

    /// Refine a detected aspect between two bodies to its exact instant.
    ///
    /// Arguments
    /// -----------------
    /// * `provider`: longitude source
    /// * `body_a`, `body_b`: the pair that matched
    /// * `definition`: the matched aspect (target, arc convention)
    /// * `t0`: coarse instant of the match
    ///
    /// Return
    /// ----------
    /// * A [`Refinement`] carrying both longitudes at the refined instant, or a
    ///   [`SolveError`] if the candidate should be discarded.
    pub fn refine<P>(
        &self,
        provider: &P,
        body_a: Body,
        body_b: Body,
        definition: &AspectDefinition,
        t0: Instant,
    ) -> Result<Refinement, SolveError>
    where
        P: PositionProvider + ?Sized,
    {
        let longitudes = |t: Instant| -> Option<(Degree, Degree)> {
            Some((provider.longitude(body_a, t)?, provider.longitude(body_b, t)?))
        };

        let solution = self.bisect(t0, |t| {
            longitudes(t).map(|(lon_a, lon_b)| definition.error(lon_a, lon_b))
        })?;

        let (lon_a, lon_b) = longitudes(solution.instant).ok_or(SolveError::Unresolved)?;
        let error = definition.error(lon_a, lon_b);
        self.accept(solution.instant, error)?;

        Ok(Refinement {
            instant: solution.instant,
            lon_a,
            lon_b,
            measured_angle: definition.measure(lon_a, lon_b),
            error,
            iterations: solution.iterations,
            converged: solution.converged,
        })
    }
}
