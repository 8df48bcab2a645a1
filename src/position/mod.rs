//! # Position providers
//!
//! The scanner never computes orbits. It asks a [`PositionProvider`] for a body's
//! ecliptic longitude at an instant and treats `None` as "unavailable".
//!
//! Contract
//! -----------------
//! * Longitudes are degrees in `[0, 360)` (values outside are normalized by the callers).
//! * Calls may come at arbitrarily close instants; the solver samples densely.
//! * Results must be deterministic: the same `(body, instant)` always yields the same answer.
//!
//! Implementations
//! -----------------
//! * Any `Fn(Body, Instant) -> Option<Degree>` closure.
//! * [`TabulatedProvider`] – interpolates pre-computed longitude tables (in memory or CSV).
//! * [`CachedProvider`] – memoises another provider per exact instant.
pub mod cache;
pub mod tabulated;

use crate::bodies::Body;
use crate::constants::Degree;
use crate::time::Instant;

pub use cache::CachedProvider;
pub use tabulated::TabulatedProvider;

pub trait PositionProvider {
    /// Ecliptic longitude of `body` at `instant`, or `None` when unavailable.
    fn longitude(&self, body: Body, instant: Instant) -> Option<Degree>;
}

impl<F> PositionProvider for F
where
    F: Fn(Body, Instant) -> Option<Degree>,
{
    fn longitude(&self, body: Body, instant: Instant) -> Option<Degree> {
        self(body, instant)
    }
}
