//! # Aspect scanner
//!
//! Drives the detection pipeline over a time range:
//!
//! ```text
//! step instant ─▶ longitudes ─▶ find_aspect ─▶ ExactTimeSolver::refine ─▶ DeduplicationWindow
//! ```
//!
//! At each step every participating body is queried once, then every unordered pair is
//! matched against the catalog (first match in catalog order). Hits are refined to their
//! exact instant and fed to the deduplication window. After the last step all open
//! windows are flushed and the events are sorted chronologically.
//!
//! The scan itself never fails: unavailable positions skip the pair for that step,
//! unresolved or rejected refinements drop the candidate. Both are logged at `debug`.
//!
//! Configuration is immutable once the [`Scanner`] is built; the set of participating
//! bodies is fixed by [`ScanConfig::bodies`].
//!
//! Example
//! -----------------
//! ```rust,no_run
//! use aspect_scan::aspects::AspectCatalog;
//! use aspect_scan::bodies::Body;
//! use aspect_scan::constants::Degree;
//! use aspect_scan::scanner::{ScanConfig, Scanner};
//! use aspect_scan::time::{instant_from_jd, Instant};
//!
//! let provider = |body: Body, t: Instant| -> Option<Degree> {
//!     // plug an ephemeris in here
//!     let _ = (body, t);
//!     None
//! };
//!
//! let config = ScanConfig::new(instant_from_jd(2451545.0), instant_from_jd(2451910.0));
//! let scanner = Scanner::new(config, AspectCatalog::standard()).unwrap();
//! for event in scanner.scan(&provider) {
//!     println!("{event}");
//! }
//! ```
use itertools::Itertools;
use tracing::{debug, info, trace};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::aspect_errors::AspectError;
use crate::aspects::{find_aspect, AspectCatalog, AspectMatch};
use crate::bodies::{Body, BodySelection};
use crate::constants::{Days, Degree, DEFAULT_STEP_DAYS, DEFAULT_WINDOW_DAYS};
use crate::dedup::DeduplicationWindow;
use crate::event::{sort_chronologically, AspectEvent};
use crate::position::PositionProvider;
use crate::solver::{ExactTimeSolver, SolveError, SolverConfig};
use crate::time::{add_days, days_between, Instant};

/// Absorbs rounding when the range is an exact multiple of the step.
const STEP_COUNT_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub start: Instant,
    pub end: Instant,
    /// Coarse step, in fractional days
    pub step_days: Days,
    /// Deduplication window length, in days
    pub window_days: Days,
    pub solver: SolverConfig,
    pub bodies: BodySelection,
}

impl ScanConfig {
    /// Range `[start, end]` with default step, window, solver and bodies.
    pub fn new(start: Instant, end: Instant) -> Self {
        ScanConfig {
            start,
            end,
            step_days: DEFAULT_STEP_DAYS,
            window_days: DEFAULT_WINDOW_DAYS,
            solver: SolverConfig::default(),
            bodies: BodySelection::default(),
        }
    }

    pub fn with_step_days(mut self, step_days: Days) -> Self {
        self.step_days = step_days;
        self
    }

    pub fn with_window_days(mut self, window_days: Days) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_bodies(mut self, bodies: impl Into<BodySelection>) -> Self {
        self.bodies = bodies.into();
        self
    }

    pub fn validate(&self) -> Result<(), AspectError> {
        if !self.step_days.is_finite() || self.step_days <= 0.0 {
            return Err(AspectError::InvalidScanConfig(format!(
                "step_days must be a positive number, got {}",
                self.step_days
            )));
        }
        if days_between(self.start, self.end) < 0.0 {
            return Err(AspectError::InvalidScanConfig(format!(
                "scan end {} precedes start {}",
                self.end, self.start
            )));
        }
        self.solver.validate()
    }

    /// Number of coarse instants in `[start, end]`, both ends included when aligned.
    pub fn step_count(&self) -> u64 {
        let span = days_between(self.start, self.end);
        if span < 0.0 || !self.step_days.is_finite() || self.step_days <= 0.0 {
            return 0;
        }
        (span / self.step_days + STEP_COUNT_SLACK).floor() as u64 + 1
    }

    /// The `index`-th coarse instant. Computed from the start to avoid drift.
    pub fn step_instant(&self, index: u64) -> Instant {
        add_days(self.start, index as f64 * self.step_days)
    }
}

/// An aspect in orb at a single instant, as returned by [`Scanner::aspects_at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectHit<'a> {
    pub body_a: Body,
    pub body_b: Body,
    pub lon_a: Degree,
    pub lon_b: Degree,
    pub matched: AspectMatch<'a>,
}

/// Counters gathered over one scan, logged when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub steps: u64,
    pub candidates: usize,
    pub unresolved: usize,
    pub rejected: usize,
    pub committed: usize,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    catalog: AspectCatalog,
    bodies: Vec<Body>,
    solver: ExactTimeSolver,
    window: DeduplicationWindow,
}

impl Scanner {
    pub fn new(config: ScanConfig, catalog: AspectCatalog) -> Result<Self, AspectError> {
        config.validate()?;
        let window = DeduplicationWindow::new(config.window_days)?;
        Ok(Scanner {
            bodies: config.bodies.bodies(),
            solver: ExactTimeSolver::new(config.solver),
            config,
            catalog,
            window,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AspectCatalog {
        &self.catalog
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Run the scan and return the committed events, sorted by instant.
    pub fn scan<P>(&self, provider: &P) -> Vec<AspectEvent>
    where
        P: PositionProvider + ?Sized,
    {
        self.scan_with_stats(provider).0
    }

    /// Same as [`Scanner::scan`], also returning the scan counters.
    pub fn scan_with_stats<P>(&self, provider: &P) -> (Vec<AspectEvent>, ScanStats)
    where
        P: PositionProvider + ?Sized,
    {
        let mut stats = ScanStats::default();
        if self.bodies.len() < 2 || self.catalog.is_empty() {
            info!(
                bodies = self.bodies.len(),
                aspects = self.catalog.len(),
                "nothing to scan"
            );
            return (Vec::new(), stats);
        }

        let steps = self.config.step_count();
        info!(
            start = %self.config.start,
            end = %self.config.end,
            step_days = self.config.step_days,
            steps,
            bodies = self.bodies.len(),
            aspects = self.catalog.len(),
            "scan started"
        );

        #[cfg(feature = "progress")]
        let pb = {
            let pb = ProgressBar::new(steps.max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | ETA {eta_precise} | {msg}",
            ) {
                pb.set_style(style);
            }
            pb
        };

        let mut window = self.window.clone();
        let mut longitudes: Vec<(Body, Option<Degree>)> = Vec::with_capacity(self.bodies.len());

        for index in 0..steps {
            let instant = self.config.step_instant(index);
            stats.steps += 1;

            longitudes.clear();
            longitudes.extend(
                self.bodies
                    .iter()
                    .map(|&body| (body, provider.longitude(body, instant))),
            );

            for (&(body_a, lon_a), &(body_b, lon_b)) in longitudes.iter().tuple_combinations() {
                let (Some(lon_a), Some(lon_b)) = (lon_a, lon_b) else {
                    trace!(%instant, %body_a, %body_b, "position unavailable");
                    continue;
                };
                let Some(hit) = find_aspect(&self.catalog, lon_a, lon_b) else {
                    continue;
                };
                stats.candidates += 1;
                trace!(%instant, %body_a, %body_b, aspect = hit.definition.name(), error = hit.error, "coarse match");

                match self
                    .solver
                    .refine(provider, body_a, body_b, hit.definition, instant)
                {
                    Ok(refinement) => {
                        let event =
                            AspectEvent::from_refinement(body_a, body_b, hit.definition, &refinement);
                        window.offer(event);
                    }
                    Err(SolveError::Unresolved) => {
                        stats.unresolved += 1;
                        debug!(%instant, %body_a, %body_b, aspect = hit.definition.name(), "unresolved candidate dropped");
                    }
                    Err(err @ SolveError::Rejected { .. }) => {
                        stats.rejected += 1;
                        debug!(%instant, %body_a, %body_b, aspect = hit.definition.name(), %err, "candidate rejected");
                    }
                }
            }

            #[cfg(feature = "progress")]
            pb.inc(1);
        }

        #[cfg(feature = "progress")]
        pb.finish_and_clear();

        let mut events = window.into_events();
        sort_chronologically(&mut events);
        stats.committed = events.len();

        info!(
            events = events.len(),
            candidates = stats.candidates,
            unresolved = stats.unresolved,
            rejected = stats.rejected,
            "scan finished"
        );
        (events, stats)
    }

    /// Aspects in orb at `instant`, one per pair at most (first catalog match).
    ///
    /// No refinement and no deduplication: a snapshot of the configured bodies.
    pub fn aspects_at<P>(&self, provider: &P, instant: Instant) -> Vec<AspectHit<'_>>
    where
        P: PositionProvider + ?Sized,
    {
        let longitudes: Vec<(Body, Degree)> = self
            .bodies
            .iter()
            .filter_map(|&body| Some((body, provider.longitude(body, instant)?)))
            .collect();

        longitudes
            .iter()
            .tuple_combinations()
            .filter_map(|(&(body_a, lon_a), &(body_b, lon_b))| {
                let matched = find_aspect(&self.catalog, lon_a, lon_b)?;
                Some(AspectHit {
                    body_a,
                    body_b,
                    lon_a,
                    lon_b,
                    matched,
                })
            })
            .collect()
    }
}
