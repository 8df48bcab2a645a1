//! # Windowed deduplication
//!
//! A slow pair can sit inside an aspect's orb for weeks, and a retrograde body can
//! cross the same aspect several times in a row. Every coarse hit is refined, so the
//! same occurrence shows up again and again. [`DeduplicationWindow`] collapses these
//! into one event per occurrence window.
//!
//! State machine (per [`DedupKey`])
//! -----------------
//! ```text
//!            offer (no entry)
//!  CLOSED ───────────────────────▶ OPEN { best, last_seen }
//!                                    │
//!   offer, |t - last_seen| <= W      │  last_seen ← max(last_seen, t)
//!   ─────────────────────────────────┤  best ← candidate if strictly more exact
//!                                    │
//!   offer, t - last_seen > W         │  commit best, reopen with candidate
//!   ─────────────────────────────────┤
//!                                    │
//!   offer, last_seen - t > W         │  candidate dropped (stale)
//!   ─────────────────────────────────┤
//!                                    │
//!   flush                            ▼
//!                                  commit best, entry removed (CLOSED)
//! ```
//!
//! Refined instants are not monotonic: the solver may land before or after the coarse
//! hit. Only a forward gap closes a window, so an early candidate can never reopen an
//! occurrence that was already committed.
//!
//! Committed events are appended in commit order; the scanner sorts them at the end.
use ahash::AHashMap;
use tracing::debug;

use crate::aspect_errors::AspectError;
use crate::bodies::Body;
use crate::constants::Days;
use crate::event::AspectEvent;
use crate::time::{days_between, Instant};

/// Unordered pair of bodies: `BodyPair::new(a, b) == BodyPair::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyPair {
    first: Body,
    second: Body,
}

impl BodyPair {
    pub fn new(a: Body, b: Body) -> Self {
        if a <= b {
            BodyPair {
                first: a,
                second: b,
            }
        } else {
            BodyPair {
                first: b,
                second: a,
            }
        }
    }

    pub fn first(&self) -> Body {
        self.first
    }

    pub fn second(&self) -> Body {
        self.second
    }

    pub fn contains(&self, body: Body) -> bool {
        self.first == body || self.second == body
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub pair: BodyPair,
    pub aspect: String,
}

impl DedupKey {
    pub fn new(a: Body, b: Body, aspect: impl Into<String>) -> Self {
        DedupKey {
            pair: BodyPair::new(a, b),
            aspect: aspect.into(),
        }
    }

    pub fn of(event: &AspectEvent) -> Self {
        DedupKey::new(event.body_a, event.body_b, event.aspect.as_str())
    }
}

/// An open window: the most exact candidate so far and the latest instant seen.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    best: AspectEvent,
    last_seen: Instant,
}

impl WindowState {
    fn open(candidate: AspectEvent) -> Self {
        WindowState {
            last_seen: candidate.instant,
            best: candidate,
        }
    }

    pub fn best(&self) -> &AspectEvent {
        &self.best
    }

    pub fn best_instant(&self) -> Instant {
        self.best.instant
    }

    pub fn best_error(&self) -> f64 {
        self.best.angular_error
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }
}

/// What [`DeduplicationWindow::offer`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowUpdate {
    /// No window existed; one was opened with the candidate.
    Opened,
    /// The candidate is more exact than the current best and replaced it.
    Replaced,
    /// The candidate fell inside the window but was not more exact.
    Discarded,
    /// The gap exceeded the window: the old best was committed, a new window opened.
    Committed,
    /// The candidate lies more than a window before `last_seen`. Its occurrence was
    /// already handled, so it is dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct DeduplicationWindow {
    window_days: Days,
    open: AHashMap<DedupKey, WindowState>,
    committed: Vec<AspectEvent>,
}

impl DeduplicationWindow {
    pub fn new(window_days: Days) -> Result<Self, AspectError> {
        if !window_days.is_finite() || window_days < 0.0 {
            return Err(AspectError::InvalidScanConfig(
                "window_days must be a non-negative number".to_string(),
            ));
        }
        Ok(DeduplicationWindow {
            window_days,
            open: AHashMap::new(),
            committed: Vec::new(),
        })
    }

    pub fn window_days(&self) -> Days {
        self.window_days
    }

    /// Feed a refined candidate.
    pub fn offer(&mut self, candidate: AspectEvent) -> WindowUpdate {
        let key = DedupKey::of(&candidate);

        let Some(state) = self.open.get_mut(&key) else {
            self.open.insert(key, WindowState::open(candidate));
            return WindowUpdate::Opened;
        };

        let gap = days_between(state.last_seen, candidate.instant);
        if -gap > self.window_days {
            debug!(
                aspect = %candidate.aspect,
                instant = %candidate.instant,
                last_seen = %state.last_seen,
                "candidate precedes the open window, already covered"
            );
            return WindowUpdate::Stale;
        }
        if gap > self.window_days {
            let fresh = WindowState::open(candidate);
            let closed = std::mem::replace(state, fresh);
            debug!(
                aspect = %closed.best.aspect,
                pair = %closed.best.description(),
                instant = %closed.best.instant,
                gap_days = gap,
                "window closed"
            );
            self.committed.push(closed.best);
            return WindowUpdate::Committed;
        }

        if candidate.instant > state.last_seen {
            state.last_seen = candidate.instant;
        }
        if candidate.angular_error < state.best.angular_error {
            state.best = candidate;
            WindowUpdate::Replaced
        } else {
            WindowUpdate::Discarded
        }
    }

    /// Commit every open window.
    pub fn flush(&mut self) {
        let mut remaining: Vec<WindowState> = self.open.drain().map(|(_, state)| state).collect();
        remaining.sort_by(|a, b| a.best.chronological_cmp(&b.best));
        debug!(count = remaining.len(), "flushing open windows");
        self.committed
            .extend(remaining.into_iter().map(|state| state.best));
    }

    /// Flush and hand back every committed event, in commit order.
    pub fn into_events(mut self) -> Vec<AspectEvent> {
        self.flush();
        self.committed
    }

    pub fn get(&self, key: &DedupKey) -> Option<&WindowState> {
        self.open.get(key)
    }

    pub fn open_windows(&self) -> usize {
        self.open.len()
    }

    pub fn committed(&self) -> &[AspectEvent] {
        &self.committed
    }
}
