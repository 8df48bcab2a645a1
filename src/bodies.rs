//! # Celestial bodies and participation groups
//!
//! [`Body`] is an opaque key for the ten bodies a scan can involve. It carries no state;
//! longitudes come from a [`PositionProvider`](crate::position::PositionProvider).
//!
//! Bodies are grouped the way aspect work traditionally splits them:
//!
//! ```text
//! Luminaries   : Sun, Moon
//! Fast planets : Mercury, Venus, Mars
//! Slow planets : Jupiter, Saturn, Uranus, Neptune, Pluto
//! ```
//!
//! [`BodySelection`] picks groups once, up front, and is handed to the scanner as an
//! immutable value.
use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::aspect_errors::AspectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    /// Every body, in canonical order.
    pub const ALL: [Body; 10] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
        }
    }

    pub fn group(&self) -> BodyGroup {
        match self {
            Body::Sun | Body::Moon => BodyGroup::Luminaries,
            Body::Mercury | Body::Venus | Body::Mars => BodyGroup::FastPlanets,
            _ => BodyGroup::SlowPlanets,
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Body {
    type Err = AspectError;

    /// Case-insensitive parse of a body name (e.g. `"jupiter"` → [`Body::Jupiter`]).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Body::ALL
            .iter()
            .copied()
            .find(|body| body.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AspectError::UnknownBody(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyGroup {
    Luminaries,
    FastPlanets,
    SlowPlanets,
}

/// Which bodies participate in a scan.
///
/// Either a set of enabled groups or an explicit list. The default enables the
/// luminaries and the slow planets.
#[derive(Debug, Clone, PartialEq)]
pub enum BodySelection {
    Groups {
        luminaries: bool,
        fast_planets: bool,
        slow_planets: bool,
    },
    Explicit(Vec<Body>),
}

impl Default for BodySelection {
    fn default() -> Self {
        BodySelection::Groups {
            luminaries: true,
            fast_planets: false,
            slow_planets: true,
        }
    }
}

impl BodySelection {
    /// All ten bodies.
    pub fn all() -> Self {
        BodySelection::Groups {
            luminaries: true,
            fast_planets: true,
            slow_planets: true,
        }
    }

    /// Participating bodies, without duplicates.
    ///
    /// Group selections come back in canonical order; explicit lists keep the
    /// caller's order (first occurrence wins).
    pub fn bodies(&self) -> Vec<Body> {
        match self {
            BodySelection::Groups {
                luminaries,
                fast_planets,
                slow_planets,
            } => Body::ALL
                .iter()
                .copied()
                .filter(|body| match body.group() {
                    BodyGroup::Luminaries => *luminaries,
                    BodyGroup::FastPlanets => *fast_planets,
                    BodyGroup::SlowPlanets => *slow_planets,
                })
                .collect(),
            BodySelection::Explicit(list) => {
                let mut out: Vec<Body> = Vec::with_capacity(list.len());
                for body in list {
                    if !out.contains(body) {
                        out.push(*body);
                    }
                }
                out
            }
        }
    }
}

impl From<Vec<Body>> for BodySelection {
    fn from(list: Vec<Body>) -> Self {
        BodySelection::Explicit(list)
    }
}
