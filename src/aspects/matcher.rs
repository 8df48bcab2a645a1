//! First-match aspect lookup.
//!
//! Definitions are tried in catalog order and the first one whose orb contains the
//! measured arc is returned. Declaration order, not closeness, breaks ties between
//! overlapping orbs.
use crate::constants::Degree;

use super::{AspectCatalog, AspectDefinition};

/// A definition that currently holds between two longitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectMatch<'a> {
    pub definition: &'a AspectDefinition,
    /// Arc measured on the definition's convention
    pub measured_angle: Degree,
    /// Distance between the measured arc and the definition's target
    pub error: Degree,
}

/// Find the highest-priority aspect formed by two longitudes.
///
/// Arguments
/// -----------------
/// * `catalog`: ordered aspect definitions
/// * `lon1`, `lon2`: ecliptic longitudes in degrees
///
/// Return
/// ----------
/// * The first matching definition with its measured arc and error, or `None`.
pub fn find_aspect(catalog: &AspectCatalog, lon1: Degree, lon2: Degree) -> Option<AspectMatch<'_>> {
    catalog
        .iter()
        .find(|definition| definition.matches(lon1, lon2))
        .map(|definition| AspectMatch {
            definition,
            measured_angle: definition.measure(lon1, lon2),
            error: definition.error(lon1, lon2),
        })
}

impl AspectCatalog {
    /// See [`find_aspect`].
    pub fn find_match(&self, lon1: Degree, lon2: Degree) -> Option<AspectMatch<'_>> {
        find_aspect(self, lon1, lon2)
    }
}
