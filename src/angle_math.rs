//! Angular distances on the ecliptic circle.
//!
//! All inputs are degrees and may lie outside `[0, 360)`; results never depend
//! on which side of the 0/360 seam the inputs sit.
use crate::constants::{Degree, FULL_CIRCLE, HALF_CIRCLE};

/// Wrap any angle into `[0, 360)`.
pub fn normalize(angle: Degree) -> Degree {
    let wrapped = angle.rem_euclid(FULL_CIRCLE);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= FULL_CIRCLE {
        0.0
    } else {
        wrapped
    }
}

/// Raw separation `|lon1 - lon2|` folded into `[0, 360)`.
fn raw_separation(lon1: Degree, lon2: Degree) -> Degree {
    normalize((lon1 - lon2).abs())
}

/// Shorter of the two circular paths between two longitudes, in `[0, 180]`.
pub fn short_arc(lon1: Degree, lon2: Degree) -> Degree {
    let d = raw_separation(lon1, lon2);
    if d > HALF_CIRCLE {
        FULL_CIRCLE - d
    } else {
        d
    }
}

/// Longer of the two circular paths between two longitudes, in `[180, 360]`.
///
/// `short_arc(a, b) + long_arc(a, b) == 360` for all inputs.
pub fn long_arc(lon1: Degree, lon2: Degree) -> Degree {
    let d = raw_separation(lon1, lon2);
    if d > HALF_CIRCLE {
        d
    } else {
        FULL_CIRCLE - d
    }
}

/// Both arcs at once, `(short, long)`.
pub fn both_arcs(lon1: Degree, lon2: Degree) -> (Degree, Degree) {
    let short = short_arc(lon1, lon2);
    (short, FULL_CIRCLE - short)
}

/// Distance between a measured angle and a target, corrected across the 0/360 seam.
pub fn angular_error(measured: Degree, target: Degree) -> Degree {
    short_arc(normalize(measured), normalize(target))
}

/// `true` when `measured` lies within `orb` degrees of `target`.
pub fn within_orb(measured: Degree, target: Degree, orb: Degree) -> bool {
    angular_error(measured, target) <= orb
}
