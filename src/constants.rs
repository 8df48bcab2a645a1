//! # Constants and type definitions for aspect scanning
//!
//! This module centralizes the **angular constants**, **default tolerances**, and **unit
//! aliases** shared by the detection, refinement and deduplication stages.
//!
//! ## Overview
//!
//! - Circle constants (full turn, half turn)
//! - Core type aliases (`Degree`, `Days`, `JD`)
//! - Default solver tolerances and scan parameters
//!
//! Every default here can be overridden through
//! [`SolverConfig`](crate::solver::SolverConfig) or
//! [`ScanConfig`](crate::scanner::ScanConfig).

// -------------------------------------------------------------------------------------------------
// Circle constants
// -------------------------------------------------------------------------------------------------

/// One full turn, in degrees
pub const FULL_CIRCLE: f64 = 360.0;

/// Half a turn, in degrees (largest possible short arc)
pub const HALF_CIRCLE: f64 = 180.0;

/// Number of hours in a day
pub const HOURS_PER_DAY: f64 = 24.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Time span in (fractional) days
pub type Days = f64;
/// Julian Date (days, UTC)
pub type JD = f64;

// -------------------------------------------------------------------------------------------------
// Solver defaults
// -------------------------------------------------------------------------------------------------

/// Midpoint error below which the bisection stops early (≈ 0.36 arcsec)
pub const DEFAULT_SOLVER_TOLERANCE: Degree = 1e-4;

/// Post-check acceptance threshold for a refined instant (≈ 36 arcsec)
pub const DEFAULT_ACCEPTANCE_TOLERANCE: Degree = 0.01;

/// Iteration cap of the bisection
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// How far before the coarse hit the bracket starts (one default scan step)
pub const DEFAULT_LEAD_DAYS: Days = DEFAULT_STEP_DAYS;

/// How far after the coarse hit the bracket extends
pub const DEFAULT_HORIZON_DAYS: Days = 30.0;

/// First forward step when confining the bracket (1 hour), doubled at each step
pub const DEFAULT_EXPANSION_DAYS: Days = 1.0 / HOURS_PER_DAY;

// -------------------------------------------------------------------------------------------------
// Scan defaults
// -------------------------------------------------------------------------------------------------

/// Coarse scan step (3 hours)
pub const DEFAULT_STEP_DAYS: Days = 3.0 / HOURS_PER_DAY;

/// Inactivity gap after which a dedup window is committed
pub const DEFAULT_WINDOW_DAYS: Days = 30.0;
