//! Numerical guard thresholds and geometry tolerances
//!
//! The quadrature and panel-frame code short-circuits rather than divides by
//! a near-zero quantity; the thresholds below control those branches. The
//! hand-tuned values (`VORTON_MERGE_PRECISION`, `IN_PLANE_PRECISION`) have no
//! documented derivation and are kept as named constants for review rather
//! than re-derived.

use std::f64::consts::PI;

/// 4π
pub const PI4: f64 = 4.0 * PI;

/// 2π
pub const PI2: f64 = 2.0 * PI;

/// Triangle side below this length is degenerate (m)
pub const SIDE_LENGTH_PRECISION: f64 = 1.0e-6;

/// Vertex angle closer than this to 0 or ±π flags a degenerate triangle (rad)
pub const VERTEX_ANGLE_PRECISION: f64 = 1.0e-6;

/// Denominators below this inside the integral tables return 0 for the term
pub const INTEGRAL_PRECISION: f64 = 1.0e-9;

/// |z| below this switches a field point to the in-plane (self) branch
pub const IN_PLANE_PRECISION: f64 = 1.0e-5;

/// Panel edge below this length makes the panel null (0.0001 m = 0.1 mm)
pub const LENGTH_PRECISION: f64 = 1.0e-4;

/// Colinearity threshold for internal angles (degrees)
pub const ANGLE_PRECISION: f64 = 0.01;

/// Barycentric tolerance for point-in-panel classification
pub const PANEL_PREC: f64 = 1.0e-4;

/// Vortons closer than this are merged into one (m)
pub const VORTON_MERGE_PRECISION: f64 = 1.0e-4;

/// Field points farther than RFF × panel size use far-field approximations
pub const RFF: f64 = 10.0;

/// Freestream speeds below this make a sweep point unsolvable
pub const MIN_FREESTREAM_SPEED: f64 = 1.0e-3;
