//! Core type definitions for the panel solver
//!
//! This module defines the fundamental data structures used throughout the
//! solver: small fixed-size vectors, flow conditions, solver settings and the
//! result containers produced for each point of a sweep.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::constants::MIN_FREESTREAM_SPEED;

// ============================================================================
// Vectors
// ============================================================================

/// A 3-component vector in body or panel-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// x component
    pub x: f64,
    /// y component
    pub y: f64,
    /// z component
    pub z: f64,
}

impl Vector3 {
    /// The zero vector
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a vector from components
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    /// Dot product
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Squared norm
    pub fn norm_sq(&self) -> f64 {
        self.dot(self)
    }

    /// Distance to another point
    pub fn distance_to(&self, other: &Vector3) -> f64 {
        (*self - *other).norm()
    }

    /// Return the unit vector in the same direction, or zero for a null vector
    pub fn normalized(&self) -> Vector3 {
        let n = self.norm();
        if n > 0.0 {
            *self / n
        } else {
            Vector3::ZERO
        }
    }

    /// Normalize in place; a null vector is left unchanged
    pub fn normalize(&mut self) {
        let n = self.norm();
        if n > 0.0 {
            *self /= n;
        }
    }

    /// Rotate the vector by `angle_deg` degrees about the axis `n`
    ///
    /// Rodrigues rotation; `n` need not be normalized.
    pub fn rotated(&self, n: &Vector3, angle_deg: f64) -> Vector3 {
        let axis = n.normalized();
        let theta = angle_deg.to_radians();
        let (s, c) = theta.sin_cos();
        *self * c + axis.cross(self) * s + axis * (axis.dot(self) * (1.0 - c))
    }

    /// True if any component is not finite
    pub fn has_nan(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite())
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;
    fn div(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Vector3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, rhs: Vector3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl MulAssign<f64> for Vector3 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl DivAssign<f64> for Vector3 {
    fn div_assign(&mut self, rhs: f64) {
        self.x /= rhs;
        self.y /= rhs;
        self.z /= rhs;
    }
}

/// A 2-component vector used for panel-local in-plane coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    /// x component
    pub x: f64,
    /// y component
    pub y: f64,
}

impl Vector2 {
    /// Create a vector from components
    pub const fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    /// Dot product
    pub fn dot(&self, other: &Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

// ============================================================================
// Flow conditions and settings
// ============================================================================

/// One point of a flow sweep: freestream speed and attitude angles
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlowCondition {
    /// Freestream speed (m/s)
    pub speed: f64,
    /// Angle of attack (degrees)
    pub alpha_deg: f64,
    /// Sideslip angle (degrees)
    pub beta_deg: f64,
}

impl FlowCondition {
    /// Create a flow condition
    pub fn new(speed: f64, alpha_deg: f64, beta_deg: f64) -> Self {
        FlowCondition {
            speed,
            alpha_deg,
            beta_deg,
        }
    }

    /// Freestream velocity vector in body axes
    ///
    /// The x axis points downstream for α = β = 0; the sign of β follows the
    /// wind-axis convention.
    pub fn freestream(&self) -> Vector3 {
        let alpha = self.alpha_deg.to_radians();
        let beta = -self.beta_deg.to_radians();
        Vector3::new(
            self.speed * alpha.cos() * beta.cos(),
            self.speed * beta.sin(),
            self.speed * alpha.sin() * beta.cos(),
        )
    }

    /// True if the freestream is too slow to define a meaningful solution
    pub fn is_zero_freestream(&self) -> bool {
        self.speed.abs() < MIN_FREESTREAM_SPEED
    }
}

/// Which analytic kernel evaluates the singular panel integrals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadratureKernel {
    /// Recursive line-integral tables (Carley)
    Carley,
    /// Explicit per-edge formulae (Nintcheu Fata); falls back to the line
    /// integrals for in-plane field points
    NintcheuFata,
}

/// User-facing solver settings, grouped per analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Air density (kg/m³)
    pub density: f64,
    /// Model thin surfaces with doublet-only (vortex-lattice style) panels
    pub thin_surfaces: bool,
    /// Grow a vortex-particle wake instead of keeping the flat panel wake
    pub vorton_wake: bool,
    /// Number of wake relaxation passes when `vorton_wake` is set
    pub vpw_iterations: usize,
    /// Regularization core radius for wake particles (m)
    pub vorton_core_radius: f64,
    /// Time step used to convect wake particles (s)
    pub vorton_time_step: f64,
    /// Analytic kernel used for panel influence integrals
    pub kernel: QuadratureKernel,
    /// Number of streamwise wake panel rows behind each trailing edge
    pub wake_panel_count: usize,
    /// Total wake length in mean chords
    pub wake_length_factor: f64,
    /// Geometric progression ratio of streamwise wake panel lengths
    pub wake_progression: f64,
    /// Distance of the Trefftz plane behind the trailing edge, in mean chords
    pub trefftz_distance: f64,
    /// Height above the ground plane, when ground effect is enabled (m)
    pub ground_height: Option<f64>,
    /// Mirror with a free surface (sign-flipped image) instead of a ground
    pub free_surface: bool,
    /// Distribute matrix assembly and sweep points over worker threads
    pub multithread: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            density: 1.225,
            thin_surfaces: false,
            vorton_wake: false,
            vpw_iterations: 5,
            vorton_core_radius: 0.01,
            vorton_time_step: 0.01,
            kernel: QuadratureKernel::Carley,
            wake_panel_count: 30,
            wake_length_factor: 100.0,
            wake_progression: 1.1,
            trefftz_distance: 100.0,
            ground_height: None,
            free_surface: false,
            multithread: true,
        }
    }
}

// ============================================================================
// Quadrature bookkeeping
// ============================================================================

/// Mutable scratch state threaded through the quadrature routines
///
/// Each worker owns its own context, so the counters stay meaningful under
/// multithreaded assembly.
#[derive(Debug, Clone, Default)]
pub struct QuadratureContext {
    /// Number of degenerate (null) triangles skipped during integration
    pub degenerate_triangles: usize,
}

impl QuadratureContext {
    /// Fresh context with zeroed counters
    pub fn new() -> Self {
        QuadratureContext::default()
    }

    /// Fold another context's counters into this one
    pub fn merge(&mut self, other: &QuadratureContext) {
        self.degenerate_triangles += other.degenerate_triangles;
    }
}

// ============================================================================
// Results
// ============================================================================

/// Spanwise result distributions, one value per trailing-edge strip
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanDistribs {
    /// Spanwise station of each strip (m)
    pub span_pos: Vec<f64>,
    /// Local lift coefficient times local chord (m)
    pub cl_chord: Vec<f64>,
    /// Bound circulation at the trailing edge (m²/s)
    pub gamma: Vec<f64>,
    /// Induced angle from the Trefftz-plane downwash (degrees)
    pub induced_angle: Vec<f64>,
}

/// Converged results for one flow condition of a sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// The flow condition this point was solved at
    pub condition: FlowCondition,
    /// Doublet strength per panel
    pub doublets: Vec<f64>,
    /// Source strength per panel
    pub sources: Vec<f64>,
    /// Surface velocity per panel, body axes
    pub velocities: Vec<Vector3>,
    /// Pressure coefficient per panel (ΔCp for thin panels)
    pub cp: Vec<f64>,
    /// Integrated aerodynamic force, body axes (N)
    pub force: Vector3,
    /// Integrated aerodynamic moment about the origin, body axes (N·m)
    pub moment: Vector3,
    /// Induced drag from the Trefftz-plane integration (N)
    pub induced_drag: f64,
    /// Spanwise distributions along the trailing edge
    pub span: SpanDistribs,
    /// Degenerate-triangle count accumulated during assembly
    pub degenerate_triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cross_product_is_orthogonal() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(-2.0, 0.5, 4.0);
        let c = a.cross(&b);
        assert_relative_eq!(c.dot(&a), 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.dot(&b), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_preserves_norm() {
        let v = Vector3::new(1.0, -2.0, 0.5);
        let axis = Vector3::new(0.0, 1.0, 1.0);
        let r = v.rotated(&axis, 37.0);
        assert_relative_eq!(r.norm(), v.norm(), epsilon = 1e-12);
    }

    #[test]
    fn rotation_about_z_by_90_degrees() {
        let v = Vector3::new(1.0, 0.0, 0.0);
        let r = v.rotated(&Vector3::new(0.0, 0.0, 1.0), 90.0);
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(r.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn freestream_at_zero_incidence_is_along_x() {
        let fc = FlowCondition::new(10.0, 0.0, 0.0);
        let v = fc.freestream();
        assert_relative_eq!(v.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn freestream_alpha_tilts_into_z() {
        let fc = FlowCondition::new(1.0, 90.0, 0.0);
        let v = fc.freestream();
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_freestream_detection() {
        assert!(FlowCondition::new(1e-4, 0.0, 0.0).is_zero_freestream());
        assert!(!FlowCondition::new(1.0, 0.0, 0.0).is_zero_freestream());
    }
}
