//! Vortex particles and trailing vortex segments
//!
//! A vorton carries the circulation of a piece of the wake sheet as a
//! regularized vortex particle. The induced velocity uses the
//! Rosenhead-Moore smoothing so the field stays bounded through the core.

use crate::core::constants::PI4;
use crate::core::mesh::panel::vortex_segment_velocity;
use crate::core::types::Vector3;

/// A regularized vortex particle
#[derive(Debug, Clone, Copy)]
pub struct Vorton {
    /// particle position
    pub position: Vector3,
    /// vorticity vector, circulation times segment length
    pub vortex: Vector3,
    /// cleared once the particle has left the resolved wake region
    pub active: bool,
}

impl Vorton {
    /// A particle at `position` carrying the vorticity `vortex`
    pub fn new(position: Vector3, vortex: Vector3) -> Self {
        Vorton {
            position,
            vortex,
            active: true,
        }
    }

    /// Circulation magnitude
    pub fn circulation(&self) -> f64 {
        self.vortex.norm()
    }

    /// Velocity induced at `c`, Rosenhead-Moore regularization
    pub fn induced_velocity(&self, c: &Vector3, core_length: f64) -> Vector3 {
        let r = *c - self.position;
        let s = r.norm_sq() + core_length * core_length;
        let denom = PI4 * s * s.sqrt();
        self.vortex.cross(&r) / denom
    }

    /// Velocity gradient induced at `c`
    ///
    /// `g[3 i + j]` holds `dV_j / dx_i`.
    pub fn velocity_gradient(&self, c: &Vector3, core_length: f64, g: &mut [f64; 9]) {
        let r = *c - self.position;
        let s = r.norm_sq() + core_length * core_length;
        let f = 1.0 / (PI4 * s * s.sqrt());
        let df = -3.0 / (PI4 * s * s * s.sqrt());

        let cr = self.vortex.cross(&r);
        let a = &self.vortex;
        // vortex cross the unit vectors
        let dx = Vector3::new(0.0, a.z, -a.y);
        let dy = Vector3::new(-a.z, 0.0, a.x);
        let dz = Vector3::new(a.y, -a.x, 0.0);

        let rows = [(r.x, dx), (r.y, dy), (r.z, dz)];
        for (i, (ri, d)) in rows.iter().enumerate() {
            g[3 * i] = d.x * f + cr.x * df * ri;
            g[3 * i + 1] = d.y * f + cr.y * df * ri;
            g[3 * i + 2] = d.z * f + cr.z * df * ri;
        }
    }
}

/// A straight vortex filament closing the circulation of a vorton pair
///
/// The node indices point into the vorton row shed at the same time, so the
/// filament follows its end vortons when rows are merged or renumbered.
#[derive(Debug, Clone, Copy)]
pub struct TrailingVortex {
    /// filament end points
    pub nodes: [Vector3; 2],
    /// indices of the end vortons in their row
    pub node_idx: [usize; 2],
    /// filament circulation
    pub circulation: f64,
}

impl TrailingVortex {
    /// Velocity induced at `c`, with a solid-core cutoff
    pub fn induced_velocity(&self, c: &Vector3, core_radius: f64) -> Vector3 {
        vortex_segment_velocity(&self.nodes[0], &self.nodes[1], c, core_radius)
            * (self.circulation / PI4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn induced_velocity_is_azimuthal() {
        // a z-directed vorton at the origin induces a velocity along +y at
        // a point on the +x axis
        let vtn = Vorton::new(Vector3::ZERO, Vector3::new(0.0, 0.0, 1.0));
        let v = vtn.induced_velocity(&Vector3::new(1.0, 0.0, 0.0), 0.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-14);
        assert_relative_eq!(v.y, 1.0 / PI4, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn core_regularization_bounds_the_field() {
        let vtn = Vorton::new(Vector3::ZERO, Vector3::new(0.0, 0.0, 1.0));
        let near = vtn.induced_velocity(&Vector3::new(1e-9, 0.0, 0.0), 0.1);
        assert!(near.norm() < 1e-6);
        // far from the core the regularized and singular kernels agree
        let far = vtn.induced_velocity(&Vector3::new(10.0, 0.0, 0.0), 0.1);
        let singular = vtn.induced_velocity(&Vector3::new(10.0, 0.0, 0.0), 0.0);
        assert_relative_eq!(far.y, singular.y, max_relative = 1e-3);
    }

    #[test]
    fn velocity_gradient_matches_finite_differences() {
        let vtn = Vorton::new(
            Vector3::new(0.2, -0.1, 0.4),
            Vector3::new(0.3, 1.0, -0.5),
        );
        let c = Vector3::new(1.0, 0.7, -0.3);
        let core = 0.05;
        let mut g = [0.0; 9];
        vtn.velocity_gradient(&c, core, &mut g);

        let h = 1e-6;
        let axes = [
            Vector3::new(h, 0.0, 0.0),
            Vector3::new(0.0, h, 0.0),
            Vector3::new(0.0, 0.0, h),
        ];
        for (i, e) in axes.iter().enumerate() {
            let vp = vtn.induced_velocity(&(c + *e), core);
            let vm = vtn.induced_velocity(&(c - *e), core);
            let fd = (vp - vm) / (2.0 * h);
            assert_relative_eq!(g[3 * i], fd.x, epsilon = 1e-6);
            assert_relative_eq!(g[3 * i + 1], fd.y, epsilon = 1e-6);
            assert_relative_eq!(g[3 * i + 2], fd.z, epsilon = 1e-6);
        }
    }

    #[test]
    fn trailing_vortex_matches_biot_savart() {
        let tv = TrailingVortex {
            nodes: [Vector3::new(-1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)],
            node_idx: [0, 1],
            circulation: 2.0,
        };
        // point at unit distance from the segment mid-point
        let v = tv.induced_velocity(&Vector3::new(0.0, 1.0, 0.0), 1e-6);
        // V = Γ/(4π h) (cosθ1 - cosθ2)
        let expected = 2.0 / PI4 * 2.0 / (2.0f64).sqrt();
        assert_relative_eq!(v.norm(), expected, epsilon = 1e-10);
    }
}
