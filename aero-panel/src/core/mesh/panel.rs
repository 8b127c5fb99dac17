//! Flat triangular panel with linear doublet and constant source densities
//!
//! A panel owns its geometry in both the global frame and a local frame with
//! the x axis along the first edge and the z axis along the outward normal.
//! The influence evaluations return potentials and velocities scaled by 4π,
//! so unit-strength results must be divided by 4π to obtain physical values.
//!
//! Two evaluation families are provided: the moment-integral kernels built
//! on the quadrature module (used for the linear doublet basis), and the
//! NASA TN D-4023 per-edge formulae for constant densities (used for wake
//! panels and the vortex-lattice mode).

use crate::core::constants::{ANGLE_PRECISION, IN_PLANE_PRECISION, LENGTH_PRECISION, PI2, RFF};
use crate::core::integration::carley::CarleyTriangle;
use crate::core::integration::gauss::GaussTriangle;
use crate::core::integration::nintcheu::NintcheuPanel;
use crate::core::types::{QuadratureContext, QuadratureKernel, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Which surface of the model a panel belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfacePosition {
    /// Upper surface of a thick lifting body
    Top,
    /// Lower surface of a thick lifting body
    Bottom,
    /// Camber surface of a thin (vortex-lattice style) body
    Mid,
    /// Tip closure surface
    Side,
    /// Non-lifting body surface
    Body,
    /// Wake sheet behind a trailing edge
    Wake,
}

/// A flat triangular panel
///
/// Vertex and edge numbering:
///
/// ```text
///                N0
///               / \
///       edge2  /   \  edge1
///             /     \
///           N1-------N2
///              edge0
/// ```
#[derive(Debug, Clone)]
pub struct Panel {
    /// vertices, global frame
    pub s: [Vector3; 3],
    /// node indices into the owning mesh
    pub node_idx: [usize; 3],
    /// surface this panel belongs to
    pub pos: SurfacePosition,
    /// outward unit normal
    pub normal: Vector3,
    /// area
    pub area: f64,
    /// signed area in the local frame
    pub signed_area: f64,
    /// longest edge length
    pub max_size: f64,
    /// centroid, global frame
    pub cog: Vector3,
    /// internal angles at each vertex (degrees)
    pub angles: [f64; 3],
    /// set when the geometry is too degenerate to evaluate
    pub null_triangle: bool,

    /// local x axis (along edge 2, vertex 0 to vertex 1)
    pub l: Vector3,
    /// local y axis
    pub m: Vector3,
    /// vertices in the local frame (z = 0)
    pub sl: [Vector3; 3],
    /// centroid in the local frame
    pub cog_l: Vector3,
    /// barycentric matrix: b_k(x, y) = gmat[3k] + gmat[3k+1] x + gmat[3k+2] y
    pub gmat: [f64; 9],
    /// first moments ∫ x b_k dS of the basis functions
    pub bx: [f64; 3],
    /// first moments ∫ y b_k dS of the basis functions
    pub by: [f64; 3],

    /// neighbouring panel across each edge
    pub neighbors: [Option<usize>; 3],
    /// true if edge 0 lies on the trailing edge
    pub trailing: bool,
    /// true if edge 0 lies on the leading edge
    pub leading: bool,
    /// true for panels on the port half of a wing
    pub left_wing: bool,
    /// upstream panel in the same column
    pub up: Option<usize>,
    /// downstream panel in the same column
    pub down: Option<usize>,
    /// first wake panel behind this trailing panel
    pub wake: Option<usize>,
    /// wake column index behind this trailing panel
    pub wake_column: Option<usize>,
    /// matching panel on the other surface of a thick wing
    pub opposite: Option<usize>,
}

impl Panel {
    /// Build a panel from three vertices in positive orientation
    pub fn new(
        s0: Vector3,
        s1: Vector3,
        s2: Vector3,
        node_idx: [usize; 3],
        pos: SurfacePosition,
    ) -> Self {
        let mut panel = Panel {
            s: [s0, s1, s2],
            node_idx,
            pos,
            normal: Vector3::ZERO,
            area: 0.0,
            signed_area: 0.0,
            max_size: 0.0,
            cog: Vector3::ZERO,
            angles: [0.0; 3],
            null_triangle: true,
            l: Vector3::ZERO,
            m: Vector3::ZERO,
            sl: [Vector3::ZERO; 3],
            cog_l: Vector3::ZERO,
            gmat: [0.0; 9],
            bx: [0.0; 3],
            by: [0.0; 3],
            neighbors: [None; 3],
            trailing: false,
            leading: false,
            left_wing: false,
            up: None,
            down: None,
            wake: None,
            wake_column: None,
            opposite: None,
        };
        panel.set_frame();
        panel
    }

    /// Rebuild the frame quantities from the current vertices
    pub fn set_frame(&mut self) {
        let e0 = self.s[2] - self.s[1]; // edge 0
        let e1 = self.s[0] - self.s[2]; // edge 1
        let e2 = self.s[1] - self.s[0]; // edge 2

        self.cog = (self.s[0] + self.s[1] + self.s[2]) / 3.0;

        if e0.norm() < LENGTH_PRECISION
            || e1.norm() < LENGTH_PRECISION
            || e2.norm() < LENGTH_PRECISION
        {
            self.area = 0.0;
            self.signed_area = 0.0;
            self.null_triangle = true;
            return;
        }
        self.null_triangle = false;

        let n = e1.cross(&e2);
        self.area = n.norm() / 2.0;
        self.normal = n.normalized();

        self.max_size = e0.norm().max(e1.norm()).max(e2.norm());

        // internal angles
        let cost0 = e1.dot(&(-e2)) / e1.norm() / e2.norm();
        let sint0 = e2.cross(&(-e1)).dot(&self.normal) / e1.norm() / e2.norm();
        self.angles[0] = sint0.atan2(cost0).to_degrees();
        let cost1 = e0.dot(&(-e2)) / e0.norm() / e2.norm();
        let sint1 = e0.cross(&(-e2)).dot(&self.normal) / e0.norm() / e2.norm();
        self.angles[1] = sint1.atan2(cost1).to_degrees();
        self.angles[2] = 180.0 - self.angles[1] - self.angles[0];

        if self.angles.iter().any(|a| a.abs() < ANGLE_PRECISION) {
            // the three vertices are colinear
            self.area = 0.0;
            self.signed_area = 0.0;
            self.null_triangle = true;
            return;
        }

        // local frame: x along edge 2, origin at the centroid
        self.l = e2.normalized();
        self.m = self.normal.cross(&self.l);

        for k in 0..3 {
            self.sl[k] = self.global_to_local(&(self.s[k] - self.cog));
        }
        self.cog_l = Vector3::ZERO;

        self.signed_area = ((self.sl[1].x - self.sl[0].x) * (self.sl[2].y - self.sl[0].y)
            - (self.sl[2].x - self.sl[0].x) * (self.sl[1].y - self.sl[0].y))
            / 2.0;

        // barycentric matrix
        let (x0, y0) = (self.sl[0].x, self.sl[0].y);
        let (x1, y1) = (self.sl[1].x, self.sl[1].y);
        let (x2, y2) = (self.sl[2].x, self.sl[2].y);
        let det = x0 * (y1 - y2) + x1 * (y2 - y0) + x2 * (y0 - y1);
        self.gmat = [
            (x1 * y2 - x2 * y1) / det,
            (y1 - y2) / det,
            (x2 - x1) / det,
            (x2 * y0 - x0 * y2) / det,
            (y2 - y0) / det,
            (x0 - x2) / det,
            (x0 * y1 - x1 * y0) / det,
            (y0 - y1) / det,
            (x1 - x0) / det,
        ];

        // first moments of the basis functions, used by the far-field
        // doublet approximation; x.b_k is quadratic so order 5 is plenty
        let gq = GaussTriangle::new(5);
        for k in 0..3 {
            self.bx[k] = gq.integrate(&self.sl, |x, y| x * self.basis(x, y, k));
            self.by[k] = gq.integrate(&self.sl, |x, y| y * self.basis(x, y, k));
        }
    }

    // ------------------------------------------------------------------
    // frames and basis functions
    // ------------------------------------------------------------------

    /// Express a global-frame vector in the local frame
    pub fn global_to_local(&self, v: &Vector3) -> Vector3 {
        Vector3::new(v.dot(&self.l), v.dot(&self.m), v.dot(&self.normal))
    }

    /// Express a local-frame vector in the global frame
    pub fn local_to_global(&self, v: &Vector3) -> Vector3 {
        self.l * v.x + self.m * v.y + self.normal * v.z
    }

    /// Map a global position to panel-local coordinates
    pub fn global_to_local_position(&self, pt: &Vector3) -> Vector3 {
        self.global_to_local(&(*pt - self.cog))
    }

    /// Map a panel-local position to global coordinates
    pub fn local_to_global_position(&self, pt: &Vector3) -> Vector3 {
        self.cog + self.local_to_global(pt)
    }

    /// Linear basis function of vertex `k` at a local point
    pub fn basis(&self, x: f64, y: f64, k: usize) -> f64 {
        self.gmat[3 * k] + self.gmat[3 * k + 1] * x + self.gmat[3 * k + 2] * y
    }

    /// Barycentric coordinates of a local point
    pub fn barycentric(&self, x: f64, y: f64) -> [f64; 3] {
        [self.basis(x, y, 0), self.basis(x, y, 1), self.basis(x, y, 2)]
    }

    /// True when this panel models a thin surface
    pub fn is_thin(&self) -> bool {
        self.pos == SurfacePosition::Mid
    }

    /// True when this panel belongs to the wake sheet
    pub fn is_wake(&self) -> bool {
        self.pos == SurfacePosition::Wake
    }

    // ------------------------------------------------------------------
    // moment-integral kernels
    // ------------------------------------------------------------------

    /// Sum the Carley line integrals over the three sub-triangles at `pt`
    fn carley_integrals(
        &self,
        pt_global: &Vector3,
        in_plane: bool,
        gradients: bool,
        mut g1: Option<&mut [f64; 3]>,
        mut g3: Option<&mut [f64; 6]>,
        mut g5: Option<&mut [f64; 6]>,
        ctx: &mut QuadratureContext,
    ) {
        let ptl = self.global_to_local_position(pt_global);
        let local_normal = Vector3::new(0.0, 0.0, 1.0);
        for k in 0..3 {
            let tri = CarleyTriangle::new(
                &ptl,
                &self.sl[k],
                &self.sl[(k + 1) % 3],
                &local_normal,
                ctx,
            );
            if tri.is_null() {
                continue;
            }
            tri.accumulate(
                &ptl,
                in_plane,
                gradients,
                g1.as_deref_mut(),
                g3.as_deref_mut(),
                g5.as_deref_mut(),
            );
        }
    }

    /// Moment integrals by the configured kernel, with in-plane fallback
    fn kernel_integrals(
        &self,
        pt_global: &Vector3,
        in_plane: bool,
        gradients: bool,
        kernel: QuadratureKernel,
        g1: Option<&mut [f64; 3]>,
        g3: Option<&mut [f64; 6]>,
        g5: Option<&mut [f64; 6]>,
        ctx: &mut QuadratureContext,
    ) {
        if kernel == QuadratureKernel::NintcheuFata && !in_plane {
            // the explicit formulae reject points too close to the plane,
            // which the in-plane flag has already screened out here
            let nf = NintcheuPanel::new(self.sl, self.cog_l);
            let ptl = self.global_to_local_position(pt_global);
            if nf.integrals(&ptl, gradients, g1, g3, g5) {
                return;
            }
        } else {
            self.carley_integrals(pt_global, in_plane, gradients, g1, g3, g5, ctx);
        }
    }

    /// Potential of a unit source density, scaled by 4π
    pub fn source_potential(
        &self,
        pt: &Vector3,
        kernel: QuadratureKernel,
        ctx: &mut QuadratureContext,
    ) -> f64 {
        let ptl = self.global_to_local_position(pt);
        let r = ptl.norm();
        if r > RFF * self.max_size {
            return -self.area / r;
        }

        let in_plane = ptl.z.abs() < IN_PLANE_PRECISION;
        let mut i1 = [0.0; 3];
        self.kernel_integrals(pt, in_plane, false, kernel, Some(&mut i1), None, None, ctx);
        -i1[0]
    }

    /// Velocity of a unit source density, global frame, scaled by 4π
    ///
    /// `is_self` applies the exterior Neumann limit 2π n.
    pub fn source_velocity(
        &self,
        pt: &Vector3,
        is_self: bool,
        kernel: QuadratureKernel,
        ctx: &mut QuadratureContext,
    ) -> Vector3 {
        if is_self {
            // exterior limit of the normal velocity jump
            return self.normal * PI2;
        }

        let ptl = self.global_to_local_position(pt);
        let r = ptl.norm();
        if r > RFF * self.max_size {
            let invr3 = 1.0 / (r * r * r);
            return self.local_to_global(&(ptl * (self.area * invr3)));
        }

        let in_plane = ptl.z.abs() < IN_PLANE_PRECISION;
        let mut i3 = [0.0; 6];
        self.kernel_integrals(pt, in_plane, false, kernel, None, Some(&mut i3), None, ctx);

        let vel = Vector3::new(
            ptl.x * i3[0] - i3[1],
            ptl.y * i3[0] - i3[2],
            ptl.z * i3[0],
        );
        self.local_to_global(&vel)
    }

    /// Potentials of the three unit-density basis doublets, scaled by 4π
    ///
    /// On the panel itself the limit is taken on the internal face, matching
    /// the internal Dirichlet boundary condition.
    pub fn doublet_basis_potential(
        &self,
        pt: &Vector3,
        is_self: bool,
        kernel: QuadratureKernel,
        use_rff: bool,
        ctx: &mut QuadratureContext,
    ) -> [f64; 3] {
        let ptl = self.global_to_local_position(pt);
        let r = ptl.norm();

        if is_self {
            return [
                PI2 * self.basis(ptl.x, ptl.y, 0),
                PI2 * self.basis(ptl.x, ptl.y, 1),
                PI2 * self.basis(ptl.x, ptl.y, 2),
            ];
        }

        if ptl.z.abs() < IN_PLANE_PRECISION {
            // the doublet potential vanishes in the panel's plane outside
            // the panel
            return [0.0; 3];
        }

        if use_rff && r > RFF * self.max_size {
            let phi = -ptl.z / (r * r * r) * self.area / 3.0;
            return [phi; 3];
        }

        let mut g3 = [0.0; 6];
        self.kernel_integrals(pt, false, false, kernel, None, Some(&mut g3), None, ctx);

        let j03 = self.basis_transform(&g3, 0);
        [-ptl.z * j03[0], -ptl.z * j03[1], -ptl.z * j03[2]]
    }

    /// Velocities of the three unit-density basis doublets, global frame,
    /// scaled by 4π
    pub fn doublet_basis_velocity(
        &self,
        pt: &Vector3,
        kernel: QuadratureKernel,
        use_rff: bool,
        ctx: &mut QuadratureContext,
    ) -> [Vector3; 3] {
        let ptl = self.global_to_local_position(pt);
        let r = ptl.norm();

        if use_rff && r > RFF * self.max_size {
            let invr3 = 1.0 / (r * r * r);
            let invr5 = invr3 / (r * r);
            let vz = (-invr3 + 3.0 * ptl.z * ptl.z * invr5) * self.area / 3.0;
            let mut out = [Vector3::ZERO; 3];
            for k in 0..3 {
                let vl = Vector3::new(
                    ptl.z * invr5 * (ptl.x * self.area - self.bx[k]),
                    ptl.z * invr5 * (ptl.y * self.area - self.by[k]),
                    vz,
                );
                out[k] = self.local_to_global(&vl);
            }
            return out;
        }

        let in_plane = ptl.z.abs() < IN_PLANE_PRECISION;
        let mut g3 = [0.0; 6];
        let mut g5 = [0.0; 6];
        self.kernel_integrals(
            pt,
            in_plane,
            true,
            kernel,
            None,
            Some(&mut g3),
            Some(&mut g5),
            ctx,
        );

        let j03 = self.basis_transform(&g3, 0);
        let j05 = self.basis_transform(&g5, 0);
        let jx5 = self.basis_transform(&g5, 1);
        let jy5 = self.basis_transform(&g5, 2);

        let mut out = [Vector3::ZERO; 3];
        for k in 0..3 {
            let vl = Vector3::new(
                3.0 * ptl.z * (ptl.x * j05[k] - jx5[k]),
                3.0 * ptl.z * (ptl.y * j05[k] - jy5[k]),
                -j03[k] + 3.0 * ptl.z * ptl.z * j05[k],
            );
            out[k] = self.local_to_global(&vl);
        }
        out
    }

    /// Convert moment integrals into per-basis values
    ///
    /// `offset` selects the moment family: 0 for `[1, x, y]`, 1 for
    /// `[x, x², xy]`, 2 for `[y, xy, y²]`.
    fn basis_transform(&self, g: &[f64; 6], offset: usize) -> [f64; 3] {
        let (i0, ix, iy) = match offset {
            0 => (g[0], g[1], g[2]),
            1 => (g[1], g[3], g[4]),
            _ => (g[2], g[4], g[5]),
        };
        let det_a = 2.0 * self.area;
        let s = &self.sl;
        [
            ((s[1].x * s[2].y - s[1].y * s[2].x) * i0 - (s[2].y - s[1].y) * ix
                + (s[2].x - s[1].x) * iy)
                / det_a,
            -((s[0].x * s[2].y - s[0].y * s[2].x) * i0 - (s[2].y - s[0].y) * ix
                + (s[2].x - s[0].x) * iy)
                / det_a,
            ((s[0].x * s[1].y - s[0].y * s[1].x) * i0 - (s[1].y - s[0].y) * ix
                + (s[1].x - s[0].x) * iy)
                / det_a,
        ]
    }

    // ------------------------------------------------------------------
    // NASA TN D-4023 per-edge kernels, constant densities
    // ------------------------------------------------------------------

    /// Per-edge geometric terms shared by the TN D-4023 formulae
    #[allow(clippy::type_complexity)]
    fn edge_terms(&self, c: &Vector3, i: usize) -> (Vector3, Vector3, Vector3, f64, f64) {
        let a = *c - self.s[i];
        let b = *c - self.s[(i + 1) % 3];
        let s = self.s[(i + 1) % 3] - self.s[i];
        let na = a.norm();
        let nb = b.norm();
        (a, b, s, na, nb)
    }

    /// Potential of a constant unit doublet density, scaled by 4π
    pub fn doublet_n4023_potential(
        &self,
        c: &Vector3,
        is_self: bool,
        core_radius: f64,
        use_rff: bool,
    ) -> f64 {
        if is_self {
            // internal Dirichlet limit
            return PI2;
        }

        let pjk = *c - self.cog;
        let pn = pjk.dot(&self.normal);
        let d = pjk.norm();

        if use_rff && d > RFF * self.max_size {
            return -pn * self.area / (d * d * d);
        }

        let mut phi = 0.0;
        for i in 0..3 {
            let (a, b, s, na, nb) = self.edge_terms(c, i);
            let sm = s.dot(&self.m);
            let sl = s.dot(&self.l);
            let am = a.dot(&self.m);
            let al = a.dot(&self.l);
            let a_l = am * sl - al * sm;
            let pa = pn * pn * sl + a_l * am;
            let pb = pa - a_l * sm;
            let h = a.cross(&s);

            let cjk = if s.norm() < LENGTH_PRECISION {
                0.0
            } else if h.norm_sq() / s.norm_sq() <= core_radius * core_radius
                && a.dot(&s) >= 0.0
                && b.dot(&s) <= 0.0
            {
                // the potential is undefined on the panel's edge
                0.0
            } else if pn.abs() < IN_PLANE_PRECISION {
                0.0
            } else {
                let rnum = sm * pn * (nb * pa - na * pb);
                let dnom = pa * pb + pn * pn * na * nb * sm * sm;
                rnum.atan2(dnom)
            };
            phi -= cjk;
        }
        phi
    }

    /// Velocity of a constant unit doublet density, global frame, scaled by 4π
    pub fn doublet_n4023_velocity(
        &self,
        c: &Vector3,
        core_radius: f64,
        use_rff: bool,
    ) -> Vector3 {
        let pjk = *c - self.cog;
        let pn = pjk.dot(&self.normal);
        let d = pjk.norm();

        if use_rff && d > RFF * self.max_size {
            let d2 = d * d;
            let d5 = d2 * d2 * d;
            let t1 = pjk * (3.0 * pn) - self.normal * d2;
            return t1 * (self.area / d5);
        }

        let mut v = Vector3::ZERO;
        for i in 0..3 {
            let (a, b, s, na, nb) = self.edge_terms(c, i);
            let h = a.cross(&s);

            if s.norm() < LENGTH_PRECISION || na < core_radius || nb < core_radius {
                continue;
            }
            if h.norm() <= core_radius && a.dot(&s) >= 0.0 && b.dot(&s) <= 0.0 {
                // on the edge, within the vortex core
                continue;
            }

            let hab = a.cross(&b);
            let gl = (na + nb) / na / nb / (na * nb + a.dot(&b));
            v += hab * gl;
        }
        v
    }

    /// Potential of a constant unit source density, scaled by 4π
    pub fn source_n4023_potential(&self, c: &Vector3, core_radius: f64) -> f64 {
        let pjk = *c - self.cog;
        let pn = pjk.dot(&self.normal);
        let d = pjk.norm();

        if d > RFF * self.max_size {
            return -self.area / d;
        }

        let mut phi = 0.0;
        for i in 0..3 {
            let (a, b, s, na, nb) = self.edge_terms(c, i);
            let sk = s.norm();
            let sm = s.dot(&self.m);
            let sl = s.dot(&self.l);
            let am = a.dot(&self.m);
            let al = a.dot(&self.l);
            let a_l = am * sl - al * sm;
            let pa = pn * pn * sl + a_l * am;
            let pb = pa - a_l * sm;
            let h = a.cross(&s);

            if sk < LENGTH_PRECISION {
                continue;
            }
            if (h.norm_sq() / s.norm_sq() <= core_radius * core_radius
                && a.dot(&s) >= 0.0
                && b.dot(&s) <= 0.0)
                || na < core_radius
                || nb < core_radius
            {
                continue;
            }

            let gl = if (na + nb - sk).abs() > 0.0 {
                1.0 / sk * ((na + nb + sk) / (na + nb - sk)).abs().ln()
            } else {
                0.0
            };

            let cjk = edge_arc(pn, na, nb, sm, pa, pb);
            phi += a_l * gl - pn * cjk;
        }
        -phi
    }

    /// Velocity of a constant unit source density, global frame, scaled by 4π
    pub fn source_n4023_velocity(
        &self,
        c: &Vector3,
        is_self: bool,
        core_radius: f64,
    ) -> Vector3 {
        let pjk = *c - self.cog;
        let pn = pjk.dot(&self.normal);
        let d = pjk.norm();

        if d > RFF * self.max_size {
            return pjk * (self.area / (d * d * d));
        }

        let mut vel = Vector3::ZERO;
        for i in 0..3 {
            let (a, b, s, na, nb) = self.edge_terms(c, i);
            let sk = s.norm();
            let sm = s.dot(&self.m);
            let sl = s.dot(&self.l);
            let am = a.dot(&self.m);
            let al = a.dot(&self.l);
            let a_l = am * sl - al * sm;
            let pa = pn * pn * sl + a_l * am;
            let pb = pa - a_l * sm;
            let h = a.cross(&s);

            if sk < LENGTH_PRECISION {
                continue;
            }
            if (h.norm_sq() / s.norm_sq() <= core_radius * core_radius
                && a.dot(&s) >= 0.0
                && b.dot(&s) <= 0.0)
                || na < core_radius
                || nb < core_radius
            {
                continue;
            }

            let gl = if (na + nb - sk).abs() > 0.0 {
                1.0 / sk * ((na + nb + sk) / (na + nb - sk)).abs().ln()
            } else {
                0.0
            };

            let cjk = edge_arc(pn, na, nb, sm, pa, pb);
            vel += self.normal * cjk + self.l * (sm * gl) - self.m * (sl * gl);
        }

        if pn.abs() < IN_PLANE_PRECISION {
            // in the panel's plane the normal component is discontinuous
            let tangential = vel - self.normal * vel.dot(&self.normal);
            vel = tangential;
        }
        if is_self {
            // exterior Neumann limit
            vel = self.normal * PI2;
        }
        vel
    }

    /// Velocity of the panel's bound vortex ring, scaled by 4π
    pub fn doublet_vortex_velocity(
        &self,
        c: &Vector3,
        core_radius: f64,
        use_rff: bool,
    ) -> Vector3 {
        let pjk = *c - self.cog;
        let pn = pjk.dot(&self.normal);
        let d = pjk.norm();

        if use_rff && d > RFF * self.max_size {
            let d2 = d * d;
            let d5 = d2 * d2 * d;
            let t1 = pjk * (3.0 * pn) - self.normal * d2;
            return t1 * (self.area / d5);
        }

        let mut v = Vector3::ZERO;
        for i in 0..3 {
            v += vortex_segment_velocity(&self.s[i], &self.s[(i + 1) % 3], c, core_radius);
        }
        v
    }

    /// Kutta-Joukowski force per unit circulation and density of the
    /// panel's bound vortex ring
    pub fn vortex_force(&self, wind: &Vector3) -> Vector3 {
        let mut force = Vector3::ZERO;
        for i in 0..3 {
            let s = self.s[(i + 1) % 3] - self.s[i];
            force += wind.cross(&s);
        }
        force
    }

    // ------------------------------------------------------------------
    // trailing-edge topology
    // ------------------------------------------------------------------

    /// Vertex slot of the left (inboard for the right wing) trailing node
    pub fn left_trailing_vertex(&self) -> usize {
        if self.is_wake() {
            if self.left_wing {
                2
            } else {
                0
            }
        } else {
            match self.pos {
                SurfacePosition::Top => 1,
                SurfacePosition::Bottom => 2,
                _ => 1,
            }
        }
    }

    /// Vertex slot of the right trailing node
    pub fn right_trailing_vertex(&self) -> usize {
        if self.is_wake() {
            if self.left_wing {
                0
            } else {
                1
            }
        } else {
            match self.pos {
                SurfacePosition::Top => 2,
                SurfacePosition::Bottom => 1,
                _ => 2,
            }
        }
    }

    // ------------------------------------------------------------------
    // quality metrics
    // ------------------------------------------------------------------

    /// Circumradius over shortest edge; large values flag skinny triangles
    pub fn quality_factor(&self) -> f64 {
        let a = (self.s[2] - self.s[1]).norm();
        let b = (self.s[0] - self.s[2]).norm();
        let c = (self.s[1] - self.s[0]).norm();
        let shortest = a.min(b).min(c);
        let r = a * b * c / ((a + b + c) * (b + c - a) * (c + a - b) * (a + b - c)).sqrt();
        r / shortest
    }

    /// Smallest internal angle in degrees
    pub fn min_angle(&self) -> f64 {
        self.angles[0].min(self.angles[1]).min(self.angles[2])
    }

    /// Rotate the panel about an axis through `center` by `angle_deg` degrees
    pub fn rotate(&mut self, center: &Vector3, axis: &Vector3, angle_deg: f64) {
        for k in 0..3 {
            let r = self.s[k] - *center;
            self.s[k] = *center + r.rotated(axis, angle_deg);
        }
        self.set_frame();
    }
}

/// Arc term of the TN D-4023 edge sum, with the in-plane sign cases
fn edge_arc(pn: f64, na: f64, nb: f64, sm: f64, pa: f64, pb: f64) -> f64 {
    if pn.abs() < IN_PLANE_PRECISION {
        let dnom = pa * pb + pn * pn * na * nb * sm * sm;
        if dnom < 0.0 {
            if pn > 0.0 {
                PI
            } else {
                -PI
            }
        } else if dnom == 0.0 {
            if pn > 0.0 {
                PI / 2.0
            } else {
                -PI / 2.0
            }
        } else {
            0.0
        }
    } else {
        let rnum = sm * pn * (nb * pa - na * pb);
        let dnom = pa * pb + pn * pn * na * nb * sm * sm;
        rnum.atan2(dnom)
    }
}

/// Velocity induced at `c` by a straight vortex segment of unit circulation,
/// scaled by 4π, with a solid-core cutoff
pub fn vortex_segment_velocity(
    p1: &Vector3,
    p2: &Vector3,
    c: &Vector3,
    core_radius: f64,
) -> Vector3 {
    let a = *c - *p1;
    let b = *c - *p2;
    let s = *p2 - *p1;
    let na = a.norm();
    let nb = b.norm();

    if s.norm() < LENGTH_PRECISION || na < core_radius || nb < core_radius {
        return Vector3::ZERO;
    }
    let h = a.cross(&s);
    if h.norm_sq() / s.norm_sq() <= core_radius * core_radius
        && a.dot(&s) >= 0.0
        && b.dot(&s) <= 0.0
    {
        return Vector3::ZERO;
    }

    let hab = a.cross(&b);
    let denom = na * nb * (na * nb + a.dot(&b));
    if denom.abs() < 1.0e-30 {
        return Vector3::ZERO;
    }
    hab * ((na + nb) / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::PI4;
    use approx::assert_relative_eq;

    fn unit_panel() -> Panel {
        Panel::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            [0, 1, 2],
            SurfacePosition::Body,
        )
    }

    #[test]
    fn frame_is_orthonormal() {
        let p = unit_panel();
        assert!(!p.null_triangle);
        assert_relative_eq!(p.normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.l.dot(&p.m), 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.l.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.area, 0.5, epsilon = 1e-12);
        assert!(p.signed_area > 0.0);
    }

    #[test]
    fn basis_functions_partition_unity() {
        let p = unit_panel();
        let b = p.barycentric(0.1, 0.2);
        assert_relative_eq!(b[0] + b[1] + b[2], 1.0, epsilon = 1e-12);
        // vertex interpolation
        for k in 0..3 {
            for j in 0..3 {
                let expected = if j == k { 1.0 } else { 0.0 };
                assert_relative_eq!(
                    p.basis(p.sl[j].x, p.sl[j].y, k),
                    expected,
                    epsilon = 1e-10
                );
            }
        }
    }

    #[test]
    fn degenerate_panel_is_null() {
        let p = Panel::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            [0, 1, 2],
            SurfacePosition::Body,
        );
        assert!(p.null_triangle);
        assert_eq!(p.area, 0.0);
    }

    #[test]
    fn self_source_velocity_is_outward_jump() {
        let p = unit_panel();
        let mut ctx = QuadratureContext::new();
        let v = p.source_velocity(&p.cog, true, QuadratureKernel::Carley, &mut ctx);
        assert_relative_eq!(v.z, PI2, epsilon = 1e-12);
    }

    #[test]
    fn self_doublet_potential_is_solid_angle() {
        let p = unit_panel();
        let mut ctx = QuadratureContext::new();
        let phi = p.doublet_basis_potential(&p.cog, true, QuadratureKernel::Carley, true, &mut ctx);
        // the basis functions at the centroid are all 1/3
        assert_relative_eq!(phi[0] + phi[1] + phi[2], PI2, epsilon = 1e-9);
        assert_relative_eq!(phi[0], PI2 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(
            p.doublet_n4023_potential(&p.cog, true, 1e-6, true),
            PI2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn source_potential_kernels_agree_off_plane() {
        let p = unit_panel();
        let mut ctx = QuadratureContext::new();
        let pt = Vector3::new(0.4, 0.1, 0.9);
        let carley = p.source_potential(&pt, QuadratureKernel::Carley, &mut ctx);
        let nf = p.source_potential(&pt, QuadratureKernel::NintcheuFata, &mut ctx);
        let n4023 = p.source_n4023_potential(&pt, 1e-6);
        assert_relative_eq!(carley, nf, epsilon = 1e-8);
        assert_relative_eq!(carley, n4023, epsilon = 1e-6);
    }

    #[test]
    fn constant_doublet_matches_summed_basis() {
        let p = unit_panel();
        let mut ctx = QuadratureContext::new();
        let pt = Vector3::new(0.2, 0.3, 0.7);
        let basis = p.doublet_basis_potential(&pt, false, QuadratureKernel::Carley, false, &mut ctx);
        let constant = p.doublet_n4023_potential(&pt, false, 1e-6, false);
        assert_relative_eq!(basis[0] + basis[1] + basis[2], constant, epsilon = 1e-6);
    }

    #[test]
    fn doublet_velocity_matches_ring_vortex() {
        let p = unit_panel();
        let mut ctx = QuadratureContext::new();
        let pt = Vector3::new(0.5, -0.4, 0.6);
        let vb = p.doublet_basis_velocity(&pt, QuadratureKernel::Carley, false, &mut ctx);
        let summed = vb[0] + vb[1] + vb[2];
        let ring = p.doublet_vortex_velocity(&pt, 1e-6, false);
        assert_relative_eq!(summed.x, ring.x, epsilon = 1e-6);
        assert_relative_eq!(summed.y, ring.y, epsilon = 1e-6);
        assert_relative_eq!(summed.z, ring.z, epsilon = 1e-6);
    }

    #[test]
    fn far_field_source_decays_as_point_source() {
        let p = unit_panel();
        let pt = Vector3::new(100.0, 0.0, 0.0);
        let phi = p.source_n4023_potential(&pt, 1e-6);
        let r = (pt - p.cog).norm();
        assert_relative_eq!(phi, -p.area / r, epsilon = 1e-10);
        // the physical potential carries the 1/4π
        assert_relative_eq!(phi / PI4, -p.area / PI4 / r, epsilon = 1e-10);
    }

    #[test]
    fn vortex_segment_core_cutoff() {
        let p1 = Vector3::new(0.0, 0.0, 0.0);
        let p2 = Vector3::new(1.0, 0.0, 0.0);
        let on_segment = Vector3::new(0.5, 1e-8, 0.0);
        let v = vortex_segment_velocity(&p1, &p2, &on_segment, 1e-4);
        assert_eq!(v, Vector3::ZERO);

        // mid-point at unit distance: |V| = 2 sin(45°)·2/1... compare with
        // the analytic value Γ/(4π h)·(cosθ1 - cosθ2) scaled by 4π
        let pt = Vector3::new(0.5, 1.0, 0.0);
        let v = vortex_segment_velocity(&p1, &p2, &pt, 1e-4);
        let expected = (2.0 / (5.0f64).sqrt()) / 1.0; // (cosθ1 - cosθ2)/h
        assert_relative_eq!(v.norm(), expected, epsilon = 1e-10);
    }
}
