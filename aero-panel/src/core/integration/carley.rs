//! Closed-form line-integral quadrature over a flat triangle
//!
//! Evaluates the moment integrals ∫ x^p y^q / R^k dS of a flat triangle for
//! the orders needed by constant-source and linear-doublet panels, following
//! M. Carley, "Potential integrals on triangles" (2013). The triangle is
//! split by the projection of the field point into sub-triangles; each
//! sub-triangle reduces the surface integral to a recursion over tabulated
//! line integrals in the polar angle.
//!
//! The tables come in two flavours: an off-plane column used when the field
//! point has a nonzero height above the triangle plane, and an in-plane
//! column for field points lying in the plane (including the self-influence
//! case). Heights below [`IN_PLANE_PRECISION`] are forced to the in-plane
//! column.

use crate::core::constants::{
    IN_PLANE_PRECISION, INTEGRAL_PRECISION, SIDE_LENGTH_PRECISION, VERTEX_ANGLE_PRECISION,
};
use crate::core::types::{QuadratureContext, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};

/// Accumulated moment integrals over one or more sub-triangles
///
/// First order is `[1/R, x/R, y/R]`, third and fifth orders are
/// `[1/Rᵏ, x/Rᵏ, y/Rᵏ, x²/Rᵏ, xy/Rᵏ, y²/Rᵏ]`, all expressed in the parent
/// panel's local frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriangleIntegrals {
    /// 1/R moments
    pub i1: [f64; 3],
    /// 1/R³ moments
    pub i3: [f64; 6],
    /// 1/R⁵ moments
    pub i5: [f64; 6],
}

/// One sub-triangle of the polar decomposition
///
/// The first vertex is the projection of the field point onto the parent
/// panel's plane; the other two are panel vertices. All coordinates are in
/// the parent panel's local frame.
#[derive(Debug, Clone)]
pub struct CarleyTriangle {
    s1: Vector3,
    z: f64,
    area: f64,
    r1: f64,
    theta_max: f64,
    a: f64,
    phi: f64,
    null_triangle: bool,
}

impl CarleyTriangle {
    /// Build a sub-triangle from the field point and two panel vertices
    ///
    /// `field_pt` carries the height of the field point above the panel
    /// plane in its z component; `v1` and `v2` lie in the plane. Degenerate
    /// triangles (short side or flat vertex angle) are flagged null and
    /// counted in `ctx`.
    pub fn new(
        field_pt: &Vector3,
        v1: &Vector3,
        v2: &Vector3,
        normal: &Vector3,
        ctx: &mut QuadratureContext,
    ) -> Self {
        let mut z = field_pt.z;
        if z.abs() < 1.0e-6 {
            z = 0.0;
        }
        let s0 = Vector3::new(field_pt.x, field_pt.y, 0.0);

        let s01 = *v1 - s0;
        let s02 = *v2 - s0;
        let s12 = *v2 - *v1;

        let cross = s01.cross(&s02);
        let area = cross.norm() / 2.0;

        let r1 = s01.norm();
        let r2 = s02.norm();

        let mut tri = CarleyTriangle {
            s1: *v1,
            z,
            area,
            r1,
            theta_max: 0.0,
            a: 0.0,
            phi: 0.0,
            null_triangle: false,
        };

        if r1 < SIDE_LENGTH_PRECISION || r2 < SIDE_LENGTH_PRECISION || s12.norm() < SIDE_LENGTH_PRECISION
        {
            ctx.degenerate_triangles += 1;
            tri.null_triangle = true;
            tri.area = 0.0;
            return tri;
        }

        // local frame: x along the first side, z along the panel normal
        let m = s01.normalized();
        let l = normal.cross(&m);

        // polar angle of the second panel vertex in the local frame
        let theta_max = (s02.dot(&l)).atan2(s02.dot(&m));
        if theta_max.abs() < VERTEX_ANGLE_PRECISION
            || (theta_max - PI).abs() < VERTEX_ANGLE_PRECISION
            || (theta_max + PI).abs() < VERTEX_ANGLE_PRECISION
        {
            ctx.degenerate_triangles += 1;
            tri.null_triangle = true;
            tri.area = 0.0;
            return tri;
        }

        tri.theta_max = theta_max;
        tri.a = (r2 * theta_max.cos() - r1) / r2 / theta_max.sin();
        // angle offset of the change of variables, eq. 12
        tri.phi = tri.a.atan();
        tri
    }

    /// True if the triangle was too degenerate to integrate over
    pub fn is_null(&self) -> bool {
        self.null_triangle
    }

    /// Signed-free area of the sub-triangle
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Accumulate the moment integrals at `pt` into the output arrays
    ///
    /// `in_plane` selects the in-plane table column; it is forced on when
    /// the stored height is below the in-plane threshold. The second-moment
    /// entries of `i3`/`i5` and the `i5` array as a whole are only filled
    /// when `gradients` is set.
    pub fn accumulate(
        &self,
        pt: &Vector3,
        in_plane: bool,
        gradients: bool,
        i1: Option<&mut [f64; 3]>,
        i3: Option<&mut [f64; 6]>,
        i5: Option<&mut [f64; 6]>,
    ) {
        if self.null_triangle {
            return;
        }

        let in_plane = in_plane || self.z.abs() < IN_PLANE_PRECISION;

        let psi = (self.s1.y - pt.y).atan2(self.s1.x - pt.x);
        let dzeta = psi - self.phi;
        let (sindz, cosdz) = dzeta.sin_cos();
        let x0 = pt.x;
        let y0 = pt.y;

        let upper = ThetaState::new(self.theta_max + self.phi, self.z, self.r1, self.a);
        let lower = ThetaState::new(self.phi, self.z, self.r1, self.a);
        let line = |i: usize| upper.table1(i, in_plane) - lower.table1(i, in_plane);

        if let Some(i1) = i1 {
            let mc: [f64; 3] = [line(0), line(1), line(2)];
            i1[0] += mc[0];
            i1[1] += x0 * mc[0] + cosdz * mc[1] - sindz * mc[2];
            i1[2] += y0 * mc[0] + sindz * mc[1] + cosdz * mc[2];
        }

        if let Some(i3) = i3 {
            let mc: [f64; 3] = [line(3), line(4), line(5)];
            i3[0] += mc[0];
            i3[1] += x0 * mc[0] + cosdz * mc[1] - sindz * mc[2];
            i3[2] += y0 * mc[0] + sindz * mc[1] + cosdz * mc[2];

            if gradients {
                let m2: [f64; 3] = [line(9), line(10), line(11)];
                let (mx, mxy, my) = second_moments(&mc, &m2, x0, y0, sindz, cosdz);
                i3[3] += mx;
                i3[4] += mxy;
                i3[5] += my;
            }
        }

        if gradients {
            if let Some(i5) = i5 {
                let mc: [f64; 3] = [line(6), line(7), line(8)];
                i5[0] += mc[0];
                i5[1] += x0 * mc[0] + cosdz * mc[1] - sindz * mc[2];
                i5[2] += y0 * mc[0] + sindz * mc[1] + cosdz * mc[2];

                let m2: [f64; 3] = [line(12), line(13), line(14)];
                let (mx, mxy, my) = second_moments(&mc, &m2, x0, y0, sindz, cosdz);
                i5[3] += mx;
                i5[4] += mxy;
                i5[5] += my;
            }
        }
    }
}

/// Rotate the second-moment line integrals back into the panel frame
fn second_moments(
    mc: &[f64; 3],
    m2: &[f64; 3],
    x0: f64,
    y0: f64,
    sindz: f64,
    cosdz: f64,
) -> (f64, f64, f64) {
    let (c, s) = (cosdz, sindz);
    let xx = x0 * x0 * mc[0] + c * c * m2[0] + s * s * m2[2] + 2.0 * x0 * c * mc[1]
        - 2.0 * x0 * s * mc[2]
        - 2.0 * s * c * m2[1];
    let xy = x0 * y0 * mc[0]
        + (x0 * s + y0 * c) * mc[1]
        + (x0 * c - y0 * s) * mc[2]
        + s * c * m2[0]
        + (c * c - s * s) * m2[1]
        - s * c * m2[2];
    let yy = y0 * y0 * mc[0] + s * s * m2[0] + c * c * m2[2] + 2.0 * y0 * s * mc[1]
        + 2.0 * y0 * c * mc[2]
        + 2.0 * s * c * m2[1];
    (xx, xy, yy)
}

/// Trigonometric powers and the height-dependent quantities of eq. 12-14,
/// frozen at one value of the polar angle
struct ThetaState {
    theta: f64,
    sin_t: f64,
    sin_t2: f64,
    sin_t3: f64,
    cos_t: f64,
    cos_t2: f64,
    cos_t3: f64,
    fz: f64,
    z2: f64,
    beta: f64,
    beta2: f64,
    beta3: f64,
    alfa: f64,
    alfa2: f64,
    alfa3: f64,
    alfa4: f64,
    alfa5: f64,
    alfap: f64,
    alfap2: f64,
    delta: f64,
}

impl ThetaState {
    fn new(theta: f64, z: f64, r1: f64, a: f64) -> Self {
        let sin_t = theta.sin();
        let sin_t2 = sin_t * sin_t;
        let sin_t3 = sin_t2 * sin_t;
        let mut cos_t = theta.cos();
        let (cos_t2, cos_t3);
        if cos_t.abs() < INTEGRAL_PRECISION {
            cos_t = 0.0;
            cos_t2 = 0.0;
            cos_t3 = 0.0;
        } else {
            cos_t2 = cos_t * cos_t;
            cos_t3 = cos_t2 * cos_t;
        }

        let fz = z.abs();
        let z2 = z * z;

        let beta2 = (r1 * r1 + z * z * (1.0 + a * a)) / (1.0 + a * a);
        let beta = beta2.sqrt();
        let beta3 = beta * beta2;

        // rounding can push |alfa| past 1
        let alfa = (z / beta).clamp(-1.0, 1.0);
        let alfa2 = alfa * alfa;
        let alfa3 = alfa * alfa2;
        let alfa4 = alfa2 * alfa2;
        let alfa5 = alfa2 * alfa3;

        let alfap = (1.0 - alfa2).sqrt();
        let alfap2 = alfap * alfap;

        let delta2 = (1.0 - alfa2 * sin_t2).max(0.0);
        let delta = delta2.sqrt();

        ThetaState {
            theta,
            sin_t,
            sin_t2,
            sin_t3,
            cos_t,
            cos_t2,
            cos_t3,
            fz,
            z2,
            beta,
            beta2,
            beta3,
            alfa,
            alfa2,
            alfa3,
            alfa4,
            alfa5,
            alfap,
            alfap2,
            delta,
        }
    }

    /// Table 1 antiderivatives, evaluated from 0 to the frozen angle
    ///
    /// Line indices 0-2 are the 1/R family, 3-5 the 1/R³ family, 6-8 the
    /// 1/R⁵ family, and 9-14 the second moments over R³ and R⁵. The
    /// in-plane flag selects the limit column for z → 0.
    fn table1(&self, line: usize, in_plane: bool) -> f64 {
        let s = self;
        if in_plane {
            match line {
                0 => s.beta * s.jmn(0, -1),
                1 => s.beta2 / 2.0 * s.jmn(0, -1),
                2 => s.beta2 / 2.0 * s.jmn(1, -2),
                3 => {
                    if s.beta.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -1.0 / s.beta * s.jmn(0, 1)
                }
                4 => {
                    if s.cos_t.abs() < INTEGRAL_PRECISION || s.beta.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -s.sin_t * (s.cos_t / s.beta).ln() - s.jmn(2, -1)
                }
                5 => {
                    if s.cos_t.abs() < INTEGRAL_PRECISION || s.beta.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    s.cos_t * (s.cos_t / s.beta).ln() + s.jmn(1, 0)
                }
                6 => {
                    if s.beta2.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -1.0 / 3.0 / s.beta2 / s.beta * s.jmn(0, 3)
                }
                7 => {
                    if s.beta2.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -1.0 / 2.0 / s.beta2 * s.jmn(0, 3)
                }
                8 => {
                    if s.beta2.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -1.0 / 2.0 / s.beta2 * s.jmn(1, 2)
                }
                9 => s.beta * s.jmn(0, 1),
                10 => s.beta * s.jmn(1, 0),
                11 => s.beta * s.jmn(2, -1),
                12 => {
                    if s.beta.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -1.0 / s.beta * s.jmn(0, 3)
                }
                13 => {
                    if s.beta.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -1.0 / s.beta * s.jmn(1, 2)
                }
                14 => {
                    if s.beta.abs() < INTEGRAL_PRECISION {
                        return 0.0;
                    }
                    -1.0 / s.beta * s.jmn(2, 1)
                }
                _ => 0.0,
            }
        } else {
            let log_ratio = || {
                if (s.delta + s.alfap).abs() < INTEGRAL_PRECISION
                    || (s.delta - s.alfap).abs() < INTEGRAL_PRECISION
                {
                    None
                } else {
                    Some(((s.delta + s.alfap) / (s.delta - s.alfap)).ln())
                }
            };
            match line {
                0 => s.beta * s.ipmn(1, 0, -1) - s.fz * s.jmn(0, 0),
                1 => match log_ratio() {
                    None => 0.0,
                    Some(lr) => {
                        s.beta2 * s.alfap / 2.0 * s.ipmn(1, 0, -1)
                            + s.z2 * s.alfap / 2.0 * s.ipmn(-1, 2, -1)
                            - s.z2 / 4.0 * s.sin_t * lr
                    }
                },
                2 => match log_ratio() {
                    None => 0.0,
                    Some(lr) => {
                        s.beta2 * s.alfap / 2.0 * s.ipmn(1, 1, -2)
                            - s.z2 * s.alfap / 2.0 * s.ipmn(-1, 1, 0)
                            + s.z2 / 4.0 * s.cos_t * lr
                    }
                },
                3 => -1.0 / s.beta * s.ipmn(-1, 0, 1) + 1.0 / s.fz * s.jmn(0, 0),
                4 => match log_ratio() {
                    None => 0.0,
                    Some(lr) => {
                        -s.alfap * s.ipmn(-1, 0, 1) - s.alfap * s.ipmn(-1, 2, -1)
                            + s.sin_t / 2.0 * lr
                    }
                },
                5 => match log_ratio() {
                    None => 0.0,
                    Some(lr) => -s.cos_t / 2.0 * lr,
                },
                6 => {
                    -1.0 / 3.0
                        * (1.0 / s.beta3 * s.ipmn(-3, 0, 3) - 1.0 / s.fz / s.fz / s.fz * s.jmn(0, 0))
                }
                7 => s.alfap * s.alfap * s.alfap / 3.0 / s.z2 * s.ipmn(-3, 0, 1),
                8 => s.alfap * s.alfap * s.alfap / 3.0 / s.z2 * s.ipmn(-3, 1, 0),
                9 => {
                    s.beta * s.ipmn(1, 0, 1) + s.z2 / s.beta * s.ipmn(-1, 0, 3)
                        - 2.0 * s.fz * s.jmn(0, 2)
                }
                10 => {
                    s.beta * s.ipmn(1, 1, 0) + s.z2 / s.beta * s.ipmn(-1, 1, 2)
                        - 2.0 * s.fz * s.jmn(1, 1)
                }
                11 => {
                    s.beta * s.ipmn(1, 2, -1) + s.z2 / s.beta * s.ipmn(-1, 2, 1)
                        - 2.0 * s.fz * s.jmn(2, 0)
                }
                12 => {
                    -1.0 / s.beta * s.ipmn(-1, 0, 3)
                        + s.z2 / 3.0 / s.beta3 * s.ipmn(-3, 0, 5)
                        + 2.0 / 3.0 / s.fz * s.jmn(0, 2)
                }
                13 => {
                    -1.0 / s.beta * s.ipmn(-1, 1, 2)
                        + s.z2 / 3.0 / s.beta3 * s.ipmn(-3, 1, 4)
                        + 2.0 / 3.0 / s.fz * s.jmn(1, 1)
                }
                14 => {
                    -1.0 / s.beta * s.ipmn(-1, 2, 1)
                        + s.z2 / 3.0 / s.beta3 * s.ipmn(-3, 2, 3)
                        + 2.0 / 3.0 / s.fz * s.jmn(2, 0)
                }
                _ => 0.0,
            }
        }
    }

    /// Table 3: ∫ sinᵐθ cosⁿθ / δᵖ dθ with δ = √(1 - α² sin²θ)
    fn ipmn(&self, p: i32, m: i32, n: i32) -> f64 {
        let s = self;
        if p == -3 {
            if m == 0 && n == 1 {
                if s.delta.abs() < INTEGRAL_PRECISION {
                    return 0.0;
                }
                s.sin_t / s.delta
            } else if m == 1 && n == 0 {
                if s.alfap2.abs() < INTEGRAL_PRECISION || s.delta.abs() < INTEGRAL_PRECISION {
                    return 0.0;
                }
                -1.0 / s.alfap2 * s.cos_t / s.delta
            } else if m == 0 && n == 3 {
                if s.delta.abs() < INTEGRAL_PRECISION || (s.alfa * s.sin_t).abs() > 1.0 {
                    return 0.0;
                }
                -s.alfap2 / s.alfa2 * s.sin_t / s.delta
                    + 1.0 / s.alfa3 * (s.alfa * s.sin_t).asin()
            } else if m == 2 && n == 3 {
                if (2.0 * s.alfa5 * s.delta).abs() < INTEGRAL_PRECISION {
                    return 0.0;
                }
                -((2.0 * s.alfa2 - 3.0) * s.delta * (s.alfa * s.sin_t).asin()
                    - s.alfa2 * s.alfa * s.sin_t3
                    + (3.0 - 2.0 * s.alfa2) * s.alfa * s.sin_t)
                    / (2.0 * s.alfa5 * s.delta)
            } else if m == 1 && n == 4 {
                if (1.0 - s.alfa2).abs() < INTEGRAL_PRECISION && s.cos_t3.abs() < INTEGRAL_PRECISION
                {
                    return 0.0;
                }
                let root = (s.alfa2 * s.cos_t2 - s.alfa2 + 1.0).sqrt();
                3.0 * (1.0 - s.alfa2) * (s.alfa * root + s.alfa2 * s.cos_t).abs().ln()
                    / (2.0 * s.alfa4 * s.alfa)
                    - s.cos_t3 / (2.0 * s.alfa2 * root)
                    - 3.0 * (1.0 - s.alfa2) * s.cos_t / (2.0 * s.alfa4 * root)
            } else if m == 0 && n == 5 {
                if (2.0 * s.alfa5 * s.delta).abs() < INTEGRAL_PRECISION {
                    return 0.0;
                }
                ((4.0 * s.alfa2 - 3.0) * s.delta * (s.alfa * s.sin_t).asin() - s.alfa3 * s.sin_t3
                    + (2.0 * s.alfa4 - 4.0 * s.alfa2 + 3.0) * s.alfa * s.sin_t)
                    / (2.0 * s.alfa5 * s.delta)
            } else {
                // reduction in p, eq. 39
                let mut i = 1.0 / s.alfa2 / s.delta
                    * (s.sin_t.powi(m - 1) + s.cos_t.powi(n - 1));
                i -= f64::from(m - 1) / s.alfa2 * s.ipmn(-1, m - 2, n);
                i += f64::from(n - 1) / s.alfa2 * s.ipmn(-1, m, n - 2);
                i
            }
        } else if p == -1 {
            if m == 0 && n == 1 {
                if (s.alfa * s.sin_t).abs() > 1.0 {
                    return 0.0;
                }
                1.0 / s.alfa * (s.alfa * s.sin_t).asin()
            } else if m == 0 && n == 3 {
                if (s.alfa * s.sin_t).abs() > 1.0 {
                    return 0.0;
                }
                s.delta * s.sin_t / 2.0 / s.alfa2
                    + (2.0 * s.alfa2 - 1.0) / 2.0 / s.alfa3 * (s.alfa * s.sin_t).asin()
            } else if m == 1 && n == 0 {
                if s.alfa * s.cos_t + s.delta < INTEGRAL_PRECISION {
                    return 0.0;
                }
                -1.0 / s.alfa * (s.alfa * s.cos_t + s.delta).ln()
            } else if m == 1 && n == 2 {
                if s.cos_t2.abs() < INTEGRAL_PRECISION {
                    return 0.0;
                }
                let w = (1.0 - s.alfa2) * s.sin_t2 / s.cos_t2 + 1.0;
                if (w.sqrt() + s.alfa).abs() < INTEGRAL_PRECISION
                    || (w.sqrt() - s.alfa).abs() < INTEGRAL_PRECISION
                    || 1.0 - (s.alfa2 - 1.0) * s.sin_t2 / s.cos_t2 < 0.0
                {
                    return 0.0;
                }
                -((s.alfa2 - 1.0) * (w.sqrt() + s.alfa).abs().ln()
                    + (1.0 - s.alfa2) * (w.sqrt() - s.alfa).abs().ln()
                    + (1.0 - (s.alfa2 - 1.0) * s.sin_t2 / s.cos_t2).sqrt()
                        * (s.alfa * (s.cos_t2 - s.sin_t2) + s.alfa))
                    / (4.0 * s.alfa3)
            } else if m == 2 && n == 1 {
                if (s.alfa * s.sin_t).abs() > 1.0 {
                    return 0.0;
                }
                ((s.alfa * s.sin_t).asin() - s.alfa * s.sin_t * s.delta) / (2.0 * s.alfa2 * s.alfa)
            } else if m == 2 && n == -1 {
                if (s.delta + s.alfap * s.sin_t).abs() < INTEGRAL_PRECISION
                    || (s.delta - s.alfap * s.sin_t).abs() < INTEGRAL_PRECISION
                    || s.alfap.abs() < INTEGRAL_PRECISION
                    || s.alfa.abs() < INTEGRAL_PRECISION
                    || (s.alfa * s.sin_t).abs() > 1.0
                {
                    return 0.0;
                }
                1.0 / 2.0 / s.alfap
                    * ((s.delta + s.alfap * s.sin_t) / (s.delta - s.alfap * s.sin_t)).ln()
                    - 1.0 / s.alfa * (s.alfa * s.sin_t).asin()
            } else {
                0.0
            }
        } else if p == 1 {
            if m == 0 && n == -1 {
                if (s.delta + s.alfap * s.sin_t).abs() < INTEGRAL_PRECISION
                    || (s.delta - s.alfap * s.sin_t).abs() < INTEGRAL_PRECISION
                {
                    return 0.0;
                }
                s.alfap / 2.0
                    * ((s.delta + s.alfap * s.sin_t) / (s.delta - s.alfap * s.sin_t)).ln()
                    + s.alfa * (s.alfa * s.sin_t).asin()
            } else if m == 0 && n == 1 {
                if s.alfa * s.sin_t > 1.0 {
                    s.delta * s.sin_t / 2.0 + 1.0 / 2.0 / s.alfa * FRAC_PI_2
                } else if s.alfa * s.sin_t < -1.0 {
                    s.delta * s.sin_t / 2.0 - 1.0 / 2.0 / s.alfa * FRAC_PI_2
                } else {
                    s.delta * s.sin_t / 2.0 + 1.0 / 2.0 / s.alfa * (s.alfa * s.sin_t).asin()
                }
            } else if m == 2 && n == -1 {
                if (s.delta + s.alfap * s.sin_t).abs() < INTEGRAL_PRECISION
                    || (s.delta - s.alfap * s.sin_t).abs() < INTEGRAL_PRECISION
                    || s.alfa.abs() < INTEGRAL_PRECISION
                {
                    return 0.0;
                }
                -s.delta * s.sin_t / 2.0
                    + (2.0 * s.alfa2 - 1.0) / 2.0 / s.alfa * (s.alfa * s.sin_t).asin()
                    + s.alfap / 2.0
                        * ((s.delta + s.alfap * s.sin_t) / (s.delta - s.alfap * s.sin_t)).ln()
            } else if m == 1 && n == -2 {
                if s.cos_t.abs() < INTEGRAL_PRECISION
                    || s.alfa * s.cos_t + s.delta < INTEGRAL_PRECISION
                {
                    return 0.0;
                }
                s.delta / s.cos_t - s.alfa * (s.alfa * s.cos_t + s.delta).ln()
            } else if m == 1 && n == 0 {
                if s.alfa.abs() < INTEGRAL_PRECISION
                    || s.alfa * s.cos_t + s.delta < INTEGRAL_PRECISION
                {
                    return 0.0;
                }
                -s.delta * s.cos_t / 2.0
                    - 1.0 / 2.0 * s.alfap2 / s.alfa * (s.alfa * s.cos_t + s.delta).ln()
            } else {
                0.0
            }
        } else {
            0.0
        }
    }

    /// Table 4: ∫ sinᵐθ cosⁿθ dθ
    fn jmn(&self, m: i32, n: i32) -> f64 {
        let s = self;
        match (m, n) {
            (0, 0) => s.theta,
            (0, -1) => {
                if s.sin_t.abs() > 1.0 - INTEGRAL_PRECISION {
                    return 0.0;
                }
                1.0 / 2.0 * ((1.0 + s.sin_t).ln() - (1.0 - s.sin_t).ln())
            }
            (0, 1) => s.sin_t,
            (1, 0) => -s.cos_t,
            (1, 1) => -(2.0 * s.theta).cos() / 4.0,
            (0, 3) => s.sin_t - s.sin_t3 / 3.0,
            (1, -2) => {
                if s.cos_t.abs() < INTEGRAL_PRECISION {
                    return 0.0;
                }
                1.0 / s.cos_t
            }
            (1, 2) => -s.cos_t3 / 3.0,
            (2, 0) => s.theta / 2.0 - (2.0 * s.theta).sin() / 4.0,
            (2, 1) => s.sin_t3 / 3.0,
            (0, 2) => s.theta / 2.0 + (2.0 * s.theta).sin() / 4.0,
            (2, -1) => {
                if (1.0 + s.sin_t).abs() < INTEGRAL_PRECISION
                    || (1.0 - s.sin_t).abs() < INTEGRAL_PRECISION
                {
                    return 0.0;
                }
                -s.sin_t + 1.0 / 2.0 * ((1.0 + s.sin_t).ln() - (1.0 - s.sin_t).ln())
            }
            _ => 0.0,
        }
    }
}
