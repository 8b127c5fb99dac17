//! Explicit per-edge panel integrals
//!
//! Implements the closed-form expressions of S. Nintcheu Fata, "Explicit
//! expressions for 3D boundary integrals in potential theory", Int. J.
//! Numer. Meth. Engng 2009; 78:32-47. Each moment integral reduces to a sum
//! of three per-edge terms plus a solid-angle contribution.
//!
//! Only valid for off-plane field points: the expressions are singular for
//! z → 0, so in-plane evaluations fall back to the line-integral kernel.
//! Field points whose projection lands on a vertex or an edge are nudged
//! slightly outside the triangle to avoid atan2 quadrant flips; the
//! off-plane integrals are smooth in space so the perturbation is harmless.

use crate::core::constants::{IN_PLANE_PRECISION, PANEL_PREC};
use crate::core::types::{Vector2, Vector3};
use std::f64::consts::PI;

/// Position of a projected field point relative to the triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPosition {
    /// Strictly inside the triangle
    Inside,
    /// Strictly outside the triangle
    Outside,
    /// Coincident with the vertex of the given index
    OnVertex(usize),
    /// On the edge of the given index, away from the vertices
    OnEdge(usize),
}

/// Precomputed triangle data for the per-edge integral evaluation
///
/// Vertices are given in the parent panel's local frame, so they lie in the
/// z = 0 plane; the field point carries its height in its z component.
#[derive(Debug, Clone)]
pub struct NintcheuPanel {
    sl: [Vector3; 3],
    cog: Vector3,
    /// barycentric matrix, row-major: g_k = gmat[3k] + gmat[3k+1] x + gmat[3k+2] y
    gmat: [f64; 9],
}

impl NintcheuPanel {
    /// Build from the panel's local vertices and centroid
    pub fn new(sl: [Vector3; 3], cog: Vector3) -> Self {
        let (x0, y0) = (sl[0].x, sl[0].y);
        let (x1, y1) = (sl[1].x, sl[1].y);
        let (x2, y2) = (sl[2].x, sl[2].y);
        let det = x0 * (y1 - y2) + x1 * (y2 - y0) + x2 * (y0 - y1);
        let gmat = [
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
        NintcheuPanel { sl, cog, gmat }
    }

    /// Barycentric coordinates of an in-plane point
    pub fn barycentric(&self, x: f64, y: f64) -> [f64; 3] {
        [
            self.gmat[0] + self.gmat[1] * x + self.gmat[2] * y,
            self.gmat[3] + self.gmat[4] * x + self.gmat[5] * y,
            self.gmat[6] + self.gmat[7] * x + self.gmat[8] * y,
        ]
    }

    /// Classify the projection of a point against the triangle
    pub fn point_position(&self, x: f64, y: f64) -> PointPosition {
        let g = self.barycentric(x, y);
        let p = PANEL_PREC;
        if g.iter().all(|&gk| gk > p && gk < 1.0 - p) {
            return PointPosition::Inside;
        }
        for k in 0..3 {
            if (g[k] - 1.0).abs() < p
                && g[(k + 1) % 3].abs() < p
                && g[(k + 2) % 3].abs() < p
            {
                return PointPosition::OnVertex(k);
            }
        }
        for k in 0..3 {
            if g[k].abs() < p {
                return PointPosition::OnEdge(k);
            }
        }
        PointPosition::Outside
    }

    /// Evaluate the moment integrals at a field point in panel-local frame
    ///
    /// Writes the `[1/Rᵏ, x/Rᵏ, y/Rᵏ, x²/Rᵏ, xy/Rᵏ, y²/Rᵏ]` families into
    /// the provided arrays, expressed about the panel centroid. The
    /// second-moment entries and `g5` require `gradients`. Returns false
    /// without touching the outputs when the field point is too close to
    /// the panel plane for the method to apply.
    pub fn integrals(
        &self,
        field_pt: &Vector3,
        gradients: bool,
        g1: Option<&mut [f64; 3]>,
        g3: Option<&mut [f64; 6]>,
        g5: Option<&mut [f64; 6]>,
    ) -> bool {
        let eta = field_pt.z;
        if eta.abs() < IN_PLANE_PRECISION {
            return false;
        }

        // normalized in-plane edge directions
        let edges = [
            self.sl[1] - self.sl[0],
            self.sl[2] - self.sl[1],
            self.sl[0] - self.sl[2],
        ];
        let u: Vec<Vector2> = edges
            .iter()
            .map(|e| {
                let n = (e.x * e.x + e.y * e.y).sqrt();
                Vector2::new(e.x / n, e.y / n)
            })
            .collect();

        // vertex angles
        let angle = |a: &Vector2, b: &Vector2| {
            let dot = a.x * (-b.x) + a.y * (-b.y);
            let det = a.x * (-b.y) - a.y * (-b.x);
            det.atan2(dot)
        };
        let theta = [angle(&u[0], &u[2]), angle(&u[1], &u[0]), angle(&u[2], &u[1])];

        // move projections landing on a vertex or an edge slightly outside
        let mut fp = *field_pt;
        let mut position = self.point_position(fp.x, fp.y);
        match position {
            PointPosition::OnVertex(k) => {
                fp.x = self.cog.x + (self.sl[k].x - self.cog.x) * 1.00001;
                fp.y = self.cog.y + (self.sl[k].y - self.cog.y) * 1.00001;
                position = self.point_position(fp.x, fp.y);
            }
            PointPosition::OnEdge(k) => {
                // push along the edge perpendicular by a fraction of the
                // centroid-to-edge distance
                let j = Vector2::new(-u[k].y, u[k].x);
                let a = &self.sl[k];
                let to_cog = Vector2::new(self.cog.x - a.x, self.cog.y - a.y);
                let dist = (to_cog.x * j.x + to_cog.y * j.y).abs();
                fp.x += j.x * dist * -0.001;
                fp.y += j.y * dist * -0.001;
                position = self.point_position(fp.x, fp.y);
            }
            _ => {}
        }

        // per-edge frames centered on the field point: x along the edge,
        // y along its in-plane perpendicular
        let jdir = [
            Vector2::new(-u[0].y, u[0].x),
            Vector2::new(-u[1].y, u[1].x),
            Vector2::new(-u[2].y, u[2].x),
        ];
        // vl[i][k]: vertex k in the frame of edge i
        let mut vl = [[Vector2::new(0.0, 0.0); 3]; 3];
        for i in 0..3 {
            for k in 0..3 {
                let d = Vector2::new(self.sl[k].x - fp.x, self.sl[k].y - fp.y);
                vl[i][k] = Vector2::new(d.dot(&u[i]), d.dot(&jdir[i]));
            }
        }

        let mut rho = [0.0f64; 4];
        for (k, r) in rho.iter_mut().take(3).enumerate() {
            let d = Vector2::new(self.sl[k].x - fp.x, self.sl[k].y - fp.y);
            *r = (d.x * d.x + d.y * d.y + eta * eta).sqrt();
        }
        rho[3] = rho[0];

        let mut q = [0.0f64; 3];
        for i in 0..3 {
            q[i] = vl[i][i].y;
        }

        let mut d = [0.0f64; 3];
        let mut rho_t = [0.0f64; 3];
        for i in 0..3 {
            d[i] = q[i] * q[i] + eta * eta;
            rho_t[i] = rho[i] - rho[i + 1];
        }

        // frame rotation angles of eq. 21
        let alfa = [0.0, PI - theta[1], PI + theta[0]];
        let cosa = [1.0, alfa[1].cos(), alfa[2].cos()];
        let sina = [0.0, alfa[1].sin(), alfa[2].sin()];

        // per-edge quantities of eq. 25
        let mut gamma = [0.0f64; 3];
        let mut chi = [0.0f64; 3];
        let mut delta = [0.0f64; 3];
        let mut ell = [0.0f64; 3];
        for i in 0..3 {
            let pii = vl[i][i].x;
            let pii1 = vl[i][(i + 1) % 3].x;
            gamma[i] = (-2.0 * pii * q[i] * eta * rho[i])
                .atan2(q[i] * q[i] * rho[i] * rho[i] - pii * pii * eta * eta)
                - (-2.0 * pii1 * q[i] * eta * rho[i + 1])
                    .atan2(q[i] * q[i] * rho[i + 1] * rho[i + 1] - pii1 * pii1 * eta * eta);
            chi[i] = (pii + rho[i]).ln() - (pii1 + rho[i + 1]).ln();
            delta[i] = pii / rho[i] - pii1 / rho[i + 1];
            ell[i] = 1.0 / rho[i] - 1.0 / rho[i + 1];
        }

        // solid-angle term, eq. 26-27
        let thet0 = match position {
            PointPosition::Inside => 2.0 * PI,
            PointPosition::OnVertex(k) => theta[k],
            PointPosition::OnEdge(_) | PointPosition::Outside => 0.0,
        };
        let sign = if eta >= 0.0 { 1.0 } else { -1.0 };
        let thetx = 0.5 * (gamma[0] + gamma[1] + gamma[2]) + sign * thet0;

        // the per-edge sums come out in the edge-0 frame; rotate them by the
        // edge-0 direction before shifting the moments to the panel centroid
        let (cosp, sinp) = (u[0].x, u[0].y);
        let rot1 = |a: f64, b: f64| (cosp * a - sinp * b, sinp * a + cosp * b);
        let rot2 = |xx: f64, xy: f64, yy: f64| {
            (
                cosp * cosp * xx - 2.0 * cosp * sinp * xy + sinp * sinp * yy,
                cosp * sinp * (xx - yy) + (cosp * cosp - sinp * sinp) * xy,
                sinp * sinp * xx + 2.0 * cosp * sinp * xy + cosp * cosp * yy,
            )
        };
        let dx = fp.x - self.cog.x;
        let dy = fp.y - self.cog.y;

        if let Some(g1) = g1 {
            // eq. 28
            let mut n = [0.0f64; 3];
            n[0] = -eta * thetx;
            for i in 0..3 {
                n[0] += q[i] * chi[i];
            }
            for i in 0..3 {
                n[1] += q[i] * rho_t[i] * cosa[i] - d[i] * chi[i] * sina[i];
                n[2] += q[i] * rho_t[i] * sina[i] + d[i] * chi[i] * cosa[i];
            }
            let (m1, m2) = rot1(0.5 * n[1], 0.5 * n[2]);

            g1[0] = n[0];
            g1[1] = dx * n[0] + m1;
            g1[2] = dy * n[0] + m2;
        }

        if let Some(g3) = g3 {
            // eq. 29
            let mut n = [0.0f64; 6];
            n[0] = 1.0 / eta * thetx;
            for i in 0..3 {
                n[1] += chi[i] * sina[i];
                n[2] -= chi[i] * cosa[i];
            }
            if gradients {
                // eq. 30
                for i in 0..3 {
                    n[3] += (q[i] * chi[i] * cosa[i] + rho_t[i] * sina[i]) * cosa[i];
                    n[4] += (q[i] * chi[i] * cosa[i] + rho_t[i] * sina[i]) * sina[i];
                    n[5] += (q[i] * chi[i] * sina[i] - rho_t[i] * cosa[i]) * sina[i];
                }
                n[3] -= eta * thetx;
                n[5] -= eta * thetx;
            }

            let (m1, m2) = rot1(n[1], n[2]);

            g3[0] = n[0];
            g3[1] = dx * n[0] + m1;
            g3[2] = dy * n[0] + m2;
            if gradients {
                let (m3, m4, m5) = rot2(n[3], n[4], n[5]);
                g3[3] = dx * dx * n[0] + m3 + 2.0 * dx * m1;
                g3[4] = dx * dy * n[0] + dy * m1 + dx * m2 + m4;
                g3[5] = dy * dy * n[0] + m5 + 2.0 * dy * m2;
            }
        }

        if let Some(g5) = g5 {
            // eq. 31
            let mut n = [0.0f64; 6];
            for i in 0..3 {
                n[0] += q[i] / d[i] * delta[i];
                n[1] += delta[i] / d[i] * sina[i];
                n[2] -= delta[i] / d[i] * cosa[i];
            }
            n[0] = n[0] / 3.0 / eta / eta + 1.0 / 3.0 / eta / eta / eta * thetx;
            n[1] /= 3.0;
            n[2] /= 3.0;
            if gradients {
                // eq. 32
                for i in 0..3 {
                    n[3] += (ell[i] * cosa[i] + q[i] / d[i] * delta[i] * sina[i]) * sina[i];
                    n[4] += (ell[i] * sina[i] - q[i] / d[i] * delta[i] * cosa[i]) * sina[i];
                    n[5] += (ell[i] * sina[i] - q[i] / d[i] * delta[i] * cosa[i]) * cosa[i];
                }
                n[3] = n[3] * (-1.0 / 3.0) + thetx / 3.0 / eta;
                n[4] *= -1.0 / 3.0;
                n[5] = n[5] * (1.0 / 3.0) + thetx / 3.0 / eta;
            }

            let (m1, m2) = rot1(n[1], n[2]);

            g5[0] = n[0];
            g5[1] = dx * n[0] + m1;
            g5[2] = dy * n[0] + m2;
            if gradients {
                let (m3, m4, m5) = rot2(n[3], n[4], n[5]);
                g5[3] = dx * dx * n[0] + m3 + 2.0 * dx * m1;
                g5[4] = dx * dy * n[0] + dy * m1 + dx * m2 + m4;
                g5[5] = dy * dy * n[0] + m5 + 2.0 * dy * m2;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::integration::gauss::GaussTriangle;
    use approx::assert_relative_eq;

    fn sample_panel() -> NintcheuPanel {
        NintcheuPanel::new(
            [
                Vector3::new(-0.4, -0.3, 0.0),
                Vector3::new(0.6, -0.2, 0.0),
                Vector3::new(0.0, 0.5, 0.0),
            ],
            Vector3::new(0.2 / 3.0, 0.0, 0.0),
        )
    }

    #[test]
    fn barycentric_coordinates_sum_to_one() {
        let p = sample_panel();
        let g = p.barycentric(0.1, 0.05);
        assert_relative_eq!(g[0] + g[1] + g[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn point_position_classification() {
        let p = sample_panel();
        assert_eq!(p.point_position(0.05, 0.0), PointPosition::Inside);
        assert_eq!(p.point_position(5.0, 5.0), PointPosition::Outside);
        assert_eq!(p.point_position(0.6, -0.2), PointPosition::OnVertex(1));
    }

    #[test]
    fn in_plane_point_is_rejected() {
        let p = sample_panel();
        let mut g1 = [0.0; 3];
        let ok = p.integrals(
            &Vector3::new(0.1, 0.1, 0.0),
            false,
            Some(&mut g1),
            None,
            None,
        );
        assert!(!ok);
    }

    #[test]
    fn first_order_matches_gauss_off_plane() {
        let p = sample_panel();
        let verts = [
            Vector3::new(-0.4, -0.3, 0.0),
            Vector3::new(0.6, -0.2, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
        ];
        let fp = Vector3::new(0.3, 0.2, 0.7);
        let cog = Vector3::new(0.2 / 3.0, 0.0, 0.0);

        let mut g1 = [0.0; 3];
        let mut g3 = [0.0; 6];
        assert!(p.integrals(&fp, false, Some(&mut g1), Some(&mut g3), None));

        let gq = GaussTriangle::new(8);
        let r = |x: f64, y: f64| {
            ((x - fp.x).powi(2) + (y - fp.y).powi(2) + fp.z * fp.z).sqrt()
        };
        let num1 = gq.integrate(&verts, |x, y| 1.0 / r(x, y));
        // moments about the centroid; edge 0 of this triangle is not
        // axis-aligned, so these catch any frame mix-up in the sums
        let numx = gq.integrate(&verts, |x, y| (x - cog.x) / r(x, y));
        let numy = gq.integrate(&verts, |x, y| (y - cog.y) / r(x, y));
        assert_relative_eq!(g1[0], num1, epsilon = 1e-6);
        assert_relative_eq!(g1[1], numx, epsilon = 1e-6);
        assert_relative_eq!(g1[2], numy, epsilon = 1e-6);

        let num3 = gq.integrate(&verts, |x, y| 1.0 / r(x, y).powi(3));
        let numx3 = gq.integrate(&verts, |x, y| (x - cog.x) / r(x, y).powi(3));
        assert_relative_eq!(g3[0], num3, epsilon = 1e-6);
        assert_relative_eq!(g3[1], numx3, epsilon = 1e-6);
    }

    #[test]
    fn third_order_integral_is_even_in_height() {
        let p = sample_panel();
        let mut above = [0.0; 6];
        let mut below = [0.0; 6];
        assert!(p.integrals(&Vector3::new(0.05, 0.0, 0.4), false, None, Some(&mut above), None));
        assert!(p.integrals(&Vector3::new(0.05, 0.0, -0.4), false, None, Some(&mut below), None));
        assert_relative_eq!(above[0], below[0], epsilon = 1e-9);
        assert!(above[0] > 0.0);
    }
}
