//! Symmetric Gauss quadrature rules on the reference triangle
//!
//! Used as a numerical cross-check of the analytic kernels and for smooth
//! far-field integrands. The rules are exact for polynomials up to the
//! requested order.

// high-precision tabulated constants
#![allow(clippy::excessive_precision)]

use crate::core::types::Vector3;

/// A symmetric quadrature rule over the unit triangle (0,0)-(1,0)-(0,1)
#[derive(Debug, Clone)]
pub struct GaussTriangle {
    points: Vec<(f64, f64)>,
    weights: Vec<f64>,
    order: usize,
}

impl GaussTriangle {
    /// Build the rule of the given polynomial order, clamped to 1..=8
    pub fn new(order: usize) -> Self {
        let order = order.clamp(1, 8);
        let (points, weights) = rule(order);
        GaussTriangle {
            points,
            weights,
            order,
        }
    }

    /// Polynomial order of the rule
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of quadrature nodes
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the rule has no nodes
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Integrate `f(x, y)` over the triangle spanned by `verts`
    ///
    /// Only the x and y coordinates of the vertices are used; the function
    /// is sampled in the plane of the triangle.
    pub fn integrate<F>(&self, verts: &[Vector3; 3], f: F) -> f64
    where
        F: Fn(f64, f64) -> f64,
    {
        let area = ((verts[0].x * (verts[1].y - verts[2].y)
            + verts[1].x * (verts[2].y - verts[0].y)
            + verts[2].x * (verts[0].y - verts[1].y))
            / 2.0)
            .abs();

        let mut sum = 0.0;
        for (&(u, v), &w) in self.points.iter().zip(self.weights.iter()) {
            let x = verts[0].x * (1.0 - u - v) + verts[1].x * u + verts[2].x * v;
            let y = verts[0].y * (1.0 - u - v) + verts[1].y * u + verts[2].y * v;
            sum += f(x, y) * w;
        }
        sum * area
    }
}

#[allow(clippy::type_complexity)]
fn rule(order: usize) -> (Vec<(f64, f64)>, Vec<f64>) {
    match order {
        1 => (
            vec![(0.33333333333333, 0.33333333333333)],
            vec![1.00000000000000],
        ),
        2 => (
            vec![
                (0.16666666666667, 0.16666666666667),
                (0.16666666666667, 0.66666666666667),
                (0.66666666666667, 0.16666666666667),
            ],
            vec![0.33333333333333; 3],
        ),
        3 => (
            vec![
                (0.33333333333333, 0.33333333333333),
                (0.20000000000000, 0.20000000000000),
                (0.20000000000000, 0.60000000000000),
                (0.60000000000000, 0.20000000000000),
            ],
            vec![
                -0.56250000000000,
                0.52083333333333,
                0.52083333333333,
                0.52083333333333,
            ],
        ),
        4 => (
            vec![
                (0.44594849091597, 0.44594849091597),
                (0.44594849091597, 0.10810301816807),
                (0.10810301816807, 0.44594849091597),
                (0.09157621350977, 0.09157621350977),
                (0.09157621350977, 0.81684757298046),
                (0.81684757298046, 0.09157621350977),
            ],
            vec![
                0.22338158967801,
                0.22338158967801,
                0.22338158967801,
                0.10995174365532,
                0.10995174365532,
                0.10995174365532,
            ],
        ),
        5 => (
            vec![
                (0.33333333333333, 0.33333333333333),
                (0.47014206410511, 0.47014206410511),
                (0.47014206410511, 0.05971587178977),
                (0.05971587178977, 0.47014206410511),
                (0.10128650732346, 0.10128650732346),
                (0.10128650732346, 0.79742698535309),
                (0.79742698535309, 0.10128650732346),
            ],
            vec![
                0.22500000000000,
                0.13239415278851,
                0.13239415278851,
                0.13239415278851,
                0.12593918054483,
                0.12593918054483,
                0.12593918054483,
            ],
        ),
        6 => (
            vec![
                (0.24928674517091, 0.24928674517091),
                (0.24928674517091, 0.50142650965818),
                (0.50142650965818, 0.24928674517091),
                (0.06308901449150, 0.06308901449150),
                (0.06308901449150, 0.87382197101700),
                (0.87382197101700, 0.06308901449150),
                (0.31035245103378, 0.63650249912140),
                (0.63650249912140, 0.05314504984482),
                (0.05314504984482, 0.31035245103378),
                (0.63650249912140, 0.31035245103378),
                (0.31035245103378, 0.05314504984482),
                (0.05314504984482, 0.63650249912140),
            ],
            vec![
                0.11678627572638,
                0.11678627572638,
                0.11678627572638,
                0.05084490637021,
                0.05084490637021,
                0.05084490637021,
                0.08285107561837,
                0.08285107561837,
                0.08285107561837,
                0.08285107561837,
                0.08285107561837,
                0.08285107561837,
            ],
        ),
        7 => (
            vec![
                (0.33333333333333, 0.33333333333333),
                (0.26034596607904, 0.26034596607904),
                (0.26034596607904, 0.47930806784192),
                (0.47930806784192, 0.26034596607904),
                (0.06513010290222, 0.06513010290222),
                (0.06513010290222, 0.86973979419557),
                (0.86973979419557, 0.06513010290222),
                (0.31286549600487, 0.63844418856981),
                (0.63844418856981, 0.04869031542532),
                (0.04869031542532, 0.31286549600487),
                (0.63844418856981, 0.31286549600487),
                (0.31286549600487, 0.04869031542532),
                (0.04869031542532, 0.63844418856981),
            ],
            vec![
                -0.14957004446768,
                0.17561525743321,
                0.17561525743321,
                0.17561525743321,
                0.05334723560884,
                0.05334723560884,
                0.05334723560884,
                0.07711376089026,
                0.07711376089026,
                0.07711376089026,
                0.07711376089026,
                0.07711376089026,
                0.07711376089026,
            ],
        ),
        _ => (
            vec![
                (0.33333333333333, 0.33333333333333),
                (0.45929258829272, 0.45929258829272),
                (0.45929258829272, 0.08141482341455),
                (0.08141482341455, 0.45929258829272),
                (0.17056930775176, 0.17056930775176),
                (0.17056930775176, 0.65886138449648),
                (0.65886138449648, 0.17056930775176),
                (0.05054722831703, 0.05054722831703),
                (0.05054722831703, 0.89890554336594),
                (0.89890554336594, 0.05054722831703),
                (0.26311282963464, 0.72849239295540),
                (0.72849239295540, 0.00839477740996),
                (0.00839477740996, 0.26311282963464),
                (0.72849239295540, 0.26311282963464),
                (0.26311282963464, 0.00839477740996),
                (0.00839477740996, 0.72849239295540),
            ],
            vec![
                0.14431560767779,
                0.09509163426728,
                0.09509163426728,
                0.09509163426728,
                0.10321737053472,
                0.10321737053472,
                0.10321737053472,
                0.03245849762320,
                0.03245849762320,
                0.03245849762320,
                0.02723031417443,
                0.02723031417443,
                0.02723031417443,
                0.02723031417443,
                0.02723031417443,
                0.02723031417443,
            ],
        ),
    }
}
