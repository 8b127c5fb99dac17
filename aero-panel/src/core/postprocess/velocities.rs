//! Surface and field velocities from the solved singularity strengths
//!
//! The doublet density gradient gives the tangential perturbation velocity
//! on the surface. With one uniform strength per panel the gradient comes
//! from a plane fit over the panel and its neighbors, each neighbor first
//! developed into the panel's plane by a rotation about the shared edge.

use aero_solvers::lu_solve;
use ndarray::{Array1, Array2};

use crate::core::constants::{ANGLE_PRECISION, LENGTH_PRECISION, PI4};
use crate::core::mesh::panel::{Panel, SurfacePosition};
use crate::core::mesh::trimesh::TriMesh;
use crate::core::types::{QuadratureContext, SolverSettings, Vector3};
use crate::core::wake::{MirrorPlane, VortonWake};

/// sin 35°; fit points closer to colinear than this fall back to a line fit
const COLINEAR_SIN_LIMIT: f64 = 0.573_576_436_351_046;

/// Develop a neighbor's centroid into the panel's plane
///
/// The neighbor is rotated about the shared edge until its normal matches
/// the panel's, so the doublet samples of a folded surface become a plane
/// fit in two dimensions. Panels that are already coplanar keep their
/// centroid unchanged.
fn developed_centroid(panel: &Panel, neighbor: &Panel, edge: usize) -> Vector3 {
    let cross = neighbor.normal.cross(&panel.normal);
    let sin_t = cross.norm();
    let cos_t = panel.normal.dot(&neighbor.normal);
    let theta = sin_t.atan2(cos_t).to_degrees();

    if theta.abs() > ANGLE_PRECISION && sin_t > LENGTH_PRECISION {
        let axis = cross / sin_t;
        let pivot = panel.s[(edge + 1) % 3];
        pivot + (neighbor.cog - pivot).rotated(&axis, theta)
    } else {
        neighbor.cog
    }
}

/// Least-squares plane fit `mu(x, y) = c0 + c1 x + c2 y`
///
/// Solved through the 3x3 normal equations; a rank-deficient sample set
/// (all points colinear) yields no gradient.
fn plane_fit(samples: &[(f64, f64, f64)]) -> Option<Vector3> {
    let mut ata = Array2::<f64>::zeros((3, 3));
    let mut atb = Array1::<f64>::zeros(3);
    for &(x, y, mu) in samples {
        let row = [1.0, x, y];
        for i in 0..3 {
            for j in 0..3 {
                ata[[i, j]] += row[i] * row[j];
            }
            atb[i] += row[i] * mu;
        }
    }
    match lu_solve(&ata, &atb) {
        Ok(c) => Some(Vector3::new(-PI4 * c[1], -PI4 * c[2], 0.0)),
        Err(_) => None,
    }
}

/// Perturbation velocity per panel, in each panel's local frame
///
/// `doublets[i]` holds the uniform doublet density of panel `i`. Panels
/// with a single neighbor (tips, isolated strips) copy the neighbor's
/// velocity across the fold; panels with none get zero.
pub fn local_velocities(mesh: &TriMesh, doublets: &[f64]) -> Vec<Vector3> {
    let n = mesh.panel_count();
    let mut out = vec![Vector3::ZERO; n];
    let mut lone: Vec<(usize, usize)> = Vec::new();

    for (i, panel) in mesh.panels.iter().enumerate() {
        if panel.null_triangle {
            continue;
        }

        let mut samples: Vec<(f64, f64, f64)> = Vec::with_capacity(4);
        samples.push((0.0, 0.0, doublets[i]));
        let mut first_neighbor = None;
        for edge in 0..3 {
            let j = match panel.neighbors[edge] {
                Some(j) => j,
                None => continue,
            };
            let neighbor = &mesh.panels[j];
            if neighbor.null_triangle {
                continue;
            }
            let dev = developed_centroid(panel, neighbor, edge);
            let loc = panel.global_to_local_position(&dev);
            samples.push((loc.x, loc.y, doublets[j]));
            first_neighbor.get_or_insert(j);
        }

        match samples.len() {
            0 | 1 => {}
            2 => {
                if let Some(j) = first_neighbor {
                    lone.push((i, j));
                }
            }
            3 => {
                let (x1, y1, mu1) = samples[1];
                let (x2, y2, mu2) = samples[2];
                let n1 = x1.hypot(y1);
                let n2 = x2.hypot(y2);
                if n1 < LENGTH_PRECISION || n2 < LENGTH_PRECISION {
                    continue;
                }
                let sin_t = (x1 * y2 - y1 * x2) / (n1 * n2);
                if sin_t.abs() < COLINEAR_SIN_LIMIT {
                    // the three centroids are close to a line: fit the
                    // gradient along it instead of a plane
                    let xs = [-n1, 0.0, n2];
                    let ys = [mu1, doublets[i], mu2];
                    let xm = (xs[0] + xs[1] + xs[2]) / 3.0;
                    let ym = (ys[0] + ys[1] + ys[2]) / 3.0;
                    let mut num = 0.0;
                    let mut den = 0.0;
                    for k in 0..3 {
                        num += (xs[k] - xm) * (ys[k] - ym);
                        den += (xs[k] - xm) * (xs[k] - xm);
                    }
                    if den > LENGTH_PRECISION {
                        let slope = num / den;
                        let u = Vector3::new(x2 - x1, y2 - y1, 0.0).normalized();
                        out[i] = u * (-PI4 * slope);
                    }
                } else if let Some(v) = plane_fit(&samples) {
                    out[i] = v;
                }
            }
            _ => {
                if let Some(v) = plane_fit(&samples) {
                    out[i] = v;
                }
            }
        }
    }

    // single-neighbor panels inherit the gradient across the fold
    for (i, j) in lone {
        let global = mesh.panels[j].local_to_global(&out[j]);
        out[i] = mesh.panels[i].global_to_local(&global);
    }
    out
}

/// Total surface velocity per panel, body axes
///
/// Thin mid panels report the upper-surface value, half the tangential jump
/// above the mean flow.
pub fn surface_velocities(mesh: &TriMesh, v_inf: &Vector3, local: &[Vector3]) -> Vec<Vector3> {
    mesh.panels
        .iter()
        .zip(local)
        .map(|(p, vl)| {
            let stream = p.global_to_local(v_inf);
            let total = if matches!(p.pos, SurfacePosition::Mid) {
                stream + *vl * 0.5
            } else {
                stream + *vl
            };
            p.local_to_global(&total)
        })
        .collect()
}

/// Perturbation velocity induced at a field point by the whole model
///
/// Sums the body sources and doublets, the flat wake buffer weighted by the
/// trailing-edge doublet jump, and the vortex-particle wake when one is
/// active. With `wake_only` the body panels are skipped, which is what the
/// Trefftz-plane drag needs.
pub fn field_velocity(
    mesh: &TriMesh,
    doublets: &[f64],
    sources: &[f64],
    settings: &SolverSettings,
    vorton_wake: Option<&VortonWake>,
    c: &Vector3,
    wake_only: bool,
    ctx: &mut QuadratureContext,
) -> Vector3 {
    let mirror = MirrorPlane::from_settings(settings);
    let mut vel = Vector3::ZERO;

    let mut add = |v: Vector3, weight: f64| {
        vel += v * weight;
    };

    if !wake_only {
        for (k, p) in mesh.panels.iter().enumerate() {
            if p.null_triangle {
                continue;
            }
            if sources[k] != 0.0 {
                add(p.source_velocity(c, false, settings.kernel, ctx), sources[k]);
                if let Some(plane) = mirror {
                    let (cg, coef) = plane.image(c);
                    let mut vg = p.source_velocity(&cg, false, settings.kernel, ctx);
                    vg.z = -vg.z;
                    add(vg, sources[k] * coef);
                }
            }
            let vb = p.doublet_basis_velocity(c, settings.kernel, true, ctx);
            add(vb[0] + vb[1] + vb[2], doublets[k]);
            if let Some(plane) = mirror {
                let (cg, coef) = plane.image(c);
                let vb = p.doublet_basis_velocity(&cg, settings.kernel, true, ctx);
                let mut vg = vb[0] + vb[1] + vb[2];
                vg.z = -vg.z;
                add(vg, doublets[k] * coef);
            }
        }
    }

    // the wake buffer carries the trailing-edge doublet jump: top panels
    // add their strength, bottom panels subtract theirs
    for (k, p) in mesh.panels.iter().enumerate() {
        if !p.trailing {
            continue;
        }
        let sign = match p.pos {
            SurfacePosition::Bottom => -1.0,
            _ => 1.0,
        };
        let mut next = p.wake;
        while let Some(iw) = next {
            let wp = &mesh.wake_panels[iw];
            let vb = wp.doublet_basis_velocity(c, settings.kernel, false, ctx);
            add(vb[0] + vb[1] + vb[2], doublets[k] * sign);
            if let Some(plane) = mirror {
                let (cg, coef) = plane.image(c);
                let vb = wp.doublet_basis_velocity(&cg, settings.kernel, false, ctx);
                let mut vg = vb[0] + vb[1] + vb[2];
                vg.z = -vg.z;
                add(vg, doublets[k] * sign * coef);
            }
            next = wp.down;
        }
    }

    if let Some(wake) = vorton_wake {
        vel += wake.induced_velocity(
            c,
            settings.vorton_core_radius,
            settings.vorton_core_radius,
            mirror,
        );
    }
    vel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::generators::{flat_plate_wing, flat_sheet};
    use approx::assert_relative_eq;

    #[test]
    fn uniform_doublet_sheet_has_no_gradient() {
        let mut mesh = flat_sheet(1.0, 1.0, 3, 3, SurfacePosition::Mid);
        mesh.connect_panels();
        let mu = vec![0.7; mesh.panel_count()];
        let vel = local_velocities(&mesh, &mu);
        for v in &vel {
            assert_relative_eq!(v.norm(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn linear_doublet_field_recovers_its_gradient() {
        // mu = x on a flat sheet in the xy plane gives a velocity of
        // -4 pi along the panels' local image of the x axis
        let mut mesh = flat_sheet(2.0, 2.0, 4, 4, SurfacePosition::Mid);
        mesh.connect_panels();
        let mu: Vec<f64> = mesh.panels.iter().map(|p| p.cog.x).collect();
        let vel = local_velocities(&mesh, &mu);

        // interior panels see enough neighbors for an exact plane fit
        for (p, v) in mesh.panels.iter().zip(&vel) {
            if p.neighbors.iter().flatten().count() < 3 {
                continue;
            }
            let global = p.local_to_global(v);
            assert_relative_eq!(global.x, -PI4, epsilon = 1e-6);
            assert_relative_eq!(global.y, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn folded_neighbors_are_developed_before_the_fit() {
        // two panels meeting at a right angle along a shared edge: the
        // developed centroid lands in the first panel's plane
        let mut mesh = TriMesh::new();
        mesh.nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        mesh.panels = vec![
            Panel::new(
                mesh.nodes[0],
                mesh.nodes[1],
                mesh.nodes[2],
                [0, 1, 2],
                SurfacePosition::Body,
            ),
            Panel::new(
                mesh.nodes[0],
                mesh.nodes[3],
                mesh.nodes[1],
                [0, 3, 1],
                SurfacePosition::Body,
            ),
        ];
        mesh.connect_panels();

        let edge = mesh.panels[0]
            .neighbors
            .iter()
            .position(|n| n.is_some())
            .unwrap();
        let dev = developed_centroid(&mesh.panels[0], &mesh.panels[1], edge);
        let loc = mesh.panels[0].global_to_local_position(&dev);
        assert_relative_eq!(loc.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn surface_velocity_splits_the_jump_on_mid_panels() {
        let mesh = flat_plate_wing(1.0, 2.0, 1, 1);
        let v_inf = Vector3::new(10.0, 0.0, 0.0);
        let local = vec![Vector3::new(2.0, 0.0, 0.0); mesh.panel_count()];
        let vel = surface_velocities(&mesh, &v_inf, &local);
        for (p, v) in mesh.panels.iter().zip(&vel) {
            let expect = p.local_to_global(&(p.global_to_local(&v_inf) + local[0] * 0.5));
            assert_relative_eq!(v.x, expect.x, epsilon = 1e-12);
            assert_relative_eq!(v.z, expect.z, epsilon = 1e-12);
        }
    }

    #[test]
    fn field_velocity_decays_far_from_the_model() {
        let mut mesh = flat_sheet(1.0, 1.0, 2, 2, SurfacePosition::Body);
        mesh.connect_panels();
        let n = mesh.panel_count();
        let mu = vec![0.3; n];
        let sigma = vec![0.1; n];
        let settings = SolverSettings {
            multithread: false,
            ..SolverSettings::default()
        };
        let mut ctx = QuadratureContext::new();

        let near = field_velocity(
            &mesh,
            &mu,
            &sigma,
            &settings,
            None,
            &Vector3::new(0.5, 0.0, 0.5),
            false,
            &mut ctx,
        );
        let far = field_velocity(
            &mesh,
            &mu,
            &sigma,
            &settings,
            None,
            &Vector3::new(0.5, 0.0, 100.0),
            false,
            &mut ctx,
        );
        assert!(far.norm() < near.norm() * 1e-3);
    }
}
