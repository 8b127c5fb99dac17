//! Pressure coefficients and integrated loads
//!
//! Near-field loads come from summing panel pressures; the induced drag is
//! read far from the body instead, either on the flat wake buffer (Trefftz
//! plane) or on the particle wake, where the pressure summation is too
//! noisy to resolve it.

use crate::core::constants::PI4;
use crate::core::mesh::panel::SurfacePosition;
use crate::core::mesh::trimesh::TriMesh;
use crate::core::types::{FlowCondition, SolverSettings, SpanDistribs, Vector3};
use crate::core::wake::{MirrorPlane, VortonWake};

/// Pressure coefficient per panel
///
/// Thin mid panels report the loading ΔCp between the two faces, each face
/// seeing half the tangential jump; thick panels the plain
/// `1 - |V_t|² / Q∞²`. Only the in-plane velocity components enter, the
/// normal component vanishes on the surface.
pub fn pressure_coefficients(mesh: &TriMesh, v_inf: &Vector3, local: &[Vector3]) -> Vec<f64> {
    let q_sq = v_inf.norm_sq();
    mesh.panels
        .iter()
        .zip(local)
        .map(|(p, vl)| {
            let stream = p.global_to_local(v_inf);
            if matches!(p.pos, SurfacePosition::Mid) {
                let up = stream + *vl * 0.5;
                let lo = stream - *vl * 0.5;
                let cp_up = 1.0 - (up.x * up.x + up.y * up.y) / q_sq;
                let cp_lo = 1.0 - (lo.x * lo.x + lo.y * lo.y) / q_sq;
                cp_up - cp_lo
            } else {
                let vt = stream + *vl;
                1.0 - (vt.x * vt.x + vt.y * vt.y) / q_sq
            }
        })
        .collect()
}

/// Integrate the panel pressures into a force and a moment
///
/// The moment is taken about `ref_point`, body axes.
pub fn body_force_and_moment(
    mesh: &TriMesh,
    cp: &[f64],
    condition: &FlowCondition,
    density: f64,
    ref_point: &Vector3,
) -> (Vector3, Vector3) {
    let q_dyn = 0.5 * density * condition.speed * condition.speed;
    let mut force = Vector3::ZERO;
    let mut moment = Vector3::ZERO;
    for (p, cp) in mesh.panels.iter().zip(cp) {
        if p.null_triangle {
            continue;
        }
        let f = p.normal * (-cp * p.area * q_dyn);
        force += f;
        moment += (p.cog - *ref_point).cross(&f);
    }
    (force, moment)
}

/// Bound circulation shed at a trailing panel, with the lift sign
fn strip_circulation(mesh: &TriMesh, doublets: &[f64], idx: usize) -> Option<f64> {
    let p = &mesh.panels[idx];
    match p.pos {
        SurfacePosition::Mid => Some(-doublets[idx] * PI4),
        SurfacePosition::Bottom => {
            let iu = p.opposite?;
            Some((doublets[idx] - doublets[iu]) * PI4)
        }
        _ => None,
    }
}

/// Spanwise loading from the trailing-edge circulation
///
/// One entry per trailing strip, ordered as the trailing panels appear in
/// the mesh. The per-strip lift follows Kutta-Joukowski on the bound
/// circulation; induced angles are filled by the drag pass.
pub fn span_loading(mesh: &TriMesh, doublets: &[f64], condition: &FlowCondition) -> SpanDistribs {
    let q_inf = condition.speed;
    let mut span = SpanDistribs::default();
    for (idx, p) in mesh.panels.iter().enumerate() {
        if !p.trailing {
            continue;
        }
        let gamma = match strip_circulation(mesh, doublets, idx) {
            Some(g) => g,
            None => continue,
        };
        let tl = p.s[p.left_trailing_vertex()];
        let tr = p.s[p.right_trailing_vertex()];
        span.span_pos.push((tl.y + tr.y) * 0.5);
        span.gamma.push(gamma);
        // cl * chord = 2 gamma / Q, the lifting-line loading
        span.cl_chord.push(2.0 * gamma / q_inf);
        span.induced_angle.push(0.0);
    }
    span
}

/// Near-field induced force from Kutta-Joukowski on each trailing strip
pub fn induced_force(
    mesh: &TriMesh,
    doublets: &[f64],
    condition: &FlowCondition,
    density: f64,
) -> Vector3 {
    let v_inf = condition.freestream();
    let mut force = Vector3::ZERO;
    for (idx, p) in mesh.panels.iter().enumerate() {
        if !p.trailing {
            continue;
        }
        let gamma = match strip_circulation(mesh, doublets, idx) {
            Some(g) => g,
            None => continue,
        };
        let te = p.s[p.right_trailing_vertex()] - p.s[p.left_trailing_vertex()];
        force += v_inf.cross(&te) * (gamma * density);
    }
    force
}

/// Far-field induced drag on the Trefftz plane
///
/// `wake_velocity` returns the wake-only perturbation velocity at a point.
/// Each strip is probed at mid wake length, where half the wake-induced
/// velocity approximates the fully developed downwash; the drag is the
/// streamwise component of the Kutta-Joukowski force there. Returns the
/// drag and the induced angle per strip, in degrees.
pub fn trefftz_drag<F>(
    mesh: &TriMesh,
    doublets: &[f64],
    condition: &FlowCondition,
    density: f64,
    wake_velocity: F,
) -> (f64, Vec<f64>)
where
    F: Fn(&Vector3) -> Vector3,
{
    let wind = condition.freestream().normalized();
    let q_inf = condition.speed;
    let mut drag = 0.0;
    let mut angles = Vec::new();

    for (idx, p) in mesh.panels.iter().enumerate() {
        if !p.trailing {
            continue;
        }
        let gamma = match strip_circulation(mesh, doublets, idx) {
            Some(g) => g,
            None => continue,
        };
        let iw = match p.wake {
            Some(iw) => iw,
            None => continue,
        };

        // walk to the middle of the wake column
        let mut stations = Vec::new();
        let mut next = Some(iw);
        while let Some(k) = next {
            stations.push(k);
            next = mesh.wake_panels[k].down;
        }
        let wp = &mesh.wake_panels[stations[stations.len() / 2]];
        let tl = wp.s[wp.left_trailing_vertex()];
        let tr = wp.s[wp.right_trailing_vertex()];
        let probe = (tl + tr) * 0.5;

        let wg = wake_velocity(&probe) * 0.5;
        let te = p.s[p.right_trailing_vertex()] - p.s[p.left_trailing_vertex()];
        let strip_force = wg.cross(&te) * (gamma * density);
        drag += strip_force.dot(&wind);
        angles.push(wg.dot(&p.normal).atan2(q_inf).to_degrees());
    }
    (drag, angles)
}

/// Induced drag read off the particle wake
///
/// The crossflow filaments of the newest row index the same stations in
/// every row, so the mid-age row gives a developed-wake probe line. Returns
/// the drag and the induced angle per station, in degrees.
pub fn vorton_drag(
    wake: &VortonWake,
    settings: &SolverSettings,
    condition: &FlowCondition,
) -> (f64, Vec<f64>) {
    let mut drag = 0.0;
    let mut angles = Vec::new();
    if wake.rows.is_empty() {
        return (drag, angles);
    }

    let mirror = MirrorPlane::from_settings(settings);
    let wind = condition.freestream().normalized();
    let q_inf = condition.speed;
    let row = &wake.rows[wake.rows.len() / 2];

    for vx in &wake.neg_vortices {
        let (a, b) = (vx.node_idx[0], vx.node_idx[1]);
        if a >= row.len() || b >= row.len() {
            continue;
        }
        let p0 = row[a].position;
        let p1 = row[b].position;
        let probe = (p0 + p1) * 0.5;
        let wg = wake.induced_velocity(
            &probe,
            settings.vorton_core_radius,
            settings.vorton_core_radius,
            mirror,
        ) * 0.5;

        // the filament carries the negated shed circulation, which is the
        // lift-signed bound circulation of the strip
        let gamma = vx.circulation;
        let seg = p1 - p0;
        let strip_force = wg.cross(&seg) * (gamma * settings.density);
        drag += strip_force.dot(&wind);

        let n = wind.cross(&seg).normalized();
        angles.push(wg.dot(&n).atan2(q_inf).to_degrees());
    }
    (drag, angles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::generators::{flat_plate_wing, flat_sheet};
    use crate::core::wake::Vorton;
    use approx::assert_relative_eq;

    #[test]
    fn zero_perturbation_gives_zero_thin_loading() {
        let mesh = flat_plate_wing(1.0, 2.0, 2, 2);
        let v_inf = Vector3::new(10.0, 0.0, 0.0);
        let local = vec![Vector3::ZERO; mesh.panel_count()];
        let cp = pressure_coefficients(&mesh, &v_inf, &local);
        for c in &cp {
            assert_relative_eq!(*c, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn stagnated_thick_panel_reads_unit_cp() {
        // local velocity cancelling the tangential stream leaves Cp = 1
        let mesh = flat_sheet(1.0, 1.0, 1, 1, SurfacePosition::Body);
        let v_inf = Vector3::new(3.0, 0.0, 0.0);
        let local: Vec<Vector3> = mesh
            .panels
            .iter()
            .map(|p| -p.global_to_local(&v_inf))
            .collect();
        let cp = pressure_coefficients(&mesh, &v_inf, &local);
        for c in &cp {
            assert_relative_eq!(*c, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn uniform_suction_pulls_along_the_normal() {
        let mesh = flat_sheet(2.0, 1.0, 2, 2, SurfacePosition::Body);
        let cp = vec![-1.0; mesh.panel_count()];
        let condition = FlowCondition::new(10.0, 0.0, 0.0);
        let (force, moment) = body_force_and_moment(
            &mesh,
            &cp,
            &condition,
            1.225,
            &Vector3::new(1.0, 0.0, 0.0),
        );

        let q_dyn = 0.5 * 1.225 * 100.0;
        // all panels share the +z normal here
        assert_relative_eq!(force.z, q_dyn * mesh.total_area(), epsilon = 1e-9);
        assert_relative_eq!(force.x, 0.0, epsilon = 1e-12);
        // the sheet is centered on the reference x, so no pitching moment
        assert_relative_eq!(moment.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn span_loading_reports_one_entry_per_strip() {
        let mut mesh = flat_plate_wing(1.0, 4.0, 2, 4);
        let wind = Vector3::new(1.0, 0.0, 0.0);
        mesh.make_wake_panels(&wind, 3, 1.1, 10.0, false);

        let mu = vec![-0.1; mesh.panel_count()];
        let condition = FlowCondition::new(10.0, 0.0, 0.0);
        let span = span_loading(&mesh, &mu, &condition);

        assert_eq!(span.span_pos.len(), 4);
        assert_eq!(span.gamma.len(), 4);
        // negative doublet strength means positive lift-signed circulation
        for g in &span.gamma {
            assert_relative_eq!(*g, 0.1 * PI4, epsilon = 1e-12);
        }
        // stations ordered port to starboard
        for w in span.span_pos.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn induced_force_lifts_against_the_downwash_sign() {
        let mut mesh = flat_plate_wing(1.0, 2.0, 1, 2);
        let wind = Vector3::new(1.0, 0.0, 0.0);
        mesh.make_wake_panels(&wind, 3, 1.1, 10.0, false);

        let mu = vec![-0.1; mesh.panel_count()];
        let condition = FlowCondition::new(10.0, 0.0, 0.0);
        let f = induced_force(&mesh, &mu, &condition, 1.225);
        // V along +x, strips along +y, positive circulation: lift along +z
        assert!(f.z > 0.0);
        assert_relative_eq!(f.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn uniform_downwash_prices_the_drag() {
        let mut mesh = flat_plate_wing(1.0, 2.0, 1, 2);
        let wind = Vector3::new(1.0, 0.0, 0.0);
        mesh.make_wake_panels(&wind, 4, 1.0, 10.0, false);

        let mu = vec![-0.1; mesh.panel_count()];
        let condition = FlowCondition::new(10.0, 0.0, 0.0);
        let density = 1.225;

        // wake blowing straight down: drag = rho * gamma * w * span
        let w = -2.0;
        let (drag, angles) = trefftz_drag(&mesh, &mu, &condition, density, |_| {
            Vector3::new(0.0, 0.0, w)
        });

        let gamma = 0.1 * PI4;
        let expect = density * gamma * (-w * 0.5) * 2.0;
        assert_relative_eq!(drag, expect, epsilon = 1e-9);
        for a in &angles {
            assert!(*a < 0.0);
        }
    }

    #[test]
    fn vorton_drag_on_a_tip_vortex_pair() {
        let settings = SolverSettings {
            vorton_core_radius: 0.05,
            ..SolverSettings::default()
        };
        let condition = FlowCondition::new(10.0, 0.0, 0.0);

        // one row of counter-rotating streamwise tip vortons and the
        // filament connecting them; they induce downwash between the tips
        let gamma = 1.0;
        let mut wake = VortonWake::new();
        wake.rows.push(vec![
            Vorton::new(Vector3::new(1.0, -1.0, 0.0), Vector3::new(-gamma, 0.0, 0.0)),
            Vorton::new(Vector3::new(1.0, 1.0, 0.0), Vector3::new(gamma, 0.0, 0.0)),
        ]);
        wake.neg_vortices = vec![crate::core::wake::TrailingVortex {
            nodes: [Vector3::new(1.0, -1.0, 0.0), Vector3::new(1.0, 1.0, 0.0)],
            node_idx: [0, 1],
            circulation: gamma,
        }];

        let (drag, angles) = vorton_drag(&wake, &settings, &condition);
        assert!(drag > 0.0);
        assert_eq!(angles.len(), 1);
        assert!(angles[0] < 0.0);
    }
}
