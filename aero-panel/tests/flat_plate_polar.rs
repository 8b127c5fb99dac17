//! Flat-plate polar sanity checks
//!
//! Solves small vortex-lattice style wings over a sweep of incidences and
//! checks the polar against lifting-line expectations: zero lift at zero
//! incidence, lift growing with incidence, and a higher lift slope at
//! higher aspect ratio.

use aero_panel::core::mesh::generators::{flat_plate_wing, flat_sheet};
use aero_panel::core::mesh::panel::SurfacePosition;
use aero_panel::{FlowCondition, PanelSolver, SolverSettings};

fn settings() -> SolverSettings {
    let _ = env_logger::builder().is_test(true).try_init();
    SolverSettings {
        wake_panel_count: 6,
        wake_length_factor: 50.0,
        multithread: false,
        ..SolverSettings::default()
    }
}

fn lift_coefficient(force_z: f64, density: f64, speed: f64, area: f64) -> f64 {
    force_z / (0.5 * density * speed * speed * area)
}

#[test]
fn no_incidence_no_lift() {
    let mesh = flat_plate_wing(1.0, 4.0, 2, 4);
    let points = PanelSolver::new(mesh)
        .with_settings(settings())
        .run(&[FlowCondition::new(20.0, 0.0, 0.0)])
        .unwrap();

    assert_eq!(points.len(), 1);
    let cl = lift_coefficient(points[0].force.z, 1.225, 20.0, 4.0);
    assert!(cl.abs() < 1e-8, "flat plate at zero incidence lifts: {}", cl);
    // solved strengths vanish with the normal wash
    assert!(points[0].doublets.iter().all(|m| m.abs() < 1e-10));
}

#[test]
fn broadside_sheet_carries_no_crossflow_force() {
    // 5 x 3 doublet sheet with the stream along its normal: the solved
    // load is symmetric, so the force has no component across the stream
    let mesh = flat_sheet(1.0, 0.6, 5, 3, SurfacePosition::Mid);
    let points = PanelSolver::new(mesh)
        .with_settings(settings())
        .run(&[FlowCondition::new(10.0, 90.0, 0.0)])
        .unwrap();

    assert_eq!(points.len(), 1);
    let f = points[0].force;
    let scale = f.norm().max(1.0);
    assert!(f.x.abs() / scale < 1e-8, "streamwise asymmetry: {}", f.x);
    assert!(f.y.abs() / scale < 1e-8, "spanwise asymmetry: {}", f.y);
}

#[test]
fn lift_grows_with_incidence() {
    let mesh = flat_plate_wing(1.0, 4.0, 2, 4);
    let conditions: Vec<FlowCondition> = [2.0, 4.0, 6.0]
        .iter()
        .map(|a| FlowCondition::new(20.0, *a, 0.0))
        .collect();
    let points = PanelSolver::new(mesh)
        .with_settings(settings())
        .run(&conditions)
        .unwrap();

    assert_eq!(points.len(), 3);
    let cl: Vec<f64> = points
        .iter()
        .map(|p| lift_coefficient(p.force.z, 1.225, 20.0, 4.0))
        .collect();

    assert!(cl[0] > 0.0, "no lift at 2 degrees: {}", cl[0]);
    assert!(cl[1] > cl[0]);
    assert!(cl[2] > cl[1]);

    // below the 2D thin-airfoil slope, with margin for the coarse mesh
    for (a, cl) in [2.0f64, 4.0, 6.0].iter().zip(&cl) {
        let two_d = 2.0 * std::f64::consts::PI * a.to_radians();
        assert!(*cl < two_d * 1.2, "cl {} above thin-airfoil bound", cl);
    }

    // induced drag of a lifting wing is positive
    assert!(points[2].induced_drag > 0.0);
}

#[test]
fn higher_aspect_ratio_lifts_harder() {
    let narrow = flat_plate_wing(1.0, 4.0, 2, 8); // AR 4
    let wide = flat_plate_wing(1.0, 8.0, 2, 16); // AR 8
    let condition = [FlowCondition::new(20.0, 4.0, 0.0)];

    let p4 = PanelSolver::new(narrow)
        .with_settings(settings())
        .run(&condition)
        .unwrap();
    let p8 = PanelSolver::new(wide)
        .with_settings(settings())
        .run(&condition)
        .unwrap();

    let cl4 = lift_coefficient(p4[0].force.z, 1.225, 20.0, 4.0);
    let cl8 = lift_coefficient(p8[0].force.z, 1.225, 20.0, 8.0);
    assert!(cl8 > cl4, "AR 8 slope {} not above AR 4 slope {}", cl8, cl4);

    // the same trend must show in the bound circulation; both wings use
    // 0.5-wide strips, so the Kutta-Joukowski lift is rho V sum(gamma) w
    let kj_cl = |gamma: &[f64], area: f64| {
        let lift = 1.225 * 20.0 * gamma.iter().sum::<f64>() * 0.5;
        lift_coefficient(lift, 1.225, 20.0, area)
    };
    let kj4 = kj_cl(&p4[0].span.gamma, 4.0);
    let kj8 = kj_cl(&p8[0].span.gamma, 8.0);
    assert!(kj4 > 0.0 && kj8 > 0.0);
    assert!(kj8 > kj4, "AR 8 loading {} not above AR 4 loading {}", kj8, kj4);
}

#[test]
fn symmetric_flight_loads_symmetrically() {
    let mesh = flat_plate_wing(1.0, 4.0, 2, 4);
    let points = PanelSolver::new(mesh)
        .with_settings(settings())
        .run(&[FlowCondition::new(20.0, 5.0, 0.0)])
        .unwrap();

    let span = &points[0].span;
    assert_eq!(span.gamma.len(), 4);
    // port and starboard strips mirror each other
    for i in 0..span.gamma.len() / 2 {
        let j = span.gamma.len() - 1 - i;
        let rel = (span.gamma[i] - span.gamma[j]).abs()
            / span.gamma[i].abs().max(span.gamma[j].abs()).max(1e-12);
        assert!(rel < 1e-6, "asymmetric circulation {} vs {}", span.gamma[i], span.gamma[j]);
        assert!((span.span_pos[i] + span.span_pos[j]).abs() < 1e-9);
    }
    // no side force without sideslip
    assert!(points[0].force.y.abs() < 1e-8 * points[0].force.z.abs().max(1.0));
}
