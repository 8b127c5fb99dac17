//! Wake sheet topology checks
//!
//! Builds wakes behind a thin wing and verifies the column structure the
//! assembly and drag passes rely on: per-column streamwise chains, node
//! sharing with the trailing edge, and the geometric series reaching the
//! requested length.

use aero_panel::core::mesh::generators::flat_plate_wing;
use aero_panel::core::mesh::SurfacePosition;
use aero_panel::Vector3;

const N_STATIONS: usize = 5;

#[test]
fn every_trailing_strip_owns_a_column() {
    let mut mesh = flat_plate_wing(1.0, 3.0, 2, 3);
    let wind = Vector3::new(1.0, 0.0, 0.0);
    let n_wake = mesh.make_wake_panels(&wind, N_STATIONS, 1.2, 30.0, false);
    mesh.connect_wake_panels();

    let trailing: Vec<_> = mesh
        .panels
        .iter()
        .filter(|p| p.trailing && matches!(p.pos, SurfacePosition::Mid))
        .collect();
    assert_eq!(trailing.len(), 3);
    assert_eq!(n_wake, 3 * 2 * N_STATIONS);
    assert_eq!(mesh.n_wake_columns, 3);

    for p in &trailing {
        assert!(p.wake.is_some());
        assert!(p.wake_column.is_some());
    }
}

#[test]
fn columns_chain_downstream_to_the_last_station() {
    let mut mesh = flat_plate_wing(1.0, 2.0, 1, 2);
    let wind = Vector3::new(1.0, 0.0, 0.0);
    mesh.make_wake_panels(&wind, N_STATIONS, 1.1, 25.0, false);

    for p in mesh.panels.iter().filter(|p| p.trailing) {
        let mut count = 0;
        let mut next = p.wake;
        let mut last_x = f64::NEG_INFINITY;
        while let Some(iw) = next {
            let wp = &mesh.wake_panels[iw];
            assert!(wp.is_wake());
            // each station sits further downstream than the one before
            assert!(wp.cog.x > last_x);
            last_x = wp.cog.x;
            count += 1;
            next = wp.down;
        }
        assert_eq!(count, 2 * N_STATIONS);
    }
}

#[test]
fn first_station_shares_the_trailing_edge_nodes() {
    let mut mesh = flat_plate_wing(1.0, 2.0, 1, 2);
    let wind = Vector3::new(1.0, 0.0, 0.0);
    mesh.make_wake_panels(&wind, N_STATIONS, 1.1, 25.0, false);

    for p in mesh.panels.iter().filter(|p| p.trailing) {
        let tl = p.s[p.left_trailing_vertex()];
        let tr = p.s[p.right_trailing_vertex()];
        assert!(tl.y < tr.y, "trailing nodes not ordered port to starboard");

        // the first wake station hangs off the same two nodes
        let iw = p.wake.unwrap();
        let near: Vec<Vector3> = mesh.wake_panels[iw..iw + 2]
            .iter()
            .flat_map(|wp| wp.s.iter().copied())
            .collect();
        assert!(near.iter().any(|s| s.distance_to(&tl) < 1e-9));
        assert!(near.iter().any(|s| s.distance_to(&tr) < 1e-9));
    }
}

#[test]
fn wake_reaches_the_requested_length() {
    let mut mesh = flat_plate_wing(1.0, 2.0, 1, 2);
    let wind = Vector3::new(1.0, 0.0, 0.0);
    let total = 40.0;
    mesh.make_wake_panels(&wind, N_STATIONS, 1.3, total, false);

    let far = mesh
        .wake_panels
        .iter()
        .flat_map(|wp| wp.s.iter())
        .map(|s| s.x)
        .fold(f64::NEG_INFINITY, f64::max);
    // trailing edge is at x = 1
    assert!((far - (1.0 + total)).abs() < 1e-6);
}

#[test]
fn wake_panels_link_across_columns() {
    let mut mesh = flat_plate_wing(1.0, 3.0, 1, 3);
    let wind = Vector3::new(1.0, 0.0, 0.0);
    mesh.make_wake_panels(&wind, N_STATIONS, 1.1, 25.0, false);
    mesh.connect_wake_panels();

    // interior wake panels see neighbors on at least two edges
    let linked = mesh
        .wake_panels
        .iter()
        .filter(|wp| wp.neighbors.iter().flatten().count() >= 2)
        .count();
    assert!(linked > mesh.wake_panel_count() / 2);
}
