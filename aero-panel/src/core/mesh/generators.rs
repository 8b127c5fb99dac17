//! Simple analytic mesh generators
//!
//! These build the flat rectangular meshes used by the tests and the demos.
//! Real aircraft meshes come from a meshing front end; the generators only
//! need to reproduce the panel numbering and flag conventions that the
//! solver relies on.

use crate::core::mesh::panel::{Panel, SurfacePosition};
use crate::core::mesh::trimesh::TriMesh;
use crate::core::types::Vector3;

/// A flat rectangular sheet of `2 nx ny` triangles in the z = 0 plane
///
/// The sheet spans `x in [0, lx]`, `y in [-ly/2, ly/2]`. No wing flags are
/// set; the panels carry the given surface position.
pub fn flat_sheet(lx: f64, ly: f64, nx: usize, ny: usize, pos: SurfacePosition) -> TriMesh {
    let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
    for i in 0..=nx {
        for j in 0..=ny {
            nodes.push(Vector3::new(
                lx * i as f64 / nx as f64,
                -ly / 2.0 + ly * j as f64 / ny as f64,
                0.0,
            ));
        }
    }
    let node_at = |i: usize, j: usize| i * (ny + 1) + j;

    let mut triangles = Vec::with_capacity(2 * nx * ny);
    for i in 0..nx {
        for j in 0..ny {
            let fl = node_at(i, j);
            let fr = node_at(i, j + 1);
            let al = node_at(i + 1, j);
            let ar = node_at(i + 1, j + 1);
            triangles.push([fl, al, ar]);
            triangles.push([ar, fr, fl]);
        }
    }

    TriMesh::from_parts(nodes, &triangles, pos)
}

/// A thin rectangular wing meshed as a camber sheet
///
/// The wing spans `y in [-span/2, span/2]` with the chord along x. Panels
/// are flagged for the lifting problem: mid surface position, leading and
/// trailing rows marked, the port half flagged as left wing, and chordwise
/// up/down links set within each strip.
///
/// The trailing panel of a strip has its edge 0 on the trailing edge with
/// vertex 1 on the left, matching the wake construction.
pub fn flat_plate_wing(chord: f64, span: f64, nx: usize, ny: usize) -> TriMesh {
    let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
    for i in 0..=nx {
        for j in 0..=ny {
            nodes.push(Vector3::new(
                chord * i as f64 / nx as f64,
                -span / 2.0 + span * j as f64 / ny as f64,
                0.0,
            ));
        }
    }
    let node_at = |i: usize, j: usize| i * (ny + 1) + j;

    let mut panels = Vec::with_capacity(2 * nx * ny);

    for j in 0..ny {
        let y_mid = -span / 2.0 + span * (j as f64 + 0.5) / ny as f64;
        let left_wing = y_mid < 0.0;

        for i in 0..nx {
            let fl = node_at(i, j);
            let fr = node_at(i, j + 1);
            let al = node_at(i + 1, j);
            let ar = node_at(i + 1, j + 1);

            // the diagonal runs from the aft edge toward the tip so that
            // the aft triangle of each half keeps its edge 0 on the
            // chordwise station
            let (lead_tri, aft_tri) = if left_wing {
                (
                    [al, fr, fl], // leading edge on edge 0 when i == 0
                    [fr, al, ar],
                )
            } else {
                (
                    [ar, fr, fl], // leading edge on edge 0 when i == 0
                    [fl, al, ar],
                )
            };
            let mut p_lead = Panel::new(
                nodes[lead_tri[0]],
                nodes[lead_tri[1]],
                nodes[lead_tri[2]],
                lead_tri,
                SurfacePosition::Mid,
            );
            let mut p_aft = Panel::new(
                nodes[aft_tri[0]],
                nodes[aft_tri[1]],
                nodes[aft_tri[2]],
                aft_tri,
                SurfacePosition::Mid,
            );

            p_lead.left_wing = left_wing;
            p_aft.left_wing = left_wing;
            p_lead.leading = i == 0;
            p_aft.trailing = i == nx - 1;

            let base = panels.len();
            p_lead.down = Some(base + 1);
            p_lead.up = if i > 0 { Some(base - 1) } else { None };
            p_aft.up = Some(base);
            p_aft.down = if i < nx - 1 { Some(base + 2) } else { None };

            panels.push(p_lead);
            panels.push(p_aft);
        }
    }

    let mut mesh = TriMesh::new();
    mesh.nodes = nodes;
    mesh.panels = panels;
    mesh.connect_panels();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sheet_has_expected_area_and_count() {
        let mesh = flat_sheet(2.0, 3.0, 4, 5, SurfacePosition::Body);
        assert_eq!(mesh.panel_count(), 40);
        assert_relative_eq!(mesh.total_area(), 6.0, epsilon = 1e-12);
        assert!(!mesh.has_null_panels());
        // all normals point up
        for p in &mesh.panels {
            assert_relative_eq!(p.normal.z, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn wing_trailing_row_is_flagged_and_ordered() {
        let nx = 3;
        let ny = 4;
        let chord = 1.0;
        let span = 4.0;
        let mesh = flat_plate_wing(chord, span, nx, ny);
        assert_eq!(mesh.panel_count(), 2 * nx * ny);

        let trailing: Vec<&Panel> = mesh.panels.iter().filter(|p| p.trailing).collect();
        assert_eq!(trailing.len(), ny);
        for p in &trailing {
            // trailing edge on edge 0, at the chordwise end
            assert_relative_eq!(p.s[1].x, chord, epsilon = 1e-12);
            assert_relative_eq!(p.s[2].x, chord, epsilon = 1e-12);
            // left trailing node really is to the left
            let tl = p.s[p.left_trailing_vertex()];
            let tr = p.s[p.right_trailing_vertex()];
            assert!(tl.y < tr.y);
        }

        let leading = mesh.panels.iter().filter(|p| p.leading).count();
        assert_eq!(leading, ny);
    }

    #[test]
    fn wing_strips_chain_through_up_down_links() {
        let mesh = flat_plate_wing(1.0, 2.0, 3, 2);
        for p in mesh.panels.iter().filter(|p| p.leading) {
            // walk from the leading panel to the trailing edge
            let mut steps = 0;
            let mut cursor = Some(p);
            let mut reached_te = false;
            while let Some(panel) = cursor {
                if panel.trailing {
                    reached_te = true;
                }
                cursor = panel.down.map(|i| &mesh.panels[i]);
                steps += 1;
                assert!(steps <= 6);
            }
            assert!(reached_te);
            assert_eq!(steps, 6);
        }
    }

    #[test]
    fn wing_halves_are_flagged_left_and_right() {
        let mesh = flat_plate_wing(1.0, 2.0, 2, 2);
        let left = mesh.panels.iter().filter(|p| p.left_wing).count();
        assert_eq!(left, mesh.panel_count() / 2);
    }
}
