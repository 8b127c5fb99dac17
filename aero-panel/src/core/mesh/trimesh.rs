//! Triangular surface mesh with trailing-edge wake generation
//!
//! The mesh owns the body panels and, once a flow direction is known, the
//! flat wake sheet shed from the trailing edges. Wake columns are built two
//! triangles per streamwise station, with panel lengths growing as a
//! geometric series so the sheet can extend far downstream with few panels.

use crate::core::mesh::panel::{Panel, SurfacePosition};
use crate::core::types::Vector3;
use std::collections::HashMap;

/// nodes closer than this are considered identical when matching wake edges
const NODE_MATCH_DISTANCE: f64 = 1.0e-6;

/// A triangular panel mesh
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    /// mesh nodes, global frame
    pub nodes: Vec<Vector3>,
    /// body panels
    pub panels: Vec<Panel>,
    /// wake panels, rebuilt for each flow condition
    pub wake_panels: Vec<Panel>,
    /// number of trailing-edge wake columns
    pub n_wake_columns: usize,
    /// reference geometry for restoring between flow conditions
    base_nodes: Vec<Vector3>,
    base_vertices: Vec<[Vector3; 3]>,
}

impl TriMesh {
    /// An empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from a node list and vertex-index triples
    pub fn from_parts(
        nodes: Vec<Vector3>,
        triangles: &[[usize; 3]],
        pos: SurfacePosition,
    ) -> Self {
        let mut mesh = TriMesh {
            nodes,
            ..Default::default()
        };
        for tri in triangles {
            let p = Panel::new(
                mesh.nodes[tri[0]],
                mesh.nodes[tri[1]],
                mesh.nodes[tri[2]],
                *tri,
                pos,
            );
            mesh.panels.push(p);
        }
        mesh.connect_panels();
        mesh
    }

    /// Number of body panels
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Number of wake panels
    pub fn wake_panel_count(&self) -> usize {
        self.wake_panels.len()
    }

    /// True if any body panel is degenerate
    pub fn has_null_panels(&self) -> bool {
        self.panels.iter().any(|p| p.null_triangle)
    }

    /// Total wetted area of the body panels
    pub fn total_area(&self) -> f64 {
        self.panels.iter().map(|p| p.area).sum()
    }

    /// Worst panel quality factor over the mesh
    pub fn worst_quality(&self) -> f64 {
        self.panels
            .iter()
            .filter(|p| !p.null_triangle)
            .map(|p| p.quality_factor())
            .fold(0.0, f64::max)
    }

    // ------------------------------------------------------------------
    // connectivity
    // ------------------------------------------------------------------

    /// Link panels sharing an edge through their node indices
    pub fn connect_panels(&mut self) {
        let mut edge_map: HashMap<(usize, usize), (usize, usize)> = HashMap::new();

        for ip in 0..self.panels.len() {
            for ie in 0..3 {
                let key = Self::edge_key(&self.panels[ip], ie);
                match edge_map.get(&key) {
                    Some(&(jp, je)) => {
                        self.panels[ip].neighbors[ie] = Some(jp);
                        self.panels[jp].neighbors[je] = Some(ip);
                    }
                    None => {
                        edge_map.insert(key, (ip, ie));
                    }
                }
            }
        }
    }

    fn edge_key(p: &Panel, ie: usize) -> (usize, usize) {
        let (a, b) = match ie {
            0 => (p.node_idx[1], p.node_idx[2]),
            1 => (p.node_idx[2], p.node_idx[0]),
            _ => (p.node_idx[0], p.node_idx[1]),
        };
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Link wake panels sharing an edge, by geometric comparison
    ///
    /// Wake vertices are synthesised rather than indexed, so edges are
    /// matched on their endpoints.
    pub fn connect_wake_panels(&mut self) {
        for it0 in 0..self.wake_panels.len() {
            self.wake_panels[it0].neighbors = [None; 3];
        }
        for it0 in 0..self.wake_panels.len() {
            for it1 in it0 + 1..self.wake_panels.len() {
                for ie0 in 0..3 {
                    for ie1 in 0..3 {
                        if Self::same_edge(&self.wake_panels[it0], ie0, &self.wake_panels[it1], ie1)
                        {
                            self.wake_panels[it0].neighbors[ie0] = Some(it1);
                            self.wake_panels[it1].neighbors[ie1] = Some(it0);
                        }
                    }
                }
            }
        }
    }

    fn same_edge(p0: &Panel, ie0: usize, p1: &Panel, ie1: usize) -> bool {
        let (a0, b0) = (p0.s[(ie0 + 1) % 3], p0.s[(ie0 + 2) % 3]);
        let (a1, b1) = (p1.s[(ie1 + 1) % 3], p1.s[(ie1 + 2) % 3]);
        (a0.distance_to(&a1) < NODE_MATCH_DISTANCE && b0.distance_to(&b1) < NODE_MATCH_DISTANCE)
            || (a0.distance_to(&b1) < NODE_MATCH_DISTANCE
                && b0.distance_to(&a1) < NODE_MATCH_DISTANCE)
    }

    // ------------------------------------------------------------------
    // wake construction
    // ------------------------------------------------------------------

    /// Build the flat wake sheet behind the trailing edges
    ///
    /// One column of `2 * n_streamwise` triangles is shed from each trailing
    /// bottom or mid panel, aligned with `wind_dir`. Streamwise panel lengths
    /// grow by `progression` at each station so the sheet reaches
    /// `total_length` with few panels. Returns the number of wake panels.
    pub fn make_wake_panels(
        &mut self,
        wind_dir: &Vector3,
        n_streamwise: usize,
        progression: f64,
        total_length: f64,
        align_te: bool,
    ) -> usize {
        self.wake_panels.clear();
        self.n_wake_columns = 0;

        let mut series = 0.0;
        let mut r = 1.0;
        for _ in 0..n_streamwise {
            series += r;
            r *= progression;
        }

        let mut mw = 0usize;
        for i3 in 0..self.panels.len() {
            if !self.panels[i3].trailing {
                continue;
            }
            if !matches!(
                self.panels[i3].pos,
                SurfacePosition::Bottom | SurfacePosition::Mid
            ) {
                continue;
            }

            self.panels[i3].wake = Some(mw);
            self.panels[i3].wake_column = Some(self.n_wake_columns);
            let left_wing = self.panels[i3].left_wing;

            let mut tl = self.panels[i3].s[self.panels[i3].left_trailing_vertex()];
            let mut tr = self.panels[i3].s[self.panels[i3].right_trailing_vertex()];

            let (mut l0l, mut l0r) = if align_te {
                ((total_length - tl.x) / series, (total_length - tr.x) / series)
            } else {
                (total_length / series, total_length / series)
            };

            for nx in 0..n_streamwise {
                let tl1 = tl + *wind_dir * l0l;
                let tr1 = tr + *wind_dir * l0r;
                l0l *= progression;
                l0r *= progression;

                let (bl, br, bl1, br1) = (tl, tr, tl1, tr1);

                let (mut up_panel, mut down_panel) = if left_wing {
                    // diagonal from the right trailing node to the left
                    // far node
                    (
                        Panel::new(bl1, br, bl, [0; 3], SurfacePosition::Wake),
                        Panel::new(br1, br, bl1, [0; 3], SurfacePosition::Wake),
                    )
                } else {
                    (
                        Panel::new(br1, br, bl, [0; 3], SurfacePosition::Wake),
                        Panel::new(bl1, br1, bl, [0; 3], SurfacePosition::Wake),
                    )
                };

                up_panel.left_wing = left_wing;
                up_panel.up = if nx > 0 { Some(mw - 1) } else { None };
                up_panel.down = Some(mw + 1);
                up_panel.wake_column = Some(self.n_wake_columns);

                down_panel.left_wing = left_wing;
                down_panel.up = Some(mw);
                down_panel.down = if nx < n_streamwise - 1 {
                    Some(mw + 2)
                } else {
                    None
                };
                down_panel.wake_column = Some(self.n_wake_columns);

                self.wake_panels.push(up_panel);
                self.wake_panels.push(down_panel);

                tl = tl1;
                tr = tr1;
                mw += 2;
            }
            self.n_wake_columns += 1;
        }

        // the top trailing panels share the wake column of their opposite
        // bottom panel
        for i3 in 0..self.panels.len() {
            if !self.panels[i3].trailing || self.panels[i3].pos != SurfacePosition::Bottom {
                continue;
            }
            let wake = self.panels[i3].wake;
            let column = self.panels[i3].wake_column;
            if let Some(iop) = self.panels[i3].opposite {
                self.panels[iop].wake = wake;
                self.panels[iop].wake_column = column;
            }
        }

        mw
    }

    // ------------------------------------------------------------------
    // geometry transforms
    // ------------------------------------------------------------------

    /// Record the current geometry as the reference state
    pub fn save_base_geometry(&mut self) {
        self.base_nodes = self.nodes.clone();
        self.base_vertices = self.panels.iter().map(|p| p.s).collect();
    }

    /// Restore the geometry recorded by [`save_base_geometry`]
    ///
    /// [`save_base_geometry`]: TriMesh::save_base_geometry
    pub fn restore_base_geometry(&mut self) {
        if self.base_vertices.len() != self.panels.len() {
            return;
        }
        self.nodes.clone_from(&self.base_nodes);
        for (p, s) in self.panels.iter_mut().zip(self.base_vertices.iter()) {
            p.s = *s;
            p.set_frame();
        }
    }

    /// Rotate the whole mesh about an axis through `center`
    pub fn rotate(&mut self, center: &Vector3, axis: &Vector3, angle_deg: f64) {
        for n in self.nodes.iter_mut() {
            let r = *n - *center;
            *n = *center + r.rotated(axis, angle_deg);
        }
        for p in self.panels.iter_mut() {
            p.rotate(center, axis, angle_deg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_triangle_square() -> TriMesh {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        TriMesh::from_parts(nodes, &[[0, 1, 2], [0, 2, 3]], SurfacePosition::Body)
    }

    #[test]
    fn neighbours_are_linked_across_the_diagonal() {
        let mesh = two_triangle_square();
        assert_eq!(mesh.panel_count(), 2);
        // shared edge (0, 2) is edge 1 of the first panel and edge 2 of
        // the second
        assert_eq!(mesh.panels[0].neighbors[1], Some(1));
        assert_eq!(mesh.panels[1].neighbors[2], Some(0));
        assert_eq!(mesh.panels[0].neighbors[0], None);
        assert_relative_eq!(mesh.total_area(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn wake_columns_follow_the_wind() {
        let mut mesh = two_triangle_square();
        mesh.panels[0].pos = SurfacePosition::Mid;
        mesh.panels[1].pos = SurfacePosition::Mid;
        mesh.panels[0].trailing = true;

        let wind = Vector3::new(1.0, 0.0, 0.0);
        let n = mesh.make_wake_panels(&wind, 4, 1.2, 10.0, false);
        assert_eq!(n, 8);
        assert_eq!(mesh.n_wake_columns, 1);
        assert_eq!(mesh.panels[0].wake, Some(0));

        // streamwise lengths follow the geometric series and add up to
        // the prescribed wake length
        let last = &mesh.wake_panels[n - 1];
        let furthest = last
            .s
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        let te_x = 1.0;
        assert_relative_eq!(furthest, te_x + 10.0, epsilon = 1e-10);

        // up/down links chain the column
        assert_eq!(mesh.wake_panels[0].up, None);
        assert_eq!(mesh.wake_panels[0].down, Some(1));
        assert_eq!(mesh.wake_panels[1].down, Some(2));
        assert_eq!(mesh.wake_panels[n - 1].down, None);
    }

    #[test]
    fn wake_panels_connect_geometrically() {
        let mut mesh = two_triangle_square();
        mesh.panels[0].pos = SurfacePosition::Mid;
        mesh.panels[0].trailing = true;
        let wind = Vector3::new(1.0, 0.0, 0.0);
        mesh.make_wake_panels(&wind, 2, 1.0, 4.0, false);
        mesh.connect_wake_panels();
        // the two triangles of a station share their diagonal
        assert!(mesh.wake_panels[0]
            .neighbors
            .iter()
            .any(|&nb| nb == Some(1)));
    }

    #[test]
    fn restore_undoes_a_rotation() {
        let mut mesh = two_triangle_square();
        mesh.save_base_geometry();
        let origin = Vector3::ZERO;
        let y_axis = Vector3::new(0.0, 1.0, 0.0);
        mesh.rotate(&origin, &y_axis, 5.0);
        assert!(mesh.panels[0].normal.x.abs() > 1e-3);
        mesh.restore_base_geometry();
        assert_relative_eq!(mesh.panels[0].normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.nodes[1].x, 1.0, epsilon = 1e-12);
    }
}
