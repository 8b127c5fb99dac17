//! Vortex particle wake
//!
//! In the vorton wake model the trailing doublet sheet is truncated to a
//! short buffer of flat panels, and the circulation leaving the buffer is
//! lumped into rows of vortex particles. Each wake iteration sheds a new
//! row at the trailing edge, advects the existing particles with the local
//! velocity, and discards rows that have left the resolved region.
//!
//! ## Module Organization
//!
//! - [`vorton`] - vortex particles and trailing filaments
//! - [`VortonWake`] - rows of particles plus shedding, merging and advection

pub mod vorton;

pub use vorton::{TrailingVortex, Vorton};

use crate::core::constants::{PI4, VORTON_MERGE_PRECISION};
use crate::core::mesh::panel::SurfacePosition;
use crate::core::mesh::trimesh::TriMesh;
use crate::core::types::{SolverSettings, Vector3};

/// Mirror plane for ground or free-surface corrections
#[derive(Debug, Clone, Copy)]
pub enum MirrorPlane {
    /// rigid ground at the given height below the origin
    Ground(f64),
    /// free surface at the given height
    FreeSurface(f64),
}

impl MirrorPlane {
    /// Read the mirror plane out of the solver settings, if any
    pub fn from_settings(settings: &SolverSettings) -> Option<MirrorPlane> {
        settings.ground_height.map(|h| {
            if settings.free_surface {
                MirrorPlane::FreeSurface(h)
            } else {
                MirrorPlane::Ground(h)
            }
        })
    }

    /// Image of a field point, and the sign the mirrored influence carries
    pub fn image(&self, c: &Vector3) -> (Vector3, f64) {
        match *self {
            MirrorPlane::Ground(h) => (Vector3::new(c.x, c.y, -c.z - 2.0 * h), 1.0),
            MirrorPlane::FreeSurface(h) => (Vector3::new(c.x, c.y, -c.z - 2.0 * h), -1.0),
        }
    }
}

/// The particle wake, organised in rows
///
/// Rows are ordered newest first; row 0 lies in the crossflow plane just
/// behind the wake buffer. The number of particles varies between rows as
/// coincident particles are merged when a row is shed.
#[derive(Debug, Clone, Default)]
pub struct VortonWake {
    /// vorton rows, newest first
    pub rows: Vec<Vec<Vorton>>,
    /// trailing filaments closing the newest row's circulation
    pub neg_vortices: Vec<TrailingVortex>,
}

impl VortonWake {
    /// An empty wake
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of active particles
    pub fn active_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|v| v.active).count())
            .sum()
    }

    /// Discard all particles
    pub fn clear(&mut self) {
        self.rows.clear();
        self.neg_vortices.clear();
    }

    // ------------------------------------------------------------------
    // shedding
    // ------------------------------------------------------------------

    /// Convert the trailing-edge doublet distribution into a vorton row
    ///
    /// `doublets[i]` holds the uniform doublet density of panel `i`. Each
    /// trailing station sheds a pair of counter-rotating streamwise vortons
    /// of strength `gamma * dl` at the downstream edge of the first wake
    /// station, plus a crossflow filament that cancels the bound
    /// circulation. The vorticity at the two tips equals the panel's doublet
    /// strength, so the vorticity is zero outside the wake.
    pub fn shed_row(&mut self, mesh: &TriMesh, doublets: &[f64], dl: f64) {
        let mut row: Vec<Vorton> = Vec::new();
        let mut neg: Vec<TrailingVortex> = Vec::new();

        for (idx, p3) in mesh.panels.iter().enumerate().filter(|(_, p)| p.trailing) {
            let gamma = match p3.pos {
                SurfacePosition::Mid => doublets[idx] * PI4,
                SurfacePosition::Bottom => {
                    let iu = match p3.opposite {
                        Some(iu) => iu,
                        None => continue,
                    };
                    (doublets[iu] - doublets[idx]) * PI4
                }
                _ => continue,
            };

            let iw = match p3.wake {
                Some(iw) => iw,
                None => continue,
            };
            let wu = &mesh.wake_panels[iw];
            let wd = &mesh.wake_panels[iw + 1];

            // downstream unit directions along the side edges of the first
            // wake station, and the far nodes the vortons hang from
            let (left_pos, left_dir, right_pos, right_dir, n0, n1) = if p3.left_wing {
                // up panel (far-left, te-right, te-left), down panel
                // (far-right, te-right, far-left)
                let left_dir = (wu.s[0] - wu.s[2]).normalized();
                let right_dir = (wd.s[0] - wd.s[1]).normalized();
                (wu.s[0], left_dir, wd.s[0], right_dir, wd.s[2], wd.s[0])
            } else {
                // up panel (far-right, te-right, te-left), down panel
                // (far-left, far-right, te-left)
                let left_dir = (wd.s[0] - wd.s[2]).normalized();
                let right_dir = (wd.s[1] - wu.s[1]).normalized();
                (wd.s[0], left_dir, wd.s[1], right_dir, wd.s[0], wd.s[1])
            };

            let m = row.len();
            row.push(Vorton::new(
                left_pos + left_dir * (dl / 2.0),
                left_dir * (gamma * dl),
            ));
            row.push(Vorton::new(
                right_pos + right_dir * (dl / 2.0),
                right_dir * (-gamma * dl),
            ));
            neg.push(TrailingVortex {
                nodes: [n0, n1],
                node_idx: [m, m + 1],
                circulation: -gamma,
            });
        }

        // merge coincident vortons and point the filaments at the survivors
        let (row, renumber) = merge_coincident(&row);
        for vx in neg.iter_mut() {
            for idx in vx.node_idx.iter_mut() {
                *idx = renumber[*idx];
            }
        }

        self.rows.insert(0, row);
        self.neg_vortices = neg;

        // drop the oldest row once none of its particles is active
        if let Some(last) = self.rows.last() {
            if !last.iter().any(|v| v.active) {
                self.rows.pop();
            }
        }
    }

    // ------------------------------------------------------------------
    // induction
    // ------------------------------------------------------------------

    /// Velocity induced by all active particles and trailing filaments
    pub fn induced_velocity(
        &self,
        c: &Vector3,
        core_length: f64,
        segment_core: f64,
        mirror: Option<MirrorPlane>,
    ) -> Vector3 {
        let mut vel = Vector3::ZERO;
        for row in &self.rows {
            for vtn in row.iter().filter(|v| v.active) {
                vel += vtn.induced_velocity(c, core_length);
                if let Some(plane) = mirror {
                    let (cg, coef) = plane.image(c);
                    let vg = vtn.induced_velocity(&cg, core_length);
                    vel.x += vg.x * coef;
                    vel.y += vg.y * coef;
                    vel.z -= vg.z * coef;
                }
            }
        }
        for vx in &self.neg_vortices {
            vel += vx.induced_velocity(c, segment_core);
            if let Some(MirrorPlane::Ground(h)) = mirror {
                let cg = Vector3::new(c.x, c.y, -c.z - 2.0 * h);
                let vg = vx.induced_velocity(&cg, segment_core);
                vel.x += vg.x;
                vel.y += vg.y;
                vel.z -= vg.z;
            }
        }
        vel
    }

    /// Velocity gradient tensor induced by all active particles
    ///
    /// `g[3 i + j]` holds `dV_j / dx_i`.
    pub fn velocity_gradient(&self, c: &Vector3, core_length: f64) -> [f64; 9] {
        let mut total = [0.0; 9];
        let mut g = [0.0; 9];
        for row in &self.rows {
            for vtn in row.iter().filter(|v| v.active) {
                vtn.velocity_gradient(c, core_length, &mut g);
                for i in 0..9 {
                    total[i] += g[i];
                }
            }
        }
        total
    }

    // ------------------------------------------------------------------
    // advection
    // ------------------------------------------------------------------

    /// Advect the particles with a second-order Runge-Kutta step
    ///
    /// `velocity` returns the perturbation velocity at a point, from the
    /// body panels, the buffer wake and this wake's current state. Particles
    /// further than `max_length` from the origin are deactivated. The new
    /// rows are returned so the caller can evaluate `velocity` against the
    /// pre-step state.
    pub fn advected<F>(
        &self,
        velocity: F,
        v_inf: &Vector3,
        dt: f64,
        max_length: f64,
    ) -> Vec<Vec<Vorton>>
    where
        F: Fn(&Vector3) -> Vector3,
    {
        let mut rows = self.rows.clone();
        for row in rows.iter_mut() {
            for vtn in row.iter_mut().filter(|v| v.active) {
                let p0 = vtn.position;
                let v1 = velocity(&p0);
                let k1 = (*v_inf + v1) * dt;
                let p1 = p0 + k1 / 2.0;
                let v2 = velocity(&p1);
                vtn.position = p0 + (*v_inf + v2) * dt;
                if vtn.position.norm() > max_length {
                    vtn.active = false;
                }
            }
        }
        rows
    }

    /// Replace the particle rows after an advection step
    pub fn set_rows(&mut self, rows: Vec<Vec<Vorton>>) {
        self.rows = rows;
    }
}

/// Lump coincident vortons into a fresh compacted row
///
/// Returns the compacted row and a map from old indices to new ones; a
/// vorton within [`VORTON_MERGE_PRECISION`] of an earlier one maps to that
/// survivor. Vorticity vectors add, so the lumped strength does not depend
/// on the order the duplicates were shed in.
fn merge_coincident(row: &[Vorton]) -> (Vec<Vorton>, Vec<usize>) {
    let mut merged: Vec<Vorton> = Vec::with_capacity(row.len());
    let mut renumber = Vec::with_capacity(row.len());
    for vtn in row {
        match merged
            .iter()
            .position(|m| m.position.distance_to(&vtn.position) < VORTON_MERGE_PRECISION)
        {
            Some(im) => {
                merged[im].vortex += vtn.vortex;
                renumber.push(im);
            }
            None => {
                renumber.push(merged.len());
                merged.push(*vtn);
            }
        }
    }
    (merged, renumber)
}
