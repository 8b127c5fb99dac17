//! Influence matrix and right-hand-side assembly
//!
//! One collocation row is written per panel, at the panel centroid. Thick
//! panels use the internal Dirichlet condition (the summed doublet
//! potentials), thin mid panels use the Neumann condition (the summed
//! doublet velocities dotted with the panel normal). The flat wake buffer
//! folds into the trailing-edge columns through the Kutta condition, and an
//! optional ground or free-surface image doubles every evaluation.
//!
//! All influences carry the shared 4π scaling of the panel kernels; the
//! source strengths absorb it, so the solved doublet strengths can be mixed
//! and matched linearly between unit onset flows.

use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::core::constants::PI4;
use crate::core::mesh::panel::SurfacePosition;
use crate::core::mesh::trimesh::TriMesh;
use crate::core::parallel::parallel_map_indexed;
use crate::core::types::{FlowCondition, QuadratureContext, SolverSettings, Vector3};
use crate::core::wake::MirrorPlane;

/// A non-recoverable failure while filling the influence system
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A panel evaluation produced NaN or infinity
    #[error("non-finite influence coefficient at row {row}, column {col}")]
    NonFiniteCoefficient {
        /// collocation row
        row: usize,
        /// influencing panel column
        col: usize,
    },
    /// A right-hand-side entry produced NaN or infinity
    #[error("non-finite right-hand side at row {row}")]
    NonFiniteRhs {
        /// collocation row
        row: usize,
    },
}

/// The dense influence system for one mesh and wake layout
#[derive(Debug, Clone)]
pub struct InfluenceSystem {
    /// aerodynamic influence coefficients, one row per panel
    pub matrix: Array2<f64>,
    /// number of panels
    pub num_panels: usize,
    /// quadrature counters accumulated during assembly
    pub context: QuadratureContext,
}

/// True when the row at panel `i` uses the Dirichlet condition
fn dirichlet_row(pos: SurfacePosition) -> bool {
    !matches!(pos, SurfacePosition::Mid)
}

fn map_rows<U, F>(n: usize, multithread: bool, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    if multithread {
        parallel_map_indexed(n, f)
    } else {
        (0..n).map(f).collect()
    }
}

// ----------------------------------------------------------------------
// influence matrix
// ----------------------------------------------------------------------

/// Assemble the body influence matrix and fold in the wake columns
pub fn build_influence_system(
    mesh: &TriMesh,
    settings: &SolverSettings,
) -> Result<InfluenceSystem, AssemblyError> {
    let n = mesh.panel_count();
    log::debug!("assembling {} x {} influence matrix", n, n);

    let mut system = build_body_influence(mesh, settings)?;
    add_wake_influence(&mut system, mesh, settings)?;
    Ok(system)
}

/// Influence of the body doublet distribution, one row per collocation point
pub fn build_body_influence(
    mesh: &TriMesh,
    settings: &SolverSettings,
) -> Result<InfluenceSystem, AssemblyError> {
    let n = mesh.panel_count();
    let mirror = MirrorPlane::from_settings(settings);

    let rows = map_rows(n, settings.multithread, |i| {
        let mut ctx = QuadratureContext::new();
        let pi = &mesh.panels[i];
        let cog = pi.cog;
        let ni = pi.normal;
        let dirichlet = dirichlet_row(pi.pos);

        let mut row = vec![0.0; n];
        for (k, pk) in mesh.panels.iter().enumerate() {
            if pk.null_triangle {
                continue;
            }

            let mut aik = if dirichlet {
                let phi =
                    pk.doublet_basis_potential(&cog, i == k, settings.kernel, true, &mut ctx);
                phi[0] + phi[1] + phi[2]
            } else {
                let vb = pk.doublet_basis_velocity(&cog, settings.kernel, true, &mut ctx);
                (vb[0] + vb[1] + vb[2]).dot(&ni)
            };

            if let Some(plane) = mirror {
                let (cg, coef) = plane.image(&cog);
                if dirichlet {
                    let phi =
                        pk.doublet_basis_potential(&cg, false, settings.kernel, true, &mut ctx);
                    aik += (phi[0] + phi[1] + phi[2]) * coef;
                } else {
                    let vb = pk.doublet_basis_velocity(&cg, settings.kernel, true, &mut ctx);
                    let mut vg = vb[0] + vb[1] + vb[2];
                    vg.z = -vg.z;
                    aik += vg.dot(&ni) * coef;
                }
            }

            if !aik.is_finite() {
                return Err(AssemblyError::NonFiniteCoefficient { row: i, col: k });
            }
            row[k] = aik;
        }
        Ok((row, ctx))
    });

    let mut matrix = Array2::zeros((n, n));
    let mut context = QuadratureContext::new();
    for (i, entry) in rows.into_iter().enumerate() {
        let (row, ctx) = entry?;
        context.merge(&ctx);
        for (k, v) in row.into_iter().enumerate() {
            matrix[[i, k]] = v;
        }
    }

    Ok(InfluenceSystem {
        matrix,
        num_panels: n,
        context,
    })
}

/// Fold the flat wake sheet into the trailing-edge columns
///
/// Each wake column inherits the doublet strength of the panels that shed
/// it: the mid panel strength on a thin wing, the top-minus-bottom jump on a
/// thick one. Walking each column and summing its influence into the
/// corresponding body columns enforces the Kutta condition without extra
/// unknowns.
pub fn add_wake_influence(
    system: &mut InfluenceSystem,
    mesh: &TriMesh,
    settings: &SolverSettings,
) -> Result<(), AssemblyError> {
    if mesh.wake_panel_count() == 0 {
        return Ok(());
    }
    let n = mesh.panel_count();
    let mirror = MirrorPlane::from_settings(settings);

    let rows = map_rows(n, settings.multithread, |i| {
        let mut ctx = QuadratureContext::new();
        let pi = &mesh.panels[i];
        let cog = pi.cog;
        let ni = pi.normal;
        let dirichlet = dirichlet_row(pi.pos);

        let mut row = vec![0.0; n];
        for (k3, p3) in mesh.panels.iter().enumerate() {
            if !p3.trailing
                || !matches!(p3.pos, SurfacePosition::Bottom | SurfacePosition::Mid)
            {
                continue;
            }

            let mut value = 0.0;
            let mut next = p3.wake;
            while let Some(iw) = next {
                let wp = &mesh.wake_panels[iw];
                value += if dirichlet {
                    let phi = wp.doublet_basis_potential(&cog, false, settings.kernel, false, &mut ctx);
                    phi[0] + phi[1] + phi[2]
                } else {
                    let vb = wp.doublet_basis_velocity(&cog, settings.kernel, false, &mut ctx);
                    (vb[0] + vb[1] + vb[2]).dot(&ni)
                };

                if let Some(plane) = mirror {
                    let (cg, coef) = plane.image(&cog);
                    if dirichlet {
                        let phi =
                            wp.doublet_basis_potential(&cg, false, settings.kernel, false, &mut ctx);
                        value += (phi[0] + phi[1] + phi[2]) * coef;
                    } else {
                        let vb = wp.doublet_basis_velocity(&cg, settings.kernel, false, &mut ctx);
                        let mut vg = vb[0] + vb[1] + vb[2];
                        vg.z = -vg.z;
                        value += vg.dot(&ni) * coef;
                    }
                }
                next = wp.down;
            }

            if !value.is_finite() {
                return Err(AssemblyError::NonFiniteCoefficient { row: i, col: k3 });
            }

            match p3.pos {
                SurfacePosition::Mid => row[k3] += value,
                SurfacePosition::Bottom => {
                    row[k3] -= value;
                    if let Some(iu) = p3.opposite {
                        row[iu] += value;
                    }
                }
                _ => {}
            }
        }
        Ok((row, ctx))
    });

    for (i, entry) in rows.into_iter().enumerate() {
        let (row, ctx) = entry?;
        system.context.merge(&ctx);
        for (k, v) in row.into_iter().enumerate() {
            system.matrix[[i, k]] += v;
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// sources and right-hand sides
// ----------------------------------------------------------------------

/// Source strength per panel for the given onset velocities
///
/// Thin mid panels carry no source. The 1/4π factor cancels the kernel
/// scaling so the solved strengths stay in physical units.
pub fn source_strengths(mesh: &TriMesh, onset: &[Vector3]) -> Vec<f64> {
    mesh.panels
        .iter()
        .zip(onset)
        .map(|(p, v)| {
            if p.is_thin() || p.null_triangle {
                0.0
            } else {
                -p.normal.dot(v) / PI4
            }
        })
        .collect()
}

/// Source strengths for a uniform onset velocity
pub fn uniform_source_strengths(mesh: &TriMesh, v: &Vector3) -> Vec<f64> {
    let onset = vec![*v; mesh.panel_count()];
    source_strengths(mesh, &onset)
}

/// Assemble the right-hand side for the given onset velocity field
///
/// `onset[i]` is the total onset velocity at the centroid of panel `i` and
/// `sources` the matching source strengths. Neumann rows cancel the normal
/// onset flow and the source wash; Dirichlet rows cancel the internal source
/// potential.
pub fn build_rhs(
    mesh: &TriMesh,
    settings: &SolverSettings,
    onset: &[Vector3],
    sources: &[f64],
) -> Result<(Array1<f64>, QuadratureContext), AssemblyError> {
    let n = mesh.panel_count();
    let mirror = MirrorPlane::from_settings(settings);

    let entries = map_rows(n, settings.multithread, |i| {
        let mut ctx = QuadratureContext::new();
        let pi = &mesh.panels[i];
        let cog = pi.cog;
        let ni = pi.normal;
        let dirichlet = dirichlet_row(pi.pos);

        let mut rhs = if dirichlet { 0.0 } else { -onset[i].dot(&ni) };
        for (k, pk) in mesh.panels.iter().enumerate() {
            if pk.is_thin() || pk.null_triangle || sources[k] == 0.0 {
                continue;
            }
            if dirichlet {
                let phi = pk.source_potential(&cog, settings.kernel, &mut ctx);
                rhs -= phi * sources[k];
            } else {
                let vs = pk.source_velocity(&cog, i == k, settings.kernel, &mut ctx);
                rhs -= vs.dot(&ni) * sources[k];
            }

            if let Some(plane) = mirror {
                let (cg, coef) = plane.image(&cog);
                if dirichlet {
                    let phi = pk.source_potential(&cg, settings.kernel, &mut ctx);
                    rhs -= phi * sources[k] * coef;
                } else {
                    let mut vg = pk.source_velocity(&cg, false, settings.kernel, &mut ctx);
                    vg.z = -vg.z;
                    rhs -= vg.dot(&ni) * sources[k] * coef;
                }
            }
        }

        if rhs.is_finite() {
            Ok((rhs, ctx))
        } else {
            Err(AssemblyError::NonFiniteRhs { row: i })
        }
    });

    let mut rhs = Array1::zeros(n);
    let mut context = QuadratureContext::new();
    for (i, entry) in entries.into_iter().enumerate() {
        let (v, ctx) = entry?;
        context.merge(&ctx);
        rhs[i] = v;
    }
    Ok((rhs, context))
}

/// Combine the three unit-onset solutions for a flow condition
///
/// The unit solutions are solved for unit onset flow along each body axis;
/// linearity lets a whole sweep reuse one factorization.
pub fn combine_unit_strengths(
    condition: &FlowCondition,
    along_x: &[f64],
    along_y: &[f64],
    along_z: &[f64],
) -> Vec<f64> {
    let dir = condition.freestream().normalized();
    along_x
        .iter()
        .zip(along_y)
        .zip(along_z)
        .map(|((u, v), w)| dir.x * u + dir.y * v + dir.z * w)
        .collect()
}
