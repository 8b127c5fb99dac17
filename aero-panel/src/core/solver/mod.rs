//! Flow-condition sweep orchestration
//!
//! A sweep solves the same mesh at a list of flow conditions. Each point
//! runs the full pipeline: restore the baseline geometry, regenerate the
//! wake sheet along the wind, assemble and factor the influence system
//! once, back-substitute the three unit-onset right-hand sides, then
//! optionally relax a vortex-particle wake before the loads are
//! integrated.
//!
//! - [`PanelSolver`] - builder entry point, batches points over workers
//! - [`FlowTask`] - one worker's mesh copy and per-point pipeline
//! - [`CancelToken`] - cooperative cancellation between step boundaries
//! - [`SolverError`] - the failure taxonomy

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use ndarray::Array2;
use thiserror::Error;

use aero_solvers::{lu_factorize, LuError};

use crate::core::assembly::{
    build_influence_system, build_rhs, combine_unit_strengths, source_strengths, AssemblyError,
};
use crate::core::mesh::trimesh::TriMesh;
use crate::core::postprocess::{
    body_force_and_moment, field_velocity, local_velocities, pressure_coefficients, span_loading,
    surface_velocities, trefftz_drag, vorton_drag,
};
use crate::core::types::{
    FlowCondition, OperatingPoint, QuadratureContext, SolverSettings, Vector3,
};
use crate::core::wake::{MirrorPlane, VortonWake};

/// Why a sweep, or one of its points, could not be solved
#[derive(Debug, Error)]
pub enum SolverError {
    /// The mesh has no usable panels
    #[error("mesh has no usable panels")]
    InvalidMesh,
    /// The factorization failed; the influence matrix is singular
    #[error("singular influence matrix: {0}")]
    SingularMatrix(#[from] LuError),
    /// The freestream is too slow to define a solution; the point is skipped
    #[error("freestream speed below the solvable minimum")]
    ZeroFreestream,
    /// The sweep was cancelled through its token
    #[error("sweep cancelled")]
    Cancelled,
    /// A settings value is out of range
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    /// Matrix or right-hand-side assembly produced a non-finite value
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Shared cancellation flag, checked between pipeline steps
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; running steps finish, new ones are skipped
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ----------------------------------------------------------------------
// per-point pipeline
// ----------------------------------------------------------------------

/// One worker's mesh copy and the per-point solve pipeline
pub struct FlowTask {
    mesh: TriMesh,
    settings: SolverSettings,
    cancel: CancelToken,
}

impl FlowTask {
    /// Take ownership of a mesh copy and remember its baseline geometry
    pub fn new(mut mesh: TriMesh, settings: SolverSettings, cancel: CancelToken) -> Self {
        mesh.connect_panels();
        mesh.save_base_geometry();
        FlowTask {
            mesh,
            settings,
            cancel,
        }
    }

    /// Streamwise extent of the body, used to scale wake lengths
    fn reference_chord(&self) -> f64 {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for p in &self.mesh.panels {
            for s in &p.s {
                lo = lo.min(s.x);
                hi = hi.max(s.x);
            }
        }
        if hi > lo {
            hi - lo
        } else {
            1.0
        }
    }

    /// Solve one flow condition end to end
    pub fn solve_point(&mut self, condition: &FlowCondition) -> Result<OperatingPoint, SolverError> {
        if self.cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }
        if condition.is_zero_freestream() {
            return Err(SolverError::ZeroFreestream);
        }

        let settings = self.settings.clone();
        self.mesh.restore_base_geometry();

        // with a mirror plane the model pitches instead of the stream, so
        // the image stays consistent with the ground
        let cond_eff = if settings.ground_height.is_some() {
            self.mesh.rotate(
                &Vector3::ZERO,
                &Vector3::new(0.0, 1.0, 0.0),
                -condition.alpha_deg,
            );
            FlowCondition::new(condition.speed, 0.0, condition.beta_deg)
        } else {
            *condition
        };

        let v_inf = cond_eff.freestream();
        let wind = v_inf.normalized();
        let chord = self.reference_chord();
        let wake_length = settings.wake_length_factor * chord;
        self.mesh.make_wake_panels(
            &wind,
            settings.wake_panel_count,
            settings.wake_progression,
            wake_length,
            false,
        );
        self.mesh.connect_wake_panels();

        let mesh = &self.mesh;
        let n = mesh.panel_count();
        log::info!(
            "solving Q={} alpha={} beta={} over {} panels, {} wake panels",
            condition.speed,
            condition.alpha_deg,
            condition.beta_deg,
            n,
            mesh.wake_panel_count()
        );

        let mut system = build_influence_system(mesh, &settings)?;
        let lu = lu_factorize(&system.matrix)?;

        // three unit-onset solutions; linearity recombines them for the
        // actual wind direction
        let axes = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        let mut unit_rhs = Array2::zeros((n, 3));
        for (a, axis) in axes.iter().enumerate() {
            let onset = vec![*axis; n];
            let sigma = source_strengths(mesh, &onset);
            let (rhs, ctx) = build_rhs(mesh, &settings, &onset, &sigma)?;
            system.context.merge(&ctx);
            for i in 0..n {
                unit_rhs[[i, a]] = rhs[i];
            }
        }
        let unit_mu = lu.solve_many(&unit_rhs)?;
        let ux = unit_mu.column(0).to_vec();
        let uy = unit_mu.column(1).to_vec();
        let uz = unit_mu.column(2).to_vec();

        let mut mu = combine_unit_strengths(&cond_eff, &ux, &uy, &uz);
        for m in mu.iter_mut() {
            *m *= cond_eff.speed;
        }

        let mut onset = vec![v_inf; n];
        let mut sigma = source_strengths(mesh, &onset);

        // vortex-particle wake relaxation: each pass re-solves against the
        // wake-induced onset flow, advects the particles, and sheds a fresh
        // row at the trailing edge
        let mut wake = VortonWake::new();
        if settings.vorton_wake {
            let mirror = MirrorPlane::from_settings(&settings);
            let dt = settings.vorton_time_step;
            let dl = dt * cond_eff.speed;
            let max_length = wake_length.max(chord);

            for pass in 0..settings.vpw_iterations {
                if self.cancel.is_cancelled() {
                    // keep the last completed pass
                    log::info!("wake relaxation cancelled after {} passes", pass);
                    break;
                }

                if wake.active_count() > 0 {
                    for (i, p) in mesh.panels.iter().enumerate() {
                        onset[i] = v_inf
                            + wake.induced_velocity(
                                &p.cog,
                                settings.vorton_core_radius,
                                settings.vorton_core_radius,
                                mirror,
                            );
                    }
                    sigma = source_strengths(mesh, &onset);
                    let (rhs, ctx) = build_rhs(mesh, &settings, &onset, &sigma)?;
                    system.context.merge(&ctx);
                    mu = lu.solve(&rhs)?.to_vec();
                }

                let ctx_cell = RefCell::new(QuadratureContext::new());
                let rows = wake.advected(
                    |p| {
                        field_velocity(
                            mesh,
                            &mu,
                            &sigma,
                            &settings,
                            Some(&wake),
                            p,
                            false,
                            &mut ctx_cell.borrow_mut(),
                        )
                    },
                    &v_inf,
                    dt,
                    max_length,
                );
                wake.set_rows(rows);
                wake.shed_row(mesh, &mu, dl);
                system.context.merge(&ctx_cell.into_inner());
            }
            log::debug!(
                "wake holds {} particles in {} rows",
                wake.active_count(),
                wake.row_count()
            );
        }

        let local = local_velocities(mesh, &mu);
        let velocities = surface_velocities(mesh, &v_inf, &local);
        let cp = pressure_coefficients(mesh, &v_inf, &local);
        let (force, moment) =
            body_force_and_moment(mesh, &cp, &cond_eff, settings.density, &Vector3::ZERO);
        let mut span = span_loading(mesh, &mu, &cond_eff);

        let (induced_drag, angles) = if settings.vorton_wake && wake.row_count() > 0 {
            vorton_drag(&wake, &settings, &cond_eff)
        } else {
            let ctx_cell = RefCell::new(QuadratureContext::new());
            let out = trefftz_drag(mesh, &mu, &cond_eff, settings.density, |p| {
                field_velocity(
                    mesh,
                    &mu,
                    &sigma,
                    &settings,
                    None,
                    p,
                    true,
                    &mut ctx_cell.borrow_mut(),
                )
            });
            system.context.merge(&ctx_cell.into_inner());
            out
        };
        if angles.len() == span.induced_angle.len() {
            span.induced_angle = angles;
        }

        Ok(OperatingPoint {
            condition: *condition,
            doublets: mu,
            sources: sigma,
            velocities,
            cp,
            force,
            moment,
            induced_drag,
            span,
            degenerate_triangles: system.context.degenerate_triangles,
        })
    }
}

// ----------------------------------------------------------------------
// sweep orchestration
// ----------------------------------------------------------------------

/// Builder-style entry point for flow-condition sweeps
///
/// ```no_run
/// use aero_panel::core::mesh::generators::flat_plate_wing;
/// use aero_panel::{FlowCondition, PanelSolver, SolverSettings};
///
/// let mesh = flat_plate_wing(1.0, 6.0, 4, 12);
/// let points = PanelSolver::new(mesh)
///     .with_settings(SolverSettings::default())
///     .run(&[FlowCondition::new(20.0, 4.0, 0.0)])
///     .unwrap();
/// println!("lift {} N", points[0].force.z);
/// ```
pub struct PanelSolver {
    mesh: TriMesh,
    settings: SolverSettings,
    cancel: CancelToken,
}

impl PanelSolver {
    /// A solver over the given mesh with default settings
    pub fn new(mesh: TriMesh) -> Self {
        PanelSolver {
            mesh,
            settings: SolverSettings::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Replace the solver settings
    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use an externally held cancellation token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that cancels this solver's sweeps
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn validate(&self) -> Result<(), SolverError> {
        if self.mesh.panel_count() == 0 || self.mesh.panels.iter().all(|p| p.null_triangle) {
            return Err(SolverError::InvalidMesh);
        }
        if self.settings.density <= 0.0 {
            return Err(SolverError::InvalidSettings("density must be positive".into()));
        }
        if self.settings.wake_panel_count == 0 {
            return Err(SolverError::InvalidSettings(
                "wake_panel_count must be positive".into(),
            ));
        }
        if self.settings.wake_progression < 1.0 {
            return Err(SolverError::InvalidSettings(
                "wake_progression must be at least 1".into(),
            ));
        }
        if self.settings.vorton_wake && self.settings.vorton_time_step <= 0.0 {
            return Err(SolverError::InvalidSettings(
                "vorton_time_step must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Solve every condition and return the polar in input order
    ///
    /// Unsolvable points (zero freestream, singular matrix) are logged and
    /// skipped; cancellation stops the polar after the points already
    /// completed.
    pub fn run(&self, conditions: &[FlowCondition]) -> Result<Vec<OperatingPoint>, SolverError> {
        self.validate()?;
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let workers = if self.settings.multithread {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(conditions.len())
        } else {
            1
        };
        let chunk_len = conditions.len().div_ceil(workers);
        log::info!(
            "sweeping {} conditions over {} workers",
            conditions.len(),
            workers
        );

        let (tx, rx) = mpsc::channel::<(usize, Result<OperatingPoint, SolverError>)>();
        thread::scope(|scope| {
            for (w, chunk) in conditions.chunks(chunk_len).enumerate() {
                let tx = tx.clone();
                let mut task = FlowTask::new(
                    self.mesh.clone(),
                    self.settings.clone(),
                    self.cancel.clone(),
                );
                let base = w * chunk_len;
                scope.spawn(move || {
                    for (off, cond) in chunk.iter().enumerate() {
                        let result = task.solve_point(cond);
                        if tx.send((base + off, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);
        });

        // reorder by point index so the polar is deterministic regardless
        // of which worker finished first
        let mut results: Vec<(usize, Result<OperatingPoint, SolverError>)> = rx.iter().collect();
        results.sort_by_key(|(idx, _)| *idx);

        let mut points = Vec::new();
        for (idx, result) in results {
            match result {
                Ok(point) => points.push(point),
                Err(SolverError::ZeroFreestream) => {
                    log::warn!("skipping point {}: freestream too slow to solve", idx);
                }
                Err(SolverError::Cancelled) => {
                    log::info!("sweep cancelled at point {}", idx);
                    break;
                }
                Err(err) => {
                    log::error!("point {} failed: {}", idx, err);
                }
            }
        }
        Ok(points)
    }
}
