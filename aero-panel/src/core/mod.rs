//! Triangular-panel potential-flow solver core
//!
//! ## Architecture
//!
//! - `types`: vectors, flow conditions, settings, result records
//! - `constants`: numerical guard thresholds and geometry tolerances
//! - `integration`: closed-form singular quadrature (polar-table and
//!   explicit boundary-integral evaluations) plus Gauss rules on triangles
//! - `mesh`: panels, the shared-node triangle mesh, wake panels, generators
//! - `wake`: vortex particles, negating vortices, wake-row bookkeeping
//! - `assembly`: dense influence matrix, wake block, right-hand sides
//! - `postprocess`: surface velocities, pressure coefficients, forces
//! - `solver`: per-condition pipeline, sweep orchestration, cancellation
//! - `parallel`: portable parallel iteration (native rayon or sequential)

pub mod assembly;
pub mod constants;
pub mod integration;
pub mod mesh;
pub mod parallel;
pub mod postprocess;
pub mod solver;
pub mod types;
pub mod wake;

// Re-exports for convenience
pub use solver::{CancelToken, FlowTask, PanelSolver, SolverError};
pub use types::*;
