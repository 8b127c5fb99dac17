//! # 3D potential-flow triangular-panel solver
//!
//! Source/doublet panel method over flat triangular panels with closed-form
//! singular quadrature, a dense influence-matrix solve, and an iterative
//! vortex-particle ("vorton") wake model.
//!
//! ## Features
//!
//! - Closed-form evaluation of the 1/R, 1/R³ and 1/R⁵ kernel integrals over
//!   flat triangles, including the singular self-influence case
//! - Dense collocation assembly with an LU solve reused across right-hand
//!   sides (flow-condition sweeps)
//! - Vortex-particle wake iteration driven by the trailing-edge doublet jump
//! - Parallel row assembly with Rayon (behind the `native` feature)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // Scientific code often has many parameters

pub mod core;

// Re-exports
pub use core::solver::{CancelToken, FlowTask, PanelSolver, SolverError};
pub use core::types::{FlowCondition, OperatingPoint, SolverSettings, Vector3};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
