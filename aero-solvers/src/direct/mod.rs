//! Direct solvers for linear systems
//!
//! This module provides direct (non-iterative) solvers:
//! - [`lu_factorize`]: LU decomposition with partial pivoting, reusable
//!   across right-hand sides
//! - [`lu_solve`]: one-shot factorize-and-solve convenience

mod lu;

pub use lu::{lu_factorize, lu_solve, LuError, LuFactorization};
