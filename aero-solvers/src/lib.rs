//! Dense direct solvers for panel-method influence systems
//!
//! This crate provides the linear-algebra layer of the panel solver:
//! LU factorization with partial pivoting over dense real matrices,
//! with the factorization reusable across many right-hand sides.
//!
//! # Example
//!
//! ```ignore
//! use aero_solvers::direct::lu_factorize;
//!
//! let factorization = lu_factorize(&influence_matrix)?;
//! let mu_u = factorization.solve(&rhs_u)?;
//! let mu_w = factorization.solve(&rhs_w)?;
//! ```

pub mod direct;
pub mod traits;

// Re-export main types
pub use direct::{lu_factorize, lu_solve, LuError, LuFactorization};
pub use traits::RealField;
