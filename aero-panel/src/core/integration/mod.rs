//! Singular quadrature over flat triangular panels
//!
//! Provides the analytic kernels used to evaluate the 1/R, 1/R³ and 1/R⁵
//! moment integrals of a flat triangle, plus Gauss rules used as a far-field
//! cross-check.
//!
//! ## Module Organization
//!
//! - [`carley`] - recursive line-integral tables, valid for any field point
//! - [`nintcheu`] - explicit per-edge formulae, off-plane field points only
//! - [`gauss`] - symmetric Gauss rules on the reference triangle

pub mod carley;
pub mod gauss;
pub mod nintcheu;

pub use carley::CarleyTriangle;
pub use gauss::GaussTriangle;
pub use nintcheu::NintcheuPanel;
