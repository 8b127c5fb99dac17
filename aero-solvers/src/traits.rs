//! Scalar trait for dense solver routines
//!
//! Influence matrices produced by a potential-flow panel method are
//! real-valued, so the solvers in this crate are generic over a real
//! floating-point scalar rather than a complex field.

use num_traits::{Float, FromPrimitive, NumAssign};
use std::fmt::Debug;

/// Trait for real scalar types usable in the dense solvers.
///
/// Implemented for `f64` (default) and `f32` (memory-constrained runs).
pub trait RealField:
    Float + NumAssign + FromPrimitive + Send + Sync + Debug + 'static
{
    /// Magnitude used for pivot selection and singularity checks
    #[inline]
    fn modulus(&self) -> Self {
        self.abs()
    }
}

impl RealField for f64 {}
impl RealField for f32 {}
