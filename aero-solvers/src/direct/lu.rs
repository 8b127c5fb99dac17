//! LU decomposition solver
//!
//! Provides LU factorization with partial pivoting for solving dense linear
//! systems. The panel solver factorizes its influence matrix once per flow
//! condition and back-substitutes for every right-hand side, so the
//! factorization is a first-class value rather than hidden inside a solve
//! call. Uses LAPACK when the `ndarray-linalg` feature is enabled, with a
//! pure-Rust fallback.

use crate::traits::RealField;
use ndarray::{Array1, Array2};
use thiserror::Error;

#[cfg(feature = "ndarray-linalg")]
use ndarray_linalg::Solve;

/// Errors that can occur during LU factorization
#[derive(Error, Debug)]
pub enum LuError {
    #[error("Matrix is singular or nearly singular")]
    SingularMatrix,
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// LU factorization result
///
/// Stores L and U factors along with pivot information
#[derive(Debug, Clone)]
pub struct LuFactorization<T: RealField> {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<T>,
    /// Pivot rows: at elimination step `k`, row `k` was swapped with row
    /// `pivots[k]`. Replaying the swaps in order applies the permutation.
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: RealField> LuFactorization<T> {
    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x = b.clone();

        // Replay the row swaps in elimination order; the pivot list is a
        // swap sequence, not a permutation vector
        for i in 0..self.n {
            let pivot = self.pivots[i];
            if pivot != i {
                x.swap(i, pivot);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                x[i] = x[i] - l_ij * x[j];
            }
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                x[i] = x[i] - u_ij * x[j];
            }
            let u_ii = self.lu[[i, i]];
            if u_ii.modulus() < T::from_f64(1e-30).unwrap_or_else(T::zero) {
                return Err(LuError::SingularMatrix);
            }
            x[i] = x[i] / u_ii;
        }

        Ok(x)
    }

    /// Solve AX = B for several right-hand sides stored as columns of B
    pub fn solve_many(&self, b: &Array2<T>) -> Result<Array2<T>, LuError> {
        if b.nrows() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.nrows(),
            });
        }
        let mut x = Array2::zeros((self.n, b.ncols()));
        for (j, col) in b.columns().into_iter().enumerate() {
            let xj = self.solve(&col.to_owned())?;
            x.column_mut(j).assign(&xj);
        }
        Ok(x)
    }
}

/// Compute LU factorization with partial pivoting (pure Rust implementation)
pub fn lu_factorize<T: RealField>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let mut lu = a.clone();
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Find pivot
        let mut max_val = lu[[k, k]].modulus();
        let mut max_row = k;

        for i in (k + 1)..n {
            let val = lu[[i, k]].modulus();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        // Check for singularity
        if max_val < T::from_f64(1e-30).unwrap_or_else(T::zero) {
            return Err(LuError::SingularMatrix);
        }

        // Swap rows if needed, recording the swap for the solve phase
        if max_row != k {
            for j in 0..n {
                let tmp = lu[[k, j]];
                lu[[k, j]] = lu[[max_row, j]];
                lu[[max_row, j]] = tmp;
            }
        }
        pivots[k] = max_row;

        // Compute multipliers and eliminate
        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let mult = lu[[i, k]] / pivot;
            lu[[i, k]] = mult; // Store multiplier in L part

            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<T: RealField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
    let factorization = lu_factorize(a)?;
    factorization.solve(b)
}

/// Solve Ax = b through LAPACK's dgesv
#[cfg(feature = "ndarray-linalg")]
pub fn lu_solve_lapack(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, LuError> {
    a.solve_into(b.clone()).map_err(|_| LuError::SingularMatrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_lu_solve_real() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0],];

        let b = array![1.0_f64, 2.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        // Verify: Ax = b
        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_identity() {
        let n = 5;
        let a = Array2::from_diag(&Array1::from_elem(n, 1.0_f64));
        let b = Array1::from_iter((1..=n).map(|i| i as f64));

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        for i in 0..n {
            assert_relative_eq!(x[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0],]; // Singular matrix

        let b = array![1.0_f64, 2.0];

        let result = lu_solve(&a, &b);
        assert!(result.is_err());
    }

    #[test]
    fn test_lu_factorize_and_solve() {
        let a = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0],];

        let factorization = lu_factorize(&a).expect("Factorization should succeed");

        // Solve multiple RHS with one factorization
        let b1 = array![1.0_f64, 2.0, 3.0];
        let x1 = factorization.solve(&b1).expect("Solve should succeed");

        let ax1 = a.dot(&x1);
        for i in 0..3 {
            assert_relative_eq!(ax1[i], b1[i], epsilon = 1e-10);
        }

        let b2 = array![4.0_f64, 5.0, 6.0];
        let x2 = factorization.solve(&b2).expect("Solve should succeed");

        let ax2 = a.dot(&x2);
        for i in 0..3 {
            assert_relative_eq!(ax2[i], b2[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_solve_many() {
        let a = array![[2.0_f64, 1.0], [1.0, 3.0],];
        let b = array![[1.0_f64, 0.0], [0.0, 1.0],];

        let f = lu_factorize(&a).expect("Factorization should succeed");
        let x = f.solve_many(&b).expect("Solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(ax[[i, j]], b[[i, j]], epsilon = 1e-10);
            }
        }
    }

    fn xorshift(seed: u64) -> impl FnMut() -> f64 {
        let mut state = seed | 1;
        move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 1000) as f64 / 1000.0 - 0.5
        }
    }

    fn random_diag_dominant(n: usize, seed: u64) -> Array2<f64> {
        let mut next = xorshift(seed);
        let mut a = Array2::zeros((n, n));
        for i in 0..n {
            let mut row_sum = 0.0;
            for j in 0..n {
                if i != j {
                    let v = next();
                    a[[i, j]] = v;
                    row_sum += v.abs();
                }
            }
            a[[i, i]] = row_sum + 1.0;
        }
        a
    }

    #[test]
    fn test_lu_pivot_cycle() {
        // the column ordering forces a chain of row swaps whose pivot rows
        // form a cycle; reading the pivot list as a final permutation
        // instead of a swap sequence scrambles the right-hand side here
        let a = array![[0.0_f64, 1.0, 4.0], [2.0, 0.5, 1.0], [1.0, 3.0, 0.0],];
        let b = array![1.0_f64, -2.0, 3.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");
        let ax = a.dot(&x);
        for i in 0..3 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_general_matrices_pivot_freely() {
        // no diagonal dominance: partial pivoting reorders rows at nearly
        // every step
        for seed in 1..6u64 {
            let n = 40;
            let mut next = xorshift(seed.wrapping_mul(0x9e3779b97f4a7c15));
            let a = Array2::from_shape_fn((n, n), |_| next());
            let b = Array1::from_iter((0..n).map(|i| (i as f64).cos()));

            let f = lu_factorize(&a).expect("Factorization should succeed");
            let x = f.solve(&b).expect("Solve should succeed");

            let ax = a.dot(&x);
            let mut residual = 0.0_f64;
            for i in 0..n {
                residual = residual.max((ax[i] - b[i]).abs());
            }
            assert!(residual < 1e-7, "seed={} residual={}", seed, residual);
        }
    }

    #[test]
    fn test_lu_large_systems() {
        for &n in &[50_usize, 200, 1000] {
            let a = random_diag_dominant(n, 0x9e3779b97f4a7c15);
            let b = Array1::from_iter((0..n).map(|i| (i as f64).sin()));

            let f = lu_factorize(&a).expect("Factorization should succeed");
            let x = f.solve(&b).expect("Solve should succeed");

            let ax = a.dot(&x);
            let mut residual = 0.0_f64;
            for i in 0..n {
                residual = residual.max((ax[i] - b[i]).abs());
            }
            assert!(residual < 1e-10, "n={} residual={}", n, residual);
        }
    }
}
