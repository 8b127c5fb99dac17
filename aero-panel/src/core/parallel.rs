//! Portable parallel iteration abstractions
//!
//! This module provides parallel iteration that works across build targets:
//! - `native` feature: uses rayon work-stealing threads
//! - Otherwise: falls back to sequential iteration
//!
//! ## Usage
//!
//! ```ignore
//! use crate::core::parallel::*;
//!
//! // Parallel map over indices
//! let results: Vec<i32> = parallel_map_indexed(100, |i| i * 2);
//! ```

/// Parallel map over a range of indices
///
/// When the `native` feature is enabled, uses rayon's parallel iterator.
/// Otherwise, falls back to sequential iteration.
#[cfg(feature = "native")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "native"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    F: Fn(usize) -> U,
{
    (0..count).map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_map_indexed() {
        let result = parallel_map_indexed(5, |i| i * 2);
        assert_eq!(result, vec![0, 2, 4, 6, 8]);
    }
}
