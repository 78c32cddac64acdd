//! Common utilities used across the crate.
//!
//! Parallelism configuration and small numeric helpers shared by the
//! training and inference code.

use rayon::prelude::*;

// =============================================================================
// Parallelism
// =============================================================================

/// Whether parallel execution is allowed.
///
/// This is a simple flag passed through training and prediction components.
/// When `Parallel`, components may use `rayon` parallel iterators; when
/// `Sequential`, they must iterate on the calling thread.
///
/// The thread pool itself is set up once at the pipeline level via
/// [`run_with_threads`]. Components never manage pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over `iter`, in parallel when allowed.
    ///
    /// Output order always matches input order, so results do not depend on
    /// the number of threads.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use the global pool, all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// # Errors
///
/// Returns the rayon error if a dedicated pool cannot be created.
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, rayon::ThreadPoolBuildError> {
    match (n_threads, Parallelism::from_threads(n_threads)) {
        (_, Parallelism::Sequential) => Ok(f(Parallelism::Sequential)),
        (0, Parallelism::Parallel) => Ok(f(Parallelism::Parallel)),
        (n, Parallelism::Parallel) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}

// =============================================================================
// Numeric Helpers
// =============================================================================

/// Index of the largest value. Ties resolve to the lowest index.
///
/// Returns 0 for an empty slice. NaN values never win.
#[inline]
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (idx, &value) in values.iter().enumerate() {
        if value > best_value {
            best = idx;
            best_value = value;
        }
    }
    best
}
