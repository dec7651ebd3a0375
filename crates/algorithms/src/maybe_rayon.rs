/// Compatibility layer for rayon/sequential execution.
///
/// With the `parallel` feature this re-exports rayon's prelude. Without it,
/// the same method names resolve to plain iterators, so per-band and per-row
/// loops read identically in both builds and produce identical results.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;

/// Evaluate `f(row, col)` over a `rows x cols` grid, one row per task.
///
/// Values come back in row-major order regardless of scheduling, which is
/// what keeps every detector bit-identical between runs.
pub fn collect_rows<T, F>(rows: usize, cols: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize, usize) -> T + Sync + Send,
{
    let f = &f;
    (0..rows)
        .into_par_iter()
        .flat_map(|row| (0..cols).map(|col| f(row, col)).collect::<Vec<T>>())
        .collect()
}
