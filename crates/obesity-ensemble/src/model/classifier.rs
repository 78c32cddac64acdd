//! The common classifier interface.

use ndarray::{Array2, ArrayView2};

use crate::utils::{Parallelism, argmax};

/// A fitted probabilistic classifier over `f32` feature rows.
pub trait Classifier {
    fn n_classes(&self) -> usize;

    fn n_features(&self) -> usize;

    /// Class probabilities, shape `[n_rows, n_classes]`; each row sums to 1.
    ///
    /// Rows are predicted in parallel inside the current rayon pool.
    ///
    /// # Panics
    ///
    /// If `features` does not have [`n_features`](Self::n_features) columns.
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Array2<f32>;

    /// Most probable class per row. Ties resolve to the lowest class index.
    fn predict(&self, features: ArrayView2<'_, f32>) -> Vec<u32> {
        argmax_rows(&self.predict_proba(features))
    }
}

/// Row-wise argmax of a probability matrix.
pub fn argmax_rows(probabilities: &Array2<f32>) -> Vec<u32> {
    probabilities
        .rows()
        .into_iter()
        .map(|row| match row.as_slice() {
            Some(slice) => argmax(slice) as u32,
            None => argmax(&row.to_vec()) as u32,
        })
        .collect()
}

/// Fill a `[n_rows, n_classes]` matrix by calling `predict_row` per row.
pub(crate) fn predict_rows<F>(features: ArrayView2<'_, f32>, n_features: usize, n_classes: usize, predict_row: F) -> Array2<f32>
where
    F: Fn(&[f32], &mut [f32]) + Sync + Send,
{
    assert_eq!(
        features.ncols(),
        n_features,
        "model expects {n_features} features, got {}",
        features.ncols()
    );
    let n_rows = features.nrows();
    let parallelism = Parallelism::from_threads(0);

    let rows = parallelism.maybe_par_map(0..n_rows, |i| {
        let row = features.row(i);
        let mut out = vec![0.0f32; n_classes];
        match row.as_slice() {
            Some(slice) => predict_row(slice, &mut out),
            None => predict_row(&row.to_vec(), &mut out),
        }
        out
    });
    Array2::from_shape_fn((n_rows, n_classes), |(i, c)| rows[i][c])
}
