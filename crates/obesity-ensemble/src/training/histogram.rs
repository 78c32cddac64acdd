//! Per-node histograms of row statistics.
//!
//! A histogram holds, for every feature and bin, the sum of a fixed-width
//! statistics vector over the node's rows. Boosting uses
//! `[gradient, hessian, count]`; the random forest uses one weighted count
//! per class followed by the row count. The split criterion decides how the
//! slots are read.
//!
//! Layout is feature-major with a fixed stride of `n_bins * width` per
//! feature, so the buffer splits into independent per-feature chunks for
//! parallel building.

use rayon::prelude::*;

use super::binning::{BinnedMatrix, MAX_BINS};
use crate::utils::Parallelism;

/// Flat per-row statistics: `width` consecutive `f64` values per row.
#[derive(Debug, Clone, Copy)]
pub struct RowStats<'a> {
    values: &'a [f64],
    width: usize,
}

impl<'a> RowStats<'a> {
    /// Wrap `values`, which holds `width` slots per row.
    pub fn new(values: &'a [f64], width: usize) -> Self {
        debug_assert!(width > 0 && values.len() % width == 0);
        Self { values, width }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn row(&self, row: u32) -> &'a [f64] {
        let start = row as usize * self.width;
        &self.values[start..start + self.width]
    }

    /// Sum of the statistics over `rows`.
    pub fn sum(&self, rows: &[u32]) -> Vec<f64> {
        let mut total = vec![0.0; self.width];
        for &row in rows {
            for (acc, &v) in total.iter_mut().zip(self.row(row)) {
                *acc += v;
            }
        }
        total
    }
}

// =============================================================================
// Histogram
// =============================================================================

/// Node histogram over a fixed list of features.
///
/// Features are addressed by their position in that list.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    width: usize,
    n_bins: usize,
    features: Vec<usize>,
    data: Vec<f64>,
}

impl Histogram {
    /// Zeroed histogram for `features`, with room for `n_bins` bins each.
    pub fn zeros(features: Vec<usize>, n_bins: usize, width: usize) -> Self {
        debug_assert!(n_bins <= MAX_BINS);
        Self {
            width,
            n_bins,
            data: vec![0.0; features.len() * n_bins * width],
            features,
        }
    }

    #[inline]
    fn stride(&self) -> usize {
        self.n_bins * self.width
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Features covered, in slot order.
    #[inline]
    pub fn features(&self) -> &[usize] {
        &self.features
    }

    /// Statistics of one bin of the feature at position `slot`.
    #[inline]
    pub fn bin(&self, slot: usize, bin: usize) -> &[f64] {
        let start = slot * self.stride() + bin * self.width;
        &self.data[start..start + self.width]
    }

    /// Accumulate `rows` into every covered feature.
    pub fn build(
        &mut self,
        binned: &BinnedMatrix,
        stats: RowStats<'_>,
        rows: &[u32],
        parallelism: Parallelism,
    ) {
        debug_assert_eq!(stats.width(), self.width);
        let width = self.width;
        let stride = self.stride();
        let features = &self.features;

        let fill = |(slot, chunk): (usize, &mut [f64])| {
            let column = binned.column(features[slot]);
            for &row in rows {
                let offset = column[row as usize] as usize * width;
                for (acc, &v) in chunk[offset..offset + width].iter_mut().zip(stats.row(row)) {
                    *acc += v;
                }
            }
        };

        if parallelism.is_parallel() {
            self.data.par_chunks_mut(stride).enumerate().for_each(fill);
        } else {
            self.data.chunks_mut(stride).enumerate().for_each(fill);
        }
    }

    /// Sibling histogram: `parent - child`, over the same features.
    pub fn subtract(parent: &Histogram, child: &Histogram) -> Histogram {
        debug_assert_eq!(parent.features, child.features);
        Histogram {
            width: parent.width,
            n_bins: parent.n_bins,
            features: parent.features.clone(),
            data: parent.data.iter().zip(&child.data).map(|(p, c)| p - c).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn setup() -> (BinnedMatrix, Vec<f64>) {
        let x = array![[0.0f32, 1.0], [1.0, 1.0], [0.0, 2.0], [1.0, 2.0]];
        let binned = BinnedMatrix::from_features(x.view(), 256, Parallelism::Sequential);
        // [grad, count] per row
        let stats = vec![1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0, 1.0];
        (binned, stats)
    }

    #[test]
    fn build_sums_rows_per_bin() {
        let (binned, stats) = setup();
        let mut hist = Histogram::zeros(vec![0, 1], 2, 2);
        hist.build(&binned, RowStats::new(&stats, 2), &[0, 1, 2, 3], Parallelism::Sequential);

        assert_eq!(hist.bin(0, 0), &[4.0, 2.0]);
        assert_eq!(hist.bin(0, 1), &[6.0, 2.0]);
        assert_eq!(hist.bin(1, 0), &[3.0, 2.0]);
        assert_eq!(hist.bin(1, 1), &[7.0, 2.0]);
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let (binned, stats) = setup();
        let stats = RowStats::new(&stats, 2);
        let mut seq = Histogram::zeros(vec![0, 1], 2, 2);
        let mut par = Histogram::zeros(vec![0, 1], 2, 2);
        seq.build(&binned, stats, &[0, 2, 3], Parallelism::Sequential);
        par.build(&binned, stats, &[0, 2, 3], Parallelism::Parallel);
        assert_eq!(seq, par);
    }

    #[test]
    fn slots_follow_feature_list() {
        let (binned, stats) = setup();
        let mut hist = Histogram::zeros(vec![1], 2, 2);
        hist.build(&binned, RowStats::new(&stats, 2), &[0, 1], Parallelism::Sequential);
        assert_eq!(hist.features(), &[1]);
        assert_eq!(hist.bin(0, 0), &[3.0, 2.0]);
        assert_eq!(hist.bin(0, 1), &[0.0, 0.0]);
    }

    #[test]
    fn subtraction_gives_sibling() {
        let (binned, stats) = setup();
        let stats = RowStats::new(&stats, 2);
        let mut parent = Histogram::zeros(vec![0, 1], 2, 2);
        let mut left = Histogram::zeros(vec![0, 1], 2, 2);
        let mut right = Histogram::zeros(vec![0, 1], 2, 2);
        parent.build(&binned, stats, &[0, 1, 2, 3], Parallelism::Sequential);
        left.build(&binned, stats, &[0, 2], Parallelism::Sequential);
        right.build(&binned, stats, &[1, 3], Parallelism::Sequential);

        assert_eq!(Histogram::subtract(&parent, &left), right);
        assert_eq!(stats.sum(&[0, 3]), vec![5.0, 2.0]);
    }
}
