//! Quantile binning of feature columns.
//!
//! Each feature is cut into at most `max_bins` (≤ 256) bins. Bin upper
//! bounds are actual feature values, so a split "bin ≤ b" is exactly the raw
//! rule "value ≤ upper_bound(b)" and trained trees can store raw thresholds.

use ndarray::ArrayView2;

use crate::utils::Parallelism;

/// Largest supported bin count (bins are stored as `u8`).
pub const MAX_BINS: usize = 256;

// =============================================================================
// BinMapper
// =============================================================================

/// Maps raw values of one feature to bin indices.
#[derive(Debug, Clone, PartialEq)]
pub struct BinMapper {
    /// Inclusive upper bound of each bin, strictly increasing.
    upper_bounds: Vec<f32>,
}

impl BinMapper {
    /// Fit bin bounds on the values of one feature.
    ///
    /// With at most `max_bins` distinct values every value gets its own bin.
    /// Otherwise bounds are taken at evenly spaced quantiles. NaN values are
    /// ignored.
    pub fn fit(values: &[f32], max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(1, MAX_BINS);
        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_unstable_by(f32::total_cmp);

        let mut distinct = sorted.clone();
        distinct.dedup();

        let upper_bounds = if distinct.len() <= max_bins {
            distinct
        } else {
            let n = sorted.len();
            let mut bounds: Vec<f32> = (1..=max_bins)
                .map(|k| sorted[(k * n).div_ceil(max_bins) - 1])
                .collect();
            bounds.dedup();
            bounds
        };

        Self { upper_bounds }
    }

    /// Number of bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.upper_bounds.len().max(1)
    }

    /// Bin of a value: the first bin whose upper bound is ≥ `value`.
    ///
    /// Values above the last bound (and NaN) fall in the last bin.
    #[inline]
    pub fn bin_of(&self, value: f32) -> u8 {
        let idx = self.upper_bounds.partition_point(|&ub| ub < value);
        idx.min(self.n_bins() - 1) as u8
    }

    /// Raw threshold equivalent to "bin ≤ `bin`".
    #[inline]
    pub fn threshold(&self, bin: usize) -> f32 {
        self.upper_bounds.get(bin).copied().unwrap_or(f32::INFINITY)
    }
}

// =============================================================================
// BinnedMatrix
// =============================================================================

/// Feature-major matrix of bin indices.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    n_rows: usize,
    /// `bins[f * n_rows + row]`
    bins: Vec<u8>,
    mappers: Vec<BinMapper>,
}

impl BinnedMatrix {
    /// Bin a `[n_rows, n_features]` matrix, one mapper per column.
    pub fn from_features(features: ArrayView2<'_, f32>, max_bins: usize, parallelism: Parallelism) -> Self {
        let n_rows = features.nrows();
        let columns: Vec<(BinMapper, Vec<u8>)> =
            parallelism.maybe_par_map(0..features.ncols(), |f| {
                let column: Vec<f32> = features.column(f).to_vec();
                let mapper = BinMapper::fit(&column, max_bins);
                let bins = column.iter().map(|&v| mapper.bin_of(v)).collect();
                (mapper, bins)
            });

        let mut bins = Vec::with_capacity(n_rows * columns.len());
        let mut mappers = Vec::with_capacity(columns.len());
        for (mapper, column_bins) in columns {
            bins.extend(column_bins);
            mappers.push(mapper);
        }
        Self { n_rows, bins, mappers }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.mappers.len()
    }

    /// Bin indices of one feature, indexed by row.
    #[inline]
    pub fn column(&self, feature: usize) -> &[u8] {
        &self.bins[feature * self.n_rows..(feature + 1) * self.n_rows]
    }

    #[inline]
    pub fn mapper(&self, feature: usize) -> &BinMapper {
        &self.mappers[feature]
    }

    #[inline]
    pub fn n_bins(&self, feature: usize) -> usize {
        self.mappers[feature].n_bins()
    }
}
