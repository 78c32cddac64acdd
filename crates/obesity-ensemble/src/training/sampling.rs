//! Row and column sampling.
//!
//! All samplers draw from a caller-owned `Xoshiro256PlusPlus`, so a fixed
//! seed and call order reproduce the same samples.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Draw `k` distinct indices from `0..n`, returned sorted.
///
/// Partial Fisher-Yates: only the first `k` positions are shuffled.
pub fn sample_without_replacement(n: usize, k: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let k = k.min(n);
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool.sort_unstable();
    pool
}

// =============================================================================
// Row Sampling
// =============================================================================

/// Row subsampling for boosting rounds.
///
/// With `freq == 0` or `subsample >= 1` every round uses all rows. Otherwise
/// a fresh subset of `round(n * subsample)` rows is drawn every `freq`
/// rounds and reused in between.
#[derive(Debug, Clone)]
pub struct RowSampler {
    subsample: f32,
    freq: u32,
    current: Option<Vec<u32>>,
}

impl RowSampler {
    pub fn new(subsample: f32, freq: u32) -> Self {
        Self { subsample, freq, current: None }
    }

    /// Whether any rows are ever dropped.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.freq > 0 && self.subsample < 1.0
    }

    /// Rows to train on in `round`, sorted.
    pub fn sample(&mut self, round: u32, n_rows: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<u32> {
        if !self.is_enabled() {
            return (0..n_rows as u32).collect();
        }
        if self.current.is_none() || round % self.freq == 0 {
            let k = ((n_rows as f32 * self.subsample).round() as usize).clamp(1, n_rows.max(1));
            let rows = sample_without_replacement(n_rows, k, rng)
                .into_iter()
                .map(|r| r as u32)
                .collect();
            self.current = Some(rows);
        }
        self.current.clone().unwrap_or_default()
    }
}

/// Bootstrap sample: `n_rows` draws with replacement.
///
/// Returns the multiplicity of every row (0 for out-of-bag rows).
pub fn bootstrap(n_rows: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<u32> {
    let mut counts = vec![0u32; n_rows];
    for _ in 0..n_rows {
        counts[rng.gen_range(0..n_rows)] += 1;
    }
    counts
}

// =============================================================================
// Column Sampling
// =============================================================================

/// Feature sampling per tree and, optionally, per node.
///
/// `colsample_bytree` picks `max(1, floor(n * ratio))` features for each
/// tree. `per_node`, when set, draws that many features from the tree set
/// at every node.
#[derive(Debug, Clone)]
pub struct ColumnSampler {
    n_features: usize,
    colsample_bytree: f32,
    per_node: Option<usize>,
    tree_features: Vec<usize>,
}

impl ColumnSampler {
    pub fn new(n_features: usize, colsample_bytree: f32, per_node: Option<usize>) -> Self {
        Self {
            n_features,
            colsample_bytree,
            per_node,
            tree_features: (0..n_features).collect(),
        }
    }

    /// Whether features are drawn at every node.
    #[inline]
    pub fn samples_per_node(&self) -> bool {
        self.per_node.is_some_and(|k| k < self.tree_features.len())
    }

    /// Draw the feature set of a new tree.
    pub fn sample_for_tree(&mut self, rng: &mut Xoshiro256PlusPlus) {
        self.tree_features = if self.colsample_bytree >= 1.0 {
            (0..self.n_features).collect()
        } else {
            let k = ((self.n_features as f32 * self.colsample_bytree).floor() as usize).max(1);
            sample_without_replacement(self.n_features, k, rng)
        };
    }

    /// Features of the current tree, sorted.
    #[inline]
    pub fn tree_features(&self) -> &[usize] {
        &self.tree_features
    }

    /// Features to consider at one node, sorted.
    pub fn sample_for_node(&self, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        match self.per_node {
            Some(k) if k < self.tree_features.len() => {
                sample_without_replacement(self.tree_features.len(), k, rng)
                    .into_iter()
                    .map(|i| self.tree_features[i])
                    .collect()
            }
            _ => self.tree_features.clone(),
        }
    }
}
