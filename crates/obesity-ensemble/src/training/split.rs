//! Split criteria and best-split search over histograms.
//!
//! A [`SplitCriterion`] knows the layout of the per-row statistics and how to
//! score a candidate partition. [`find_best_split`] scans the cumulative bin
//! statistics of every feature in a node histogram and keeps the best valid
//! candidate. Ties keep the earlier feature, then the lower bin.

use super::binning::BinnedMatrix;
use super::histogram::Histogram;

// =============================================================================
// SplitCriterion
// =============================================================================

/// Scoring rule for candidate splits.
pub trait SplitCriterion: Sync {
    /// Number of statistics slots per row.
    fn width(&self) -> usize;

    /// Improvement of splitting `parent` into `left` and `right`.
    fn gain(&self, parent: &[f64], left: &[f64], right: &[f64]) -> f64;

    /// Whether both children satisfy the minimum size constraints.
    fn is_valid_split(&self, left: &[f64], right: &[f64]) -> bool;

    /// Row count of a node (unweighted).
    fn count(&self, stats: &[f64]) -> f64;

    /// A split is taken only if its gain is strictly above this value.
    fn min_gain(&self) -> f64 {
        0.0
    }
}

// =============================================================================
// GainParams (second-order boosting)
// =============================================================================

/// Regularized gain for gradient boosting.
///
/// Statistics are `[grad_sum, hess_sum, count]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GainParams {
    /// L2 regularization (lambda).
    pub reg_lambda: f64,
    /// L1 regularization (alpha).
    pub reg_alpha: f64,
    /// Minimum split gain (gamma).
    pub min_gain: f64,
    /// Minimum sum of hessians per child.
    pub min_child_weight: f64,
    /// Minimum rows per child.
    pub min_samples_leaf: u32,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            min_gain: 0.0,
            min_child_weight: 1.0,
            min_samples_leaf: 1,
        }
    }
}

impl GainParams {
    /// Soft-thresholded gradient sum (L1).
    #[inline]
    fn threshold_l1(&self, grad: f64) -> f64 {
        if grad > self.reg_alpha {
            grad - self.reg_alpha
        } else if grad < -self.reg_alpha {
            grad + self.reg_alpha
        } else {
            0.0
        }
    }

    #[inline]
    fn score(&self, grad: f64, hess: f64) -> f64 {
        let g = self.threshold_l1(grad);
        g * g / (hess + self.reg_lambda)
    }

    /// Split gain using the XGBoost formula.
    ///
    /// ```text
    /// gain = 0.5 * [G_L²/(H_L + λ) + G_R²/(H_R + λ) - G_P²/(H_P + λ)]
    /// ```
    ///
    /// Gradient sums are soft-thresholded by α first.
    #[inline]
    pub fn compute_gain(
        &self,
        grad_left: f64,
        hess_left: f64,
        grad_right: f64,
        hess_right: f64,
        grad_parent: f64,
        hess_parent: f64,
    ) -> f64 {
        0.5 * (self.score(grad_left, hess_left) + self.score(grad_right, hess_right)
            - self.score(grad_parent, hess_parent))
    }

    /// Leaf weight with L1 and L2 regularization.
    ///
    /// ```text
    /// weight = -sign(G) × max(0, |G| - α) / (H + λ)
    /// ```
    #[inline]
    pub fn compute_leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f32 {
        let denom = hess_sum + self.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        (-self.threshold_l1(grad_sum) / denom) as f32
    }
}

impl SplitCriterion for GainParams {
    fn width(&self) -> usize {
        3
    }

    #[inline]
    fn gain(&self, parent: &[f64], left: &[f64], right: &[f64]) -> f64 {
        self.compute_gain(left[0], left[1], right[0], right[1], parent[0], parent[1])
    }

    #[inline]
    fn is_valid_split(&self, left: &[f64], right: &[f64]) -> bool {
        let min_samples = self.min_samples_leaf as f64;
        left[1] >= self.min_child_weight
            && right[1] >= self.min_child_weight
            && left[2] >= min_samples
            && right[2] >= min_samples
    }

    #[inline]
    fn count(&self, stats: &[f64]) -> f64 {
        stats[2]
    }

    fn min_gain(&self) -> f64 {
        self.min_gain
    }
}

// =============================================================================
// GiniCriterion (classification trees)
// =============================================================================

/// Weighted Gini impurity decrease.
///
/// Statistics are one weighted count per class followed by the unweighted
/// row count: `[w_0, .., w_{k-1}, count]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GiniCriterion {
    pub n_classes: usize,
    /// Minimum rows per child.
    pub min_samples_leaf: u32,
}

impl GiniCriterion {
    /// `W * gini = W - Σ w_k² / W` for a node with total weight `W`.
    #[inline]
    pub fn weighted_impurity(&self, stats: &[f64]) -> f64 {
        let weights = &stats[..self.n_classes];
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        total - weights.iter().map(|w| w * w).sum::<f64>() / total
    }
}

impl SplitCriterion for GiniCriterion {
    fn width(&self) -> usize {
        self.n_classes + 1
    }

    #[inline]
    fn gain(&self, parent: &[f64], left: &[f64], right: &[f64]) -> f64 {
        self.weighted_impurity(parent) - self.weighted_impurity(left) - self.weighted_impurity(right)
    }

    #[inline]
    fn is_valid_split(&self, left: &[f64], right: &[f64]) -> bool {
        let min_samples = self.min_samples_leaf.max(1) as f64;
        self.count(left) >= min_samples && self.count(right) >= min_samples
    }

    #[inline]
    fn count(&self, stats: &[f64]) -> f64 {
        stats[self.n_classes]
    }

    /// Pure-node gains are floating-point noise.
    fn min_gain(&self) -> f64 {
        1e-12
    }
}

// =============================================================================
// Split Search
// =============================================================================

/// The best split found for a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitInfo {
    pub feature: usize,
    /// Rows with `bin <= bin` go left.
    pub bin: usize,
    /// Raw threshold: rows with `value <= threshold` go left.
    pub threshold: f32,
    pub gain: f64,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

/// Best split over every feature covered by `hist`, or `None` if no valid
/// split beats the criterion's minimum gain.
pub fn find_best_split<C: SplitCriterion>(
    criterion: &C,
    hist: &Histogram,
    binned: &BinnedMatrix,
    parent: &[f64],
) -> Option<SplitInfo> {
    let width = criterion.width();
    let mut best: Option<SplitInfo> = None;
    let mut best_gain = criterion.min_gain();

    let mut left = vec![0.0; width];
    let mut right = vec![0.0; width];

    for (slot, &feature) in hist.features().iter().enumerate() {
        let n_bins = binned.n_bins(feature);
        left.fill(0.0);

        // The last bin cannot be a split point: everything would go left.
        for bin in 0..n_bins.saturating_sub(1) {
            for (acc, &v) in left.iter_mut().zip(hist.bin(slot, bin)) {
                *acc += v;
            }
            for ((r, &p), &l) in right.iter_mut().zip(parent).zip(&left) {
                *r = p - l;
            }
            if criterion.count(&left) == 0.0 || !criterion.is_valid_split(&left, &right) {
                continue;
            }

            let gain = criterion.gain(parent, &left, &right);
            if gain > best_gain {
                best_gain = gain;
                best = Some(SplitInfo {
                    feature,
                    bin,
                    threshold: binned.mapper(feature).threshold(bin),
                    gain,
                    left: left.clone(),
                    right: right.clone(),
                });
            }
        }
    }

    best
}
