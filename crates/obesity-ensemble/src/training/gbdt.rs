//! Multiclass gradient boosting.
//!
//! [`GBDTTrainer`] fits one tree per class per round on softmax
//! cross-entropy gradients. The result is a [`Forest<ScalarLeaf>`] with one
//! output group per class; its raw margins go through softmax at prediction.
//!
//! # Algorithm
//!
//! 1. Bin the features once.
//! 2. Start every margin at the log class prior.
//! 3. Each round:
//!    - compute gradients for all (row, class) pairs
//!    - draw the round's rows and each class tree's columns
//!    - grow the class trees (in parallel over classes)
//!    - shrink leaves by the learning rate and update margins

use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::binning::{BinnedMatrix, MAX_BINS};
use super::error::{TrainError, check_training_data};
use super::grower::{GrowerParams, GrowthStrategy, TreeGrower};
use super::histogram::RowStats;
use super::logger::{TrainingLogger, Verbosity};
use super::metrics::multiclass_logloss;
use super::objective::{GradsTuple, SoftmaxLoss, softmax_inplace};
use super::sampling::{ColumnSampler, RowSampler};
use super::split::GainParams;
use crate::config::ConfigError;
use crate::repr::{Forest, ScalarLeaf};
use crate::utils::Parallelism;

// =============================================================================
// GBDTParams
// =============================================================================

/// Hyperparameters of a boosted tree model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GBDTParams {
    /// Boosting rounds; each adds one tree per class.
    pub n_trees: u32,
    pub learning_rate: f32,
    pub growth: GrowthStrategy,
    /// Minimum rows per leaf.
    pub min_samples_leaf: u32,
    /// Minimum hessian sum per leaf.
    pub min_child_weight: f64,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    /// Minimum gain to split (gamma).
    pub min_gain: f64,
    /// Fraction of rows per bag.
    pub subsample: f32,
    /// Re-draw the bag every `subsample_freq` rounds; 0 disables bagging.
    pub subsample_freq: u32,
    /// Fraction of features per tree.
    pub colsample_bytree: f32,
    pub max_bins: usize,
    pub seed: u64,
}

impl Default for GBDTParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.1,
            growth: GrowthStrategy::DepthWise { max_depth: 6 },
            min_samples_leaf: 1,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            min_gain: 0.0,
            subsample: 1.0,
            subsample_freq: 1,
            colsample_bytree: 1.0,
            max_bins: MAX_BINS,
            seed: 42,
        }
    }
}

impl GBDTParams {
    /// Leaf-wise member with LightGBM defaults.
    ///
    /// `subsample` is set but `subsample_freq` is 0, so, as in LightGBM,
    /// every round sees all rows.
    pub fn lgbm() -> Self {
        Self {
            growth: GrowthStrategy::LeafWise { max_leaves: 50, max_depth: 5 },
            min_samples_leaf: 30,
            min_child_weight: 1e-3,
            reg_lambda: 0.0,
            subsample: 0.8,
            subsample_freq: 0,
            ..Self::default()
        }
    }

    /// Depth-wise member with XGBoost defaults.
    pub fn xgb() -> Self {
        Self {
            growth: GrowthStrategy::DepthWise { max_depth: 7 },
            subsample: 0.8,
            subsample_freq: 1,
            colsample_bytree: 0.6,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.n_trees == 0 {
            return Err(ConfigError::InvalidNTrees);
        }
        for (field, value) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidSamplingRatio { field, value });
            }
        }
        for (field, value) in [
            ("reg_lambda", self.reg_lambda),
            ("reg_alpha", self.reg_alpha),
            ("min_gain", self.min_gain),
            ("min_child_weight", self.min_child_weight),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::InvalidRegularization { field, value });
            }
        }
        match self.growth {
            GrowthStrategy::DepthWise { max_depth } if max_depth == 0 => {
                return Err(ConfigError::InvalidTreeShape { field: "max_depth", min: 1, value: max_depth });
            }
            GrowthStrategy::LeafWise { max_leaves, .. } if max_leaves < 2 => {
                return Err(ConfigError::InvalidTreeShape { field: "max_leaves", min: 2, value: max_leaves });
            }
            _ => {}
        }
        if !(2..=MAX_BINS).contains(&self.max_bins) {
            return Err(ConfigError::InvalidMaxBins(self.max_bins));
        }
        Ok(())
    }

    fn gain_params(&self) -> GainParams {
        GainParams {
            reg_lambda: self.reg_lambda,
            reg_alpha: self.reg_alpha,
            min_gain: self.min_gain,
            min_child_weight: self.min_child_weight,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

// =============================================================================
// GBDTTrainer
// =============================================================================

/// Softmax multiclass boosting trainer.
#[derive(Debug, Clone)]
pub struct GBDTTrainer {
    params: GBDTParams,
}

impl GBDTTrainer {
    pub fn new(params: GBDTParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GBDTParams {
        &self.params
    }

    /// Train on `[n_rows, n_features]` features and class labels.
    ///
    /// `parallelism` parallelizes over the class trees of a round; the
    /// model does not depend on it.
    pub fn train(
        &self,
        features: ArrayView2<'_, f32>,
        labels: &[u32],
        n_classes: usize,
        verbosity: Verbosity,
        parallelism: Parallelism,
    ) -> Result<Forest<ScalarLeaf>, TrainError> {
        check_training_data(features.nrows(), labels, n_classes)?;
        let params = &self.params;
        let n_rows = features.nrows();
        let n_features = features.ncols();

        let binned = BinnedMatrix::from_features(features, params.max_bins, parallelism);
        let dense: Vec<f32> = features.iter().copied().collect();

        let loss = SoftmaxLoss::new(n_classes);
        let base_score = loss.base_score(labels);
        let mut forest = Forest::new(n_classes as u32).with_base_score(base_score.clone());
        let mut margins: Vec<f32> = base_score
            .iter()
            .flat_map(|&b| std::iter::repeat(b).take(n_rows))
            .collect();
        let mut grad_hess = vec![GradsTuple::default(); n_classes * n_rows];

        let gain = params.gain_params();
        let grower_params = GrowerParams {
            strategy: params.growth,
            min_samples_split: (2 * params.min_samples_leaf).max(2),
        };
        let grower = TreeGrower::new(&binned, &gain, grower_params, Parallelism::Sequential);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let mut row_sampler = RowSampler::new(params.subsample, params.subsample_freq);
        let mut logger = TrainingLogger::new(verbosity, "gbdt");
        logger.start_training(params.n_trees as usize);

        for round in 0..params.n_trees {
            loss.compute_gradients(&margins, labels, &mut grad_hess);
            let rows = row_sampler.sample(round, n_rows, &mut rng);

            // Draw every class tree's columns up front so the result does
            // not depend on scheduling.
            let tasks: Vec<(usize, ColumnSampler, Xoshiro256PlusPlus)> = (0..n_classes)
                .map(|class| {
                    let mut columns = ColumnSampler::new(n_features, params.colsample_bytree, None);
                    columns.sample_for_tree(&mut rng);
                    (class, columns, Xoshiro256PlusPlus::seed_from_u64(rng.gen()))
                })
                .collect();

            let grad_hess = &grad_hess;
            let rows = &rows;
            let trees = parallelism.maybe_par_map(tasks, |(class, columns, mut tree_rng)| {
                let class_grads = &grad_hess[class * n_rows..(class + 1) * n_rows];
                let stats: Vec<f64> = class_grads
                    .iter()
                    .flat_map(|gh| [gh.grad as f64, gh.hess as f64, 1.0])
                    .collect();
                let mut tree = grower.grow(rows.clone(), RowStats::new(&stats, 3), &columns, &mut tree_rng, |s| {
                    ScalarLeaf(gain.compute_leaf_weight(s[0], s[1]))
                });
                tree.apply_learning_rate(params.learning_rate);
                tree.freeze()
            });

            for (class, tree) in trees.into_iter().enumerate() {
                let class_margins = &mut margins[class * n_rows..(class + 1) * n_rows];
                for (i, margin) in class_margins.iter_mut().enumerate() {
                    *margin += tree.predict_row(&dense[i * n_features..(i + 1) * n_features]).0;
                }
                forest.push_tree(tree, class as u32);
            }

            if logger.verbosity() >= Verbosity::Debug {
                let probabilities = margins_to_proba(&margins, n_rows, n_classes);
                logger.log_round(round as usize, "train_logloss", multiclass_logloss(probabilities.view(), labels));
            }
        }

        logger.finish_training();
        Ok(forest)
    }
}

/// Softmax of column-major margins into `[n_rows, n_classes]` probabilities.
pub(crate) fn margins_to_proba(margins: &[f32], n_rows: usize, n_classes: usize) -> Array2<f32> {
    let mut out = Array2::zeros((n_rows, n_classes));
    for (i, mut row) in out.rows_mut().into_iter().enumerate() {
        for c in 0..n_classes {
            row[c] = margins[c * n_rows + i];
        }
        if let Some(slice) = row.as_slice_mut() {
            softmax_inplace(slice);
        }
    }
    out
}
