//! Random forest classification.
//!
//! Each tree is grown depth-first on a bootstrap sample with Gini impurity
//! and a fresh feature subset at every node. A row drawn `k` times counts
//! with weight `k` in the class statistics. Leaves store the class
//! distribution; the forest averages them.
//!
//! Tree `t` draws from its own generator seeded with `seed + t`, so trees
//! can be grown in any order and the forest does not depend on threading.

use ndarray::ArrayView2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::binning::{BinnedMatrix, MAX_BINS};
use super::error::{TrainError, check_training_data};
use super::grower::{GrowerParams, GrowthStrategy, TreeGrower};
use super::histogram::RowStats;
use super::logger::{TrainingLogger, Verbosity};
use super::sampling::{ColumnSampler, bootstrap};
use super::split::GiniCriterion;
use crate::config::ConfigError;
use crate::repr::{Forest, ProbaLeaf};
use crate::utils::Parallelism;

/// Number of features drawn at each node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// `floor(sqrt(n))`
    Sqrt,
    /// `floor(log2(n))`
    Log2,
    All,
    Count(usize),
    /// `floor(n * fraction)`
    Fraction(f32),
}

impl MaxFeatures {
    /// Features per node for `n_features` columns, at least 1.
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => k,
            MaxFeatures::Fraction(f) => (n * f as f64).floor() as usize,
        };
        k.clamp(1, n_features.max(1))
    }
}

// =============================================================================
// RandomForestParams
// =============================================================================

/// Hyperparameters of a random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_trees: u32,
    /// `None` grows until the size limits stop it.
    pub max_depth: Option<u32>,
    /// Nodes with fewer rows are not split.
    pub min_samples_split: u32,
    /// Minimum rows per leaf.
    pub min_samples_leaf: u32,
    pub max_features: MaxFeatures,
    /// Train each tree on a bootstrap sample instead of all rows.
    pub bootstrap: bool,
    pub max_bins: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 150,
            max_depth: Some(15),
            min_samples_split: 8,
            min_samples_leaf: 4,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            max_bins: MAX_BINS,
            seed: 42,
        }
    }
}

impl RandomForestParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_trees == 0 {
            return Err(ConfigError::InvalidNTrees);
        }
        if let Some(depth) = self.max_depth.filter(|&d| d == 0) {
            return Err(ConfigError::InvalidTreeShape { field: "max_depth", min: 1, value: depth });
        }
        if self.min_samples_split < 2 {
            return Err(ConfigError::InvalidTreeShape {
                field: "min_samples_split",
                min: 2,
                value: self.min_samples_split,
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(ConfigError::InvalidTreeShape { field: "min_samples_leaf", min: 1, value: 0 });
        }
        match self.max_features {
            MaxFeatures::Count(0) => {
                return Err(ConfigError::InvalidMaxFeatures("count must be at least 1".into()));
            }
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(ConfigError::InvalidMaxFeatures(format!("fraction must be in (0, 1], got {f}")));
            }
            _ => {}
        }
        if !(2..=MAX_BINS).contains(&self.max_bins) {
            return Err(ConfigError::InvalidMaxBins(self.max_bins));
        }
        Ok(())
    }
}

// =============================================================================
// RandomForestTrainer
// =============================================================================

#[derive(Debug, Clone)]
pub struct RandomForestTrainer {
    params: RandomForestParams,
}

impl RandomForestTrainer {
    pub fn new(params: RandomForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RandomForestParams {
        &self.params
    }

    /// Train on `[n_rows, n_features]` features and class labels.
    ///
    /// Trees are grown in parallel when `parallelism` allows it.
    pub fn train(
        &self,
        features: ArrayView2<'_, f32>,
        labels: &[u32],
        n_classes: usize,
        verbosity: Verbosity,
        parallelism: Parallelism,
    ) -> Result<Forest<ProbaLeaf>, TrainError> {
        check_training_data(features.nrows(), labels, n_classes)?;
        let params = &self.params;
        let n_rows = features.nrows();
        let n_features = features.ncols();
        let width = n_classes + 1;

        let binned = BinnedMatrix::from_features(features, params.max_bins, parallelism);
        let gini = GiniCriterion { n_classes, min_samples_leaf: params.min_samples_leaf };
        let grower_params = GrowerParams {
            strategy: GrowthStrategy::DepthWise { max_depth: params.max_depth.unwrap_or(u32::MAX) },
            min_samples_split: params.min_samples_split.max(2 * params.min_samples_leaf),
        };
        let grower = TreeGrower::new(&binned, &gini, grower_params, Parallelism::Sequential);
        let per_node = params.max_features.resolve(n_features);

        let mut logger = TrainingLogger::new(verbosity, "random_forest");
        logger.start_training(params.n_trees as usize);

        let trees = parallelism.maybe_par_map(0..params.n_trees, |t| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed.wrapping_add(t as u64));
            let weights = if params.bootstrap {
                bootstrap(n_rows, &mut rng)
            } else {
                vec![1; n_rows]
            };

            let mut stats = vec![0.0; n_rows * width];
            let mut rows = Vec::with_capacity(n_rows);
            for (row, &w) in weights.iter().enumerate() {
                if w > 0 {
                    stats[row * width + labels[row] as usize] = w as f64;
                    stats[row * width + n_classes] = 1.0;
                    rows.push(row as u32);
                }
            }

            let columns = ColumnSampler::new(n_features, 1.0, Some(per_node));
            let tree = grower
                .grow(rows, RowStats::new(&stats, width), &columns, &mut rng, |s| {
                    ProbaLeaf::from_weights(&s[..n_classes])
                })
                .freeze();
            logger.log_round(t as usize, "leaves", tree.n_leaves() as f64);
            tree
        });

        let mut forest = Forest::new(1);
        for tree in trees {
            forest.push_tree(tree, 0);
        }

        logger.finish_training();
        Ok(forest)
    }
}
