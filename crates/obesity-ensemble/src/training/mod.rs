//! Training infrastructure for the tree models.
//!
//! Both trainers share one histogram-based tree grower:
//!
//! - [`GBDTTrainer`]: softmax multiclass boosting, leaf-wise or depth-wise
//! - [`RandomForestTrainer`]: bagged Gini trees with per-node feature sampling
//!
//! Features are quantized once per fit into at most 256 bins per column
//! ([`binning`]); split search runs over per-node statistic histograms
//! ([`histogram`], [`split`]).

pub mod binning;
mod error;
pub mod gbdt;
pub mod grower;
pub mod histogram;
mod logger;
pub mod metrics;
pub mod objective;
pub mod partition;
pub mod random_forest;
pub mod sampling;
pub mod split;

pub use error::TrainError;
pub use gbdt::{GBDTParams, GBDTTrainer};
pub use grower::{GrowerParams, GrowthStrategy, TreeGrower};
pub use logger::{TrainingLogger, Verbosity};
pub use metrics::{accuracy, class_counts, multiclass_logloss};
pub use random_forest::{MaxFeatures, RandomForestParams, RandomForestTrainer};
