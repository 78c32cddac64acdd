//! obesity-ensemble: obesity-level classification from lifestyle survey data.
//!
//! The crate turns raw survey rows into a scaled feature matrix and trains a
//! soft-voting ensemble of two gradient boosted tree models and a random
//! forest on it. The fitted transform and ensemble are persisted together so
//! predictions can be reproduced from the artifact alone.
//!
//! # Key Types
//!
//! - [`RawRecord`] / [`DatasetLoader`] - CSV loading with schema validation
//! - [`FeatureTransformer`] - Encoding, log transform, min-max scaling
//! - [`SoftVotingEnsemble`] - Averaged class probabilities of its members
//! - [`PipelineConfig`] - Paths, split, seed and per-member hyperparameters
//! - [`TrainedArtifact`] - Transform + ensemble, saved in the native format
//!
//! # Training
//!
//! ```ignore
//! use obesity_ensemble::{pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .data_path("data/raw/train.csv")
//!     .model_path("models/new_model.sav")
//!     .build()?;
//! let report = pipeline::run(&config)?;
//! println!("accuracy: {}", report.accuracy);
//! ```

pub mod config;
pub mod data;
pub mod features;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use config::{ConfigError, MemberConfig, PipelineConfig};
pub use data::{
    DatasetLoadError, DatasetLoader, FeatureMatrix, ObesityClass, RawRecord, SplitError,
    TrainTestSplit, stratified_split,
};
pub use features::{FeatureError, FeatureTransformer, SELECTED_FEATURES};
pub use model::{
    Classifier, EnsembleMember, GBDTClassifier, MemberSpec, RandomForestClassifier,
    SoftVotingEnsemble,
};
pub use persist::{DeserializeError, SerializeError};
pub use pipeline::{PipelineError, TrainedArtifact, TrainingReport};
pub use training::{GBDTParams, RandomForestParams, TrainError, Verbosity};
pub use utils::{Parallelism, run_with_threads};
