//! Pipeline configuration with builder pattern.
//!
//! [`PipelineConfig`] gathers every knob of a training run: input and output
//! paths, the holdout fraction, the seed, threading, verbosity and the
//! hyperparameters of each ensemble member. It uses the `bon` crate for the
//! builder and validates at build time.
//!
//! # Example
//!
//! ```
//! use obesity_ensemble::PipelineConfig;
//!
//! // The constants of the reference training run
//! let config = PipelineConfig::default();
//! assert_eq!(config.seed, 42);
//!
//! let config = PipelineConfig::builder()
//!     .data_path("data/raw/train.csv")
//!     .model_path("/tmp/model.sav")
//!     .test_size(0.25)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.members.len(), 3);
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use bon::Builder;

use crate::model::MemberSpec;
use crate::training::{GBDTParams, RandomForestParams, Verbosity};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors raised while validating a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("learning_rate must be positive and finite, got {0}")]
    InvalidLearningRate(f32),

    #[error("n_trees must be at least 1")]
    InvalidNTrees,

    #[error("{field} must be in (0, 1], got {value}")]
    InvalidSamplingRatio { field: &'static str, value: f32 },

    #[error("{field} must be non-negative, got {value}")]
    InvalidRegularization { field: &'static str, value: f64 },

    #[error("{field} must be at least {min}, got {value}")]
    InvalidTreeShape { field: &'static str, min: u32, value: u32 },

    #[error("max_bins must be in [2, 256], got {0}")]
    InvalidMaxBins(usize),

    #[error("invalid max_features: {0}")]
    InvalidMaxFeatures(String),

    #[error("test_size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),

    #[error("ensemble needs at least one member")]
    NoMembers,

    #[error("duplicate member name '{0}'")]
    DuplicateMember(String),
}

// =============================================================================
// MemberConfig
// =============================================================================

/// One named ensemble member and its hyperparameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MemberConfig {
    pub name: String,
    pub spec: MemberSpec,
}

impl MemberConfig {
    pub fn new(name: impl Into<String>, spec: MemberSpec) -> Self {
        Self { name: name.into(), spec }
    }

    /// The three members of the reference run: `lgbm`, `xgb` and `rf`.
    pub fn reference_members() -> Vec<MemberConfig> {
        vec![
            MemberConfig::new("lgbm", MemberSpec::Gbdt(GBDTParams::lgbm())),
            MemberConfig::new("xgb", MemberSpec::Gbdt(GBDTParams::xgb())),
            MemberConfig::new("rf", MemberSpec::RandomForest(RandomForestParams::default())),
        ]
    }
}

// =============================================================================
// PipelineConfig
// =============================================================================

/// Configuration of one training run.
///
/// # Structure
///
/// - **Paths**: CSV input and artifact output
/// - **Split**: holdout fraction and seed
/// - **Members**: named hyperparameter groups, voted with equal weight
/// - **Resources**: threading and logging
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct PipelineConfig {
    // === Paths ===
    /// Training CSV. Default: `data/raw/train.csv`.
    #[builder(into, default = PathBuf::from("data/raw/train.csv"))]
    pub data_path: PathBuf,

    /// Where the artifact is written. Default: `models/new_model.sav`.
    #[builder(into, default = PathBuf::from("models/new_model.sav"))]
    pub model_path: PathBuf,

    // === Split ===
    /// Fraction of rows held out for evaluation. Default: 0.2.
    #[builder(default = 0.2)]
    pub test_size: f64,

    /// Seed of the stratified train/test split. Default: 42.
    ///
    /// Members carry their own seeds in their parameter groups.
    #[builder(default = 42)]
    pub seed: u64,

    // === Members ===
    /// Ensemble members in voting order. Default: `lgbm`, `xgb`, `rf`.
    #[builder(default = MemberConfig::reference_members())]
    pub members: Vec<MemberConfig>,

    // === Resources ===
    /// Worker threads: 0 = all cores, 1 = sequential. Default: 0.
    #[builder(default)]
    pub n_threads: usize,

    /// Training progress verbosity. Default: `Info`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: pipeline_config_builder::IsComplete> PipelineConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the split fraction is outside (0, 1), the
    /// member list is empty or has duplicate names, or any member's
    /// hyperparameters are invalid.
    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigError::InvalidTestSize(self.test_size));
        }
        if self.members.is_empty() {
            return Err(ConfigError::NoMembers);
        }

        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(member.name.as_str()) {
                return Err(ConfigError::DuplicateMember(member.name.clone()));
            }
            member.spec.validate()?;
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// Tests
// =============================================================================
