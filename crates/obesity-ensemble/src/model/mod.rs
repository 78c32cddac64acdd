//! Fitted classifiers and the soft-voting ensemble.
//!
//! - [`GBDTClassifier`]: softmax gradient boosting
//! - [`RandomForestClassifier`]: bagged Gini trees
//! - [`SoftVotingEnsemble`]: the unweighted mean of member probabilities
//!
//! Members are held as the closed [`EnsembleMember`] enum so the whole
//! ensemble serializes with the artifact.

mod classifier;
mod gbdt;
mod random_forest;
mod voting;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

pub use classifier::{Classifier, argmax_rows};
pub use gbdt::GBDTClassifier;
pub use random_forest::RandomForestClassifier;
pub use voting::SoftVotingEnsemble;

use crate::config::ConfigError;
use crate::repr::ForestValidationError;
use crate::training::{GBDTParams, RandomForestParams, TrainError, Verbosity};
use crate::utils::Parallelism;

// =============================================================================
// MemberSpec
// =============================================================================

/// Hyperparameters of one member, by model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberSpec {
    Gbdt(GBDTParams),
    RandomForest(RandomForestParams),
}

impl MemberSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            MemberSpec::Gbdt(params) => params.validate(),
            MemberSpec::RandomForest(params) => params.validate(),
        }
    }

    /// Model family name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MemberSpec::Gbdt(_) => "gbdt",
            MemberSpec::RandomForest(_) => "random_forest",
        }
    }

    /// Train a member of this family.
    pub fn fit(
        &self,
        features: ArrayView2<'_, f32>,
        labels: &[u32],
        n_classes: usize,
        verbosity: Verbosity,
        parallelism: Parallelism,
    ) -> Result<EnsembleMember, TrainError> {
        Ok(match self {
            MemberSpec::Gbdt(params) => EnsembleMember::Gbdt(GBDTClassifier::fit(
                features,
                labels,
                n_classes,
                params.clone(),
                verbosity,
                parallelism,
            )?),
            MemberSpec::RandomForest(params) => EnsembleMember::RandomForest(RandomForestClassifier::fit(
                features,
                labels,
                n_classes,
                params.clone(),
                verbosity,
                parallelism,
            )?),
        })
    }
}

// =============================================================================
// EnsembleMember
// =============================================================================

/// A fitted ensemble member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnsembleMember {
    Gbdt(GBDTClassifier),
    RandomForest(RandomForestClassifier),
}

impl EnsembleMember {
    /// Structural check of the member's trees.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        match self {
            EnsembleMember::Gbdt(model) => model.validate(),
            EnsembleMember::RandomForest(model) => model.validate(),
        }
    }

    fn as_classifier(&self) -> &dyn Classifier {
        match self {
            EnsembleMember::Gbdt(model) => model,
            EnsembleMember::RandomForest(model) => model,
        }
    }
}

impl Classifier for EnsembleMember {
    fn n_classes(&self) -> usize {
        self.as_classifier().n_classes()
    }

    fn n_features(&self) -> usize {
        self.as_classifier().n_features()
    }

    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Array2<f32> {
        self.as_classifier().predict_proba(features)
    }
}
