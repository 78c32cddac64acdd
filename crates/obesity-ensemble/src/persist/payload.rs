//! Versioned artifact payload.

use serde::{Deserialize, Serialize};

use crate::features::FeatureTransformer;
use crate::model::SoftVotingEnsemble;

/// Facts about the training run stored next to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Model input columns, in order.
    pub feature_names: Vec<String>,
    /// Class names by class code.
    pub class_names: Vec<String>,
    /// Holdout accuracy of the ensemble.
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    /// Holdout accuracy of each member, in voting order.
    pub member_accuracies: Vec<(String, f64)>,
    /// Version of the crate that wrote the artifact.
    pub crate_version: String,
}

/// Everything needed to predict from raw records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactV1 {
    pub metadata: ArtifactMetadata,
    pub transformer: FeatureTransformer,
    pub ensemble: SoftVotingEnsemble,
}

/// Payload variants by schema version.
///
/// New versions are appended so older payloads keep their discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArtifactPayload {
    V1(ArtifactV1),
}

/// Borrowed twin of [`ArtifactPayload`]; encodes to the same bytes.
#[derive(Serialize)]
pub(crate) enum ArtifactPayloadRef<'a> {
    V1(&'a ArtifactV1),
}
