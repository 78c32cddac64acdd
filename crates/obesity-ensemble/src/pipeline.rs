//! End-to-end training run.
//!
//! [`run`] executes the four stages in order:
//!
//! 1. load the labeled CSV
//! 2. fit the feature transformer and encode labels
//! 3. split 80/20 stratified, fit the ensemble, score the holdout
//! 4. write the artifact
//!
//! Any failure aborts the run with a [`PipelineError`]. The written
//! [`TrainedArtifact`] holds the fitted transformer next to the ensemble so
//! raw records can be scored from the file alone.

use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::config::{ConfigError, PipelineConfig};
use crate::data::{
    DatasetLoadError, DatasetLoader, N_CLASSES, ObesityClass, RawRecord, SplitError, stratified_split,
};
use crate::features::{FeatureError, FeatureTransformer, SELECTED_FEATURES};
use crate::model::{Classifier, SoftVotingEnsemble, argmax_rows};
use crate::persist::{self, ArtifactMetadata, ArtifactV1, DeserializeError, SerializeError};
use crate::training::{TrainError, accuracy, class_counts};
use crate::utils::run_with_threads;

// =============================================================================
// Errors
// =============================================================================

/// Any failure of a training run or of artifact inference.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load dataset: {0}")]
    Load(#[from] DatasetLoadError),

    #[error("feature engineering failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("train/test split failed: {0}")]
    Split(#[from] SplitError),

    #[error("training failed: {0}")]
    Train(#[from] TrainError),

    #[error("failed to write artifact: {0}")]
    Serialize(#[from] SerializeError),

    #[error("failed to read artifact: {0}")]
    Deserialize(#[from] DeserializeError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("model expects {expected} features, transformer produced {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
}

// =============================================================================
// TrainingReport
// =============================================================================

/// Outcome of [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Ensemble accuracy on the holdout partition.
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    /// Rows per class code over the whole dataset.
    pub class_counts: Vec<usize>,
    /// Holdout accuracy per member, in voting order.
    pub member_accuracies: Vec<(String, f64)>,
    /// Where the artifact was written.
    pub model_path: PathBuf,
}

// =============================================================================
// TrainedArtifact
// =============================================================================

/// A fitted transformer and ensemble with their run metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedArtifact {
    inner: ArtifactV1,
}

impl TrainedArtifact {
    pub fn new(metadata: ArtifactMetadata, transformer: FeatureTransformer, ensemble: SoftVotingEnsemble) -> Self {
        Self { inner: ArtifactV1 { metadata, transformer, ensemble } }
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.inner.metadata
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.inner.transformer
    }

    pub fn ensemble(&self) -> &SoftVotingEnsemble {
        &self.inner.ensemble
    }

    /// Atomically write the artifact to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SerializeError> {
        persist::save(path.as_ref(), &self.inner)
    }

    /// Read and validate an artifact from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeserializeError> {
        persist::load(path.as_ref()).map(|inner| Self { inner })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        persist::to_bytes(&self.inner)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        persist::from_bytes(bytes).map(|inner| Self { inner })
    }

    /// Class probabilities for raw records, shape `[n_records, n_classes]`.
    pub fn predict_proba_records(&self, records: &[RawRecord]) -> Result<Array2<f32>, PipelineError> {
        let features = self.inner.transformer.transform(records)?;
        let expected = self.inner.ensemble.n_features();
        if features.n_columns() != expected {
            return Err(PipelineError::FeatureCountMismatch { expected, found: features.n_columns() });
        }
        Ok(self.inner.ensemble.predict_proba(features.view()))
    }

    /// Predicted class codes for raw records.
    pub fn predict_records(&self, records: &[RawRecord]) -> Result<Vec<u32>, PipelineError> {
        Ok(argmax_rows(&self.predict_proba_records(records)?))
    }

    /// Predicted class names for raw records.
    pub fn predict_labels(&self, records: &[RawRecord]) -> Result<Vec<String>, PipelineError> {
        let names = &self.inner.metadata.class_names;
        Ok(self
            .predict_records(records)?
            .into_iter()
            .map(|code| names.get(code as usize).cloned().unwrap_or_else(|| code.to_string()))
            .collect())
    }
}

// =============================================================================
// Run
// =============================================================================

/// Run the full training pipeline described by `config`.
pub fn run(config: &PipelineConfig) -> Result<TrainingReport, PipelineError> {
    config.validate()?;
    let records = DatasetLoader::training().load(&config.data_path)?;
    let (artifact, report) = train(&records, config)?;
    artifact.save(&config.model_path)?;
    Ok(report)
}

/// Fit and evaluate on in-memory records without writing anything.
///
/// The report's `model_path` is the configured path.
pub fn train(records: &[RawRecord], config: &PipelineConfig) -> Result<(TrainedArtifact, TrainingReport), PipelineError> {
    config.validate()?;

    // Scaling bounds come from the whole dataset, before the split.
    let mut transformer = FeatureTransformer::new();
    let matrix = transformer.fit_transform(records)?;
    let labels = FeatureTransformer::labels(records)?;
    tracing::info!(rows = matrix.n_rows(), features = matrix.n_columns(), "engineered features");

    let split = stratified_split(&labels, config.test_size, config.seed)?;
    let x_train = matrix.select_rows(&split.train);
    let x_test = matrix.select_rows(&split.test);
    let y_train: Vec<u32> = split.train.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<u32> = split.test.iter().map(|&i| labels[i]).collect();
    tracing::info!(train = y_train.len(), test = y_test.len(), seed = config.seed, "split dataset");

    let (ensemble, test_accuracy, member_accuracies) = run_with_threads(config.n_threads, |parallelism| {
        let ensemble =
            SoftVotingEnsemble::fit(&config.members, x_train.view(), &y_train, N_CLASSES, config.verbosity, parallelism)?;

        let member_accuracies: Vec<(String, f64)> = ensemble
            .members()
            .map(|(name, model)| (name.to_string(), accuracy(&y_test, &model.predict(x_test.view()))))
            .collect();
        let test_accuracy = accuracy(&y_test, &ensemble.predict(x_test.view()));
        Ok::<_, PipelineError>((ensemble, test_accuracy, member_accuracies))
    })??;

    for (name, member_accuracy) in &member_accuracies {
        tracing::info!(member = %name, accuracy = member_accuracy, "member holdout accuracy");
    }
    tracing::info!(accuracy = test_accuracy, "ensemble holdout accuracy");

    let metadata = ArtifactMetadata {
        feature_names: SELECTED_FEATURES.iter().map(|s| s.to_string()).collect(),
        class_names: ObesityClass::names(),
        accuracy: test_accuracy,
        n_train: y_train.len(),
        n_test: y_test.len(),
        member_accuracies: member_accuracies.clone(),
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let report = TrainingReport {
        accuracy: test_accuracy,
        n_train: y_train.len(),
        n_test: y_test.len(),
        class_counts: class_counts(&labels, N_CLASSES),
        member_accuracies,
        model_path: config.model_path.clone(),
    };
    Ok((TrainedArtifact::new(metadata, transformer, ensemble), report))
}
