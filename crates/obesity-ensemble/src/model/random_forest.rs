//! Random forest classifier.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::{Classifier, predict_rows};
use crate::repr::{Forest, ForestValidationError, ProbaLeaf};
use crate::training::{RandomForestParams, RandomForestTrainer, TrainError, Verbosity};
use crate::utils::Parallelism;

/// Bagged Gini trees; the predicted distribution is the mean over trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    forest: Forest<ProbaLeaf>,
    n_classes: usize,
    n_features: usize,
    params: RandomForestParams,
}

impl RandomForestClassifier {
    pub fn fit(
        features: ArrayView2<'_, f32>,
        labels: &[u32],
        n_classes: usize,
        params: RandomForestParams,
        verbosity: Verbosity,
        parallelism: Parallelism,
    ) -> Result<Self, TrainError> {
        let trainer = RandomForestTrainer::new(params);
        let forest = trainer.train(features, labels, n_classes, verbosity, parallelism)?;
        Ok(Self {
            forest,
            n_classes,
            n_features: features.ncols(),
            params: trainer.params().clone(),
        })
    }

    pub fn forest(&self) -> &Forest<ProbaLeaf> {
        &self.forest
    }

    pub fn params(&self) -> &RandomForestParams {
        &self.params
    }

    pub fn validate(&self) -> Result<(), ForestValidationError> {
        self.forest.validate(self.n_features)
    }
}

impl Classifier for RandomForestClassifier {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Array2<f32> {
        predict_rows(features, self.n_features, self.n_classes, |row, out| {
            self.forest.predict_row_into(row, out)
        })
    }
}
