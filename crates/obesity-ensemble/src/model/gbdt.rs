//! Boosted tree classifier.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::{Classifier, predict_rows};
use crate::repr::{Forest, ForestValidationError, ScalarLeaf};
use crate::training::objective::softmax_inplace;
use crate::training::{GBDTParams, GBDTTrainer, TrainError, Verbosity};
use crate::utils::Parallelism;

/// Softmax multiclass GBDT: one output group per class.
///
/// Access the trees via [`forest()`](Self::forest) and the training
/// hyperparameters via [`params()`](Self::params).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GBDTClassifier {
    forest: Forest<ScalarLeaf>,
    n_features: usize,
    params: GBDTParams,
}

impl GBDTClassifier {
    /// Train on `[n_rows, n_features]` features and labels in `0..n_classes`.
    pub fn fit(
        features: ArrayView2<'_, f32>,
        labels: &[u32],
        n_classes: usize,
        params: GBDTParams,
        verbosity: Verbosity,
        parallelism: Parallelism,
    ) -> Result<Self, TrainError> {
        let trainer = GBDTTrainer::new(params);
        let forest = trainer.train(features, labels, n_classes, verbosity, parallelism)?;
        Ok(Self {
            forest,
            n_features: features.ncols(),
            params: trainer.params().clone(),
        })
    }

    pub fn forest(&self) -> &Forest<ScalarLeaf> {
        &self.forest
    }

    pub fn params(&self) -> &GBDTParams {
        &self.params
    }

    /// Raw per-class margins, shape `[n_rows, n_classes]`.
    pub fn predict_raw(&self, features: ArrayView2<'_, f32>) -> Array2<f32> {
        predict_rows(features, self.n_features, self.n_classes(), |row, out| {
            self.forest.predict_row_into(row, out)
        })
    }

    pub fn validate(&self) -> Result<(), ForestValidationError> {
        self.forest.validate(self.n_features)
    }
}

impl Classifier for GBDTClassifier {
    fn n_classes(&self) -> usize {
        self.forest.n_groups() as usize
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Array2<f32> {
        predict_rows(features, self.n_features, self.n_classes(), |row, out| {
            self.forest.predict_row_into(row, out);
            softmax_inplace(out);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn probabilities_follow_margins() {
        let x = Array2::from_shape_fn((90, 1), |(i, _)| (i % 3) as f32);
        let y: Vec<u32> = (0..90).map(|i| (i % 3) as u32).collect();
        let params = GBDTParams { n_trees: 10, ..GBDTParams::xgb() };
        let model = GBDTClassifier::fit(x.view(), &y, 3, params, Verbosity::Silent, Parallelism::Sequential).unwrap();

        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.n_features(), 1);
        assert_eq!(model.validate(), Ok(()));

        let proba = model.predict_proba(x.view());
        for row in proba.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-5);
        }
        assert_eq!(model.predict(x.view()), y);

        let raw = model.predict_raw(x.view());
        assert!(raw[[0, 0]] > raw[[0, 1]]);
    }
}
