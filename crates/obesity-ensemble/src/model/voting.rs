//! Soft-voting ensemble.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::Classifier;
use super::EnsembleMember;
use crate::config::MemberConfig;
use crate::training::{TrainError, Verbosity};
use crate::utils::Parallelism;

/// One named, fitted member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NamedMember {
    name: String,
    model: EnsembleMember,
}

/// Averages the class probabilities of its members with equal weight.
///
/// All members agree on the class and feature counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftVotingEnsemble {
    members: Vec<NamedMember>,
    n_classes: usize,
    n_features: usize,
}

impl SoftVotingEnsemble {
    /// Assemble fitted members.
    ///
    /// # Errors
    ///
    /// [`TrainError::NoMembers`], [`TrainError::DuplicateMember`], or
    /// [`TrainError::MemberMismatch`] when a member's class or feature
    /// count differs from the first member's.
    pub fn new(members: Vec<(String, EnsembleMember)>) -> Result<Self, TrainError> {
        let Some((_, first)) = members.first() else {
            return Err(TrainError::NoMembers);
        };
        let n_classes = first.n_classes();
        let n_features = first.n_features();

        let members = members.into_iter().map(|(name, model)| NamedMember { name, model }).collect();
        let ensemble = Self { members, n_classes, n_features };
        ensemble.validate()?;
        Ok(ensemble)
    }

    /// Check member names and that every member matches the ensemble's
    /// class and feature counts.
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.members.is_empty() {
            return Err(TrainError::NoMembers);
        }
        let mut seen = HashSet::new();
        for NamedMember { name, model } in &self.members {
            if !seen.insert(name.as_str()) {
                return Err(TrainError::DuplicateMember(name.clone()));
            }
            for (what, expected, found) in [
                ("n_classes", self.n_classes, model.n_classes()),
                ("n_features", self.n_features, model.n_features()),
            ] {
                if expected != found {
                    return Err(TrainError::MemberMismatch { name: name.clone(), what, expected, found });
                }
            }
        }
        Ok(())
    }

    /// Fit every configured member on the same data, in order.
    pub fn fit(
        configs: &[MemberConfig],
        features: ArrayView2<'_, f32>,
        labels: &[u32],
        n_classes: usize,
        verbosity: Verbosity,
        parallelism: Parallelism,
    ) -> Result<Self, TrainError> {
        let mut members = Vec::with_capacity(configs.len());
        for config in configs {
            if verbosity >= Verbosity::Info {
                tracing::info!(member = %config.name, kind = config.spec.kind(), "fitting ensemble member");
            }
            let model = config.spec.fit(features, labels, n_classes, verbosity, parallelism)?;
            members.push((config.name.clone(), model));
        }
        Self::new(members)
    }

    pub fn n_members(&self) -> usize {
        self.members.len()
    }

    /// `(name, member)` pairs in voting order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &EnsembleMember)> {
        self.members.iter().map(|m| (m.name.as_str(), &m.model))
    }

    pub fn member(&self, name: &str) -> Option<&EnsembleMember> {
        self.members.iter().find(|m| m.name == name).map(|m| &m.model)
    }
}

impl Classifier for SoftVotingEnsemble {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut total = Array2::<f32>::zeros((features.nrows(), self.n_classes));
        for member in &self.members {
            total += &member.model.predict_proba(features);
        }
        total /= self.members.len().max(1) as f32;
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GBDTClassifier, MemberSpec, RandomForestClassifier, argmax_rows};
    use crate::training::{GBDTParams, RandomForestParams};
    use approx::assert_relative_eq;

    fn data() -> (Array2<f32>, Vec<u32>) {
        let x = Array2::from_shape_fn((120, 3), |(i, j)| match j {
            0 => (i % 4) as f32 + ((i * 7) % 3) as f32 * 0.1,
            1 => ((i * 11) % 9) as f32,
            _ => ((i * 5) % 4) as f32,
        });
        let y = (0..120).map(|i| (i % 4) as u32).collect();
        (x, y)
    }

    fn configs() -> Vec<MemberConfig> {
        vec![
            MemberConfig::new("gbdt", MemberSpec::Gbdt(GBDTParams { n_trees: 8, ..GBDTParams::xgb() })),
            MemberConfig::new(
                "rf",
                MemberSpec::RandomForest(RandomForestParams { n_trees: 10, ..Default::default() }),
            ),
        ]
    }

    #[test]
    fn proba_is_mean_of_members() {
        let (x, y) = data();
        let ensemble =
            SoftVotingEnsemble::fit(&configs(), x.view(), &y, 4, Verbosity::Silent, Parallelism::Sequential).unwrap();
        assert_eq!(ensemble.n_members(), 2);

        let proba = ensemble.predict_proba(x.view());
        let a = ensemble.member("gbdt").unwrap().predict_proba(x.view());
        let b = ensemble.member("rf").unwrap().predict_proba(x.view());
        for ((p, a), b) in proba.iter().zip(&a).zip(&b) {
            assert_relative_eq!(*p, (a + b) / 2.0, epsilon = 1e-6);
        }
        for row in proba.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-5);
        }
        assert_eq!(ensemble.predict(x.view()), argmax_rows(&proba));
    }

    #[test]
    fn rejects_inconsistent_members() {
        let (x, y) = data();
        let gbdt = |n_classes| {
            GBDTClassifier::fit(
                x.view(),
                &y,
                n_classes,
                GBDTParams { n_trees: 2, ..Default::default() },
                Verbosity::Silent,
                Parallelism::Sequential,
            )
            .unwrap()
        };
        let rf = RandomForestClassifier::fit(
            x.view(),
            &y,
            5,
            RandomForestParams { n_trees: 2, ..Default::default() },
            Verbosity::Silent,
            Parallelism::Sequential,
        )
        .unwrap();

        assert_eq!(SoftVotingEnsemble::new(Vec::new()), Err(TrainError::NoMembers));

        let dup = vec![("a".to_string(), EnsembleMember::Gbdt(gbdt(4))), ("a".to_string(), EnsembleMember::Gbdt(gbdt(4)))];
        assert_eq!(SoftVotingEnsemble::new(dup), Err(TrainError::DuplicateMember("a".into())));

        let mismatch = vec![
            ("a".to_string(), EnsembleMember::Gbdt(gbdt(4))),
            ("b".to_string(), EnsembleMember::RandomForest(rf)),
        ];
        assert_eq!(
            SoftVotingEnsemble::new(mismatch),
            Err(TrainError::MemberMismatch { name: "b".into(), what: "n_classes", expected: 4, found: 5 })
        );
    }
}
