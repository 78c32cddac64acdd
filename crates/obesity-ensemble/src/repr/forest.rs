//! Canonical forest representation (collection of trees).

use serde::{Deserialize, Serialize};

use super::leaf::{LeafValue, ProbaLeaf, ScalarLeaf};
use super::tree::{Tree, TreeValidationError};

/// Forest of decision trees.
///
/// Each tree is assigned to an output group. Boosted multiclass models use
/// one group per class; a random forest uses a single group whose trees
/// carry full class distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest<L: LeafValue = ScalarLeaf> {
    trees: Vec<Tree<L>>,
    tree_groups: Vec<u32>,
    n_groups: u32,
    base_score: Vec<f32>,
}

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestValidationError {
    #[error("tree {tree}: {source}")]
    InvalidTree {
        tree: usize,
        #[source]
        source: TreeValidationError,
    },

    #[error("tree {tree} assigned to group {group}, forest has {n_groups}")]
    GroupOutOfRange { tree: usize, group: u32, n_groups: u32 },

    #[error("base score has {found} entries, expected {expected}")]
    BaseScoreLength { expected: usize, found: usize },

    #[error("{trees} trees but {groups} group assignments")]
    GroupCountMismatch { trees: usize, groups: usize },
}

impl<L: LeafValue> Forest<L> {
    /// Create an empty forest with the given number of groups.
    pub fn new(n_groups: u32) -> Self {
        Self {
            trees: Vec::new(),
            tree_groups: Vec::new(),
            n_groups,
            base_score: vec![0.0; n_groups as usize],
        }
    }

    /// Set the base score for all groups.
    pub fn with_base_score(mut self, base_score: Vec<f32>) -> Self {
        debug_assert_eq!(base_score.len(), self.n_groups as usize);
        self.base_score = base_score;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree<L>, group: u32) {
        debug_assert!(group < self.n_groups, "group out of range");
        self.trees.push(tree);
        self.tree_groups.push(group);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of output groups.
    #[inline]
    pub fn n_groups(&self) -> u32 {
        self.n_groups
    }

    /// Base score for each group.
    #[inline]
    pub fn base_score(&self) -> &[f32] {
        &self.base_score
    }

    /// A specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree<L> {
        &self.trees[idx]
    }

    /// Group assignment of a tree.
    #[inline]
    pub fn tree_group(&self, idx: usize) -> u32 {
        self.tree_groups[idx]
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree<L>> {
        self.trees.iter()
    }

    /// Iterate over `(tree, group)` pairs.
    pub fn trees_with_groups(&self) -> impl Iterator<Item = (&Tree<L>, u32)> {
        self.trees.iter().zip(self.tree_groups.iter().copied())
    }

    /// Validate every tree and the group bookkeeping.
    pub fn validate(&self, n_features: usize) -> Result<(), ForestValidationError> {
        if self.tree_groups.len() != self.trees.len() {
            return Err(ForestValidationError::GroupCountMismatch {
                trees: self.trees.len(),
                groups: self.tree_groups.len(),
            });
        }
        if self.base_score.len() != self.n_groups as usize {
            return Err(ForestValidationError::BaseScoreLength {
                expected: self.n_groups as usize,
                found: self.base_score.len(),
            });
        }
        for (idx, (tree, group)) in self.trees_with_groups().enumerate() {
            if group >= self.n_groups {
                return Err(ForestValidationError::GroupOutOfRange {
                    tree: idx,
                    group,
                    n_groups: self.n_groups,
                });
            }
            tree.validate(n_features)
                .map_err(|source| ForestValidationError::InvalidTree { tree: idx, source })?;
        }
        Ok(())
    }
}

impl Forest<ScalarLeaf> {
    /// Accumulate raw margins for one row into `out` (one slot per group).
    ///
    /// `out` is overwritten with the base score first.
    pub fn predict_row_into(&self, features: &[f32], out: &mut [f32]) {
        out.copy_from_slice(&self.base_score);
        for (tree, group) in self.trees_with_groups() {
            out[group as usize] += tree.predict_row(features).0;
        }
    }
}

impl Forest<ProbaLeaf> {
    /// Mean class distribution over all trees for one row.
    ///
    /// `out` must have one slot per class.
    pub fn predict_row_into(&self, features: &[f32], out: &mut [f32]) {
        out.fill(0.0);
        for tree in self.trees() {
            for (acc, &p) in out.iter_mut().zip(&tree.predict_row(features).0) {
                *acc += p;
            }
        }
        let n_trees = self.n_trees().max(1) as f32;
        out.iter_mut().for_each(|p| *p /= n_trees);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::MutableTree;

    fn stump<L: LeafValue>(threshold: f32, left: L, right: L) -> Tree<L> {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        let (l, r) = tree.apply_numeric_split(root, 0, threshold);
        tree.make_leaf(l, left);
        tree.make_leaf(r, right);
        tree.freeze()
    }

    #[test]
    fn scalar_forest_sums_per_group() {
        let mut forest = Forest::new(2).with_base_score(vec![0.5, -0.5]);
        forest.push_tree(stump(0.0, ScalarLeaf(1.0), ScalarLeaf(2.0)), 0);
        forest.push_tree(stump(0.0, ScalarLeaf(10.0), ScalarLeaf(20.0)), 1);
        forest.push_tree(stump(1.0, ScalarLeaf(0.25), ScalarLeaf(0.75)), 0);

        let mut out = [0.0; 2];
        forest.predict_row_into(&[0.5], &mut out);
        assert_eq!(out, [0.5 + 2.0 + 0.25, -0.5 + 20.0]);
    }

    #[test]
    fn proba_forest_averages() {
        let mut forest: Forest<ProbaLeaf> = Forest::new(1);
        forest.push_tree(stump(0.0, ProbaLeaf(vec![1.0, 0.0]), ProbaLeaf(vec![0.0, 1.0])), 0);
        forest.push_tree(stump(1.0, ProbaLeaf(vec![0.5, 0.5]), ProbaLeaf(vec![0.0, 1.0])), 0);

        let mut out = [0.0; 2];
        forest.predict_row_into(&[0.5], &mut out);
        assert_eq!(out, [0.25, 0.75]);
    }

    #[test]
    fn validate_checks_groups() {
        let mut forest: Forest<ScalarLeaf> = Forest::new(1);
        forest.push_tree(stump(0.0, ScalarLeaf(0.0), ScalarLeaf(1.0)), 0);
        assert_eq!(forest.validate(1), Ok(()));
        assert!(matches!(forest.validate(0), Err(ForestValidationError::InvalidTree { tree: 0, .. })));
    }
}
