//! Canonical tree representation (SoA) and mutable construction API.
//!
//! This module provides:
//! - [`Tree`]: Immutable SoA tree storage for traversal
//! - [`MutableTree`]: Builder for constructing trees during training
//! - [`TreeView`]: Read-only trait for unified tree access
//!
//! Splits are numeric only: a row goes left when `value <= threshold`.
//! NaN compares false and therefore goes right.

use serde::{Deserialize, Serialize};

use super::NodeId;
use super::leaf::LeafValue;

// =============================================================================
// TreeView Trait
// =============================================================================

/// Read-only view of a tree for traversal.
///
/// Implemented for both [`Tree`] and [`MutableTree`] so traversal code works
/// during training and at inference.
pub trait TreeView {
    /// The leaf value type.
    type LeafValue: LeafValue;

    /// Number of nodes in the tree.
    fn n_nodes(&self) -> usize;

    /// Check if a node is a leaf.
    fn is_leaf(&self, node: NodeId) -> bool;

    /// Feature index of a split node.
    fn split_index(&self, node: NodeId) -> u32;

    /// Threshold of a split node.
    fn split_threshold(&self, node: NodeId) -> f32;

    /// Left child of a split node.
    fn left_child(&self, node: NodeId) -> NodeId;

    /// Right child of a split node.
    fn right_child(&self, node: NodeId) -> NodeId;

    /// Value of a leaf node.
    fn leaf_value(&self, node: NodeId) -> &Self::LeafValue;

    /// Walk from the root to the leaf reached by `features`.
    #[inline]
    fn traverse_to_leaf(&self, features: &[f32]) -> NodeId {
        let mut node = 0;
        while !self.is_leaf(node) {
            let value = features[self.split_index(node) as usize];
            node = if value <= self.split_threshold(node) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }
        node
    }
}

// =============================================================================
// TreeValidationError
// =============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    EmptyTree,

    #[error("node {node}: {side} child {child} out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },

    #[error("node {node} references itself")]
    SelfLoop { node: NodeId },

    #[error("node {node} is reachable by more than one path")]
    DuplicateVisit { node: NodeId },

    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },

    #[error("node {node} splits on feature {feature}, but the model has {n_features} features")]
    FeatureOutOfBounds {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },

    #[error("array lengths disagree: {0}")]
    LengthMismatch(&'static str),
}

// =============================================================================
// Tree
// =============================================================================

/// Structure-of-Arrays tree storage.
///
/// Child indices are local to this tree (0 = root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree<L: LeafValue> {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f32]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[L]>,
}

impl<L: LeafValue> Tree<L> {
    /// Create a tree from parallel arrays.
    ///
    /// All arrays must have the same length (number of nodes).
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f32>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<L>,
    ) -> Self {
        let n_nodes = split_indices.len();
        debug_assert_eq!(n_nodes, split_thresholds.len());
        debug_assert_eq!(n_nodes, left_children.len());
        debug_assert_eq!(n_nodes, right_children.len());
        debug_assert_eq!(n_nodes, is_leaf.len());
        debug_assert_eq!(n_nodes, leaf_values.len());

        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
        }
    }

    /// A single-leaf tree.
    pub fn constant(value: L) -> Self {
        Self::new(vec![0], vec![0.0], vec![0], vec![0], vec![true], vec![value])
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&leaf| leaf).count()
    }

    /// Depth of the deepest leaf (root-only tree has depth 0).
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                deepest = deepest.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        deepest
    }

    /// Leaf value reached by a single row.
    #[inline]
    pub fn predict_row(&self, features: &[f32]) -> &L {
        self.leaf_value(self.traverse_to_leaf(features))
    }

    /// Validate structural invariants.
    ///
    /// Checks that arrays agree in length, every child index is in bounds,
    /// the nodes form a tree rooted at 0, and split features are below
    /// `n_features`. Used when loading untrusted artifacts.
    pub fn validate(&self, n_features: usize) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        let lengths = [
            self.split_thresholds.len(),
            self.left_children.len(),
            self.right_children.len(),
            self.is_leaf.len(),
            self.leaf_values.len(),
        ];
        if lengths.iter().any(|&len| len != n_nodes) {
            return Err(TreeValidationError::LengthMismatch("tree node arrays"));
        }

        let mut visited = vec![false; n_nodes];
        let mut stack: Vec<NodeId> = vec![0];
        while let Some(node) = stack.pop() {
            let idx = node as usize;
            if visited[idx] {
                return Err(TreeValidationError::DuplicateVisit { node });
            }
            visited[idx] = true;

            if self.is_leaf(node) {
                continue;
            }

            let feature = self.split_index(node);
            if feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfBounds { node, feature, n_features });
            }
            for (side, child) in [("left", self.left_child(node)), ("right", self.right_child(node))] {
                if child == node {
                    return Err(TreeValidationError::SelfLoop { node });
                }
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds { node, side, child, n_nodes });
                }
                stack.push(child);
            }
        }

        match visited.iter().position(|&v| !v) {
            Some(i) => Err(TreeValidationError::UnreachableNode { node: i as NodeId }),
            None => Ok(()),
        }
    }
}

impl<L: LeafValue> TreeView for Tree<L> {
    type LeafValue = L;

    #[inline]
    fn n_nodes(&self) -> usize {
        self.split_indices.len()
    }

    #[inline]
    fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    fn split_threshold(&self, node: NodeId) -> f32 {
        self.split_thresholds[node as usize]
    }

    #[inline]
    fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    fn leaf_value(&self, node: NodeId) -> &L {
        &self.leaf_values[node as usize]
    }
}

// =============================================================================
// MutableTree (training-time construction)
// =============================================================================

/// Mutable tree for use during training.
///
/// Nodes are allocated as placeholder leaves and turned into splits or
/// valued leaves as the grower decides.
#[derive(Debug, Clone)]
pub struct MutableTree<L: LeafValue> {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f32>,
    left_children: Vec<u32>,
    right_children: Vec<u32>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<L>,
}

impl<L: LeafValue> Default for MutableTree<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: LeafValue> MutableTree<L> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a tree with capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            split_indices: Vec::with_capacity(capacity),
            split_thresholds: Vec::with_capacity(capacity),
            left_children: Vec::with_capacity(capacity),
            right_children: Vec::with_capacity(capacity),
            is_leaf: Vec::with_capacity(capacity),
            leaf_values: Vec::with_capacity(capacity),
        }
    }

    /// Reset and allocate the root placeholder. Returns the root id (0).
    pub fn init_root(&mut self) -> NodeId {
        self.split_indices.clear();
        self.split_thresholds.clear();
        self.left_children.clear();
        self.right_children.clear();
        self.is_leaf.clear();
        self.leaf_values.clear();
        self.allocate_node()
    }

    /// Turn `node` into a numeric split, allocating both children.
    ///
    /// Returns `(left_id, right_id)`.
    pub fn apply_numeric_split(&mut self, node: NodeId, feature: u32, threshold: f32) -> (NodeId, NodeId) {
        let left_id = self.allocate_node();
        let right_id = self.allocate_node();

        let idx = node as usize;
        self.split_indices[idx] = feature;
        self.split_thresholds[idx] = threshold;
        self.left_children[idx] = left_id;
        self.right_children[idx] = right_id;
        self.is_leaf[idx] = false;

        (left_id, right_id)
    }

    /// Set a node as a leaf with the given value.
    pub fn make_leaf(&mut self, node: NodeId, value: L) {
        let idx = node as usize;
        self.is_leaf[idx] = true;
        self.leaf_values[idx] = value;
    }

    /// Apply learning rate to all leaf values.
    pub fn apply_learning_rate(&mut self, learning_rate: f32) {
        for (is_leaf, value) in self.is_leaf.iter().zip(self.leaf_values.iter_mut()) {
            if *is_leaf {
                value.scale(learning_rate);
            }
        }
    }

    /// Finalize into immutable storage.
    pub fn freeze(self) -> Tree<L> {
        Tree::new(
            self.split_indices,
            self.split_thresholds,
            self.left_children,
            self.right_children,
            self.is_leaf,
            self.leaf_values,
        )
    }

    fn allocate_node(&mut self) -> NodeId {
        let id = self.split_indices.len() as NodeId;
        self.split_indices.push(0);
        self.split_thresholds.push(0.0);
        self.left_children.push(0);
        self.right_children.push(0);
        self.is_leaf.push(true);
        self.leaf_values.push(L::default());
        id
    }
}

impl<L: LeafValue> TreeView for MutableTree<L> {
    type LeafValue = L;

    fn n_nodes(&self) -> usize {
        self.split_indices.len()
    }

    fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    fn split_threshold(&self, node: NodeId) -> f32 {
        self.split_thresholds[node as usize]
    }

    fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    fn leaf_value(&self, node: NodeId) -> &L {
        &self.leaf_values[node as usize]
    }
}
