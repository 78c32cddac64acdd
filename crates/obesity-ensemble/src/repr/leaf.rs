//! Leaf value types.

use serde::{Deserialize, Serialize};

/// Value stored at a tree leaf.
pub trait LeafValue: Clone + Default + Send + Sync {
    /// Multiply the value by `factor` (shrinkage).
    fn scale(&mut self, factor: f32);
}

/// Single-output leaf: one margin contribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarLeaf(pub f32);

impl LeafValue for ScalarLeaf {
    #[inline]
    fn scale(&mut self, factor: f32) {
        self.0 *= factor;
    }
}

/// Class-distribution leaf: one probability per class, summing to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbaLeaf(pub Vec<f32>);

impl ProbaLeaf {
    /// Normalize class weights into a distribution.
    ///
    /// An all-zero input yields a uniform distribution.
    pub fn from_weights(weights: &[f64]) -> Self {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            let uniform = 1.0 / weights.len().max(1) as f32;
            return Self(vec![uniform; weights.len()]);
        }
        Self(weights.iter().map(|&w| (w / total) as f32).collect())
    }
}

impl LeafValue for ProbaLeaf {
    #[inline]
    fn scale(&mut self, factor: f32) {
        self.0.iter_mut().for_each(|p| *p *= factor);
    }
}
