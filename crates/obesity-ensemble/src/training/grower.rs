//! Histogram-based tree growing.
//!
//! [`TreeGrower`] grows one tree over a [`BinnedMatrix`] for any
//! [`SplitCriterion`]. Two expansion orders are supported:
//!
//! - [`GrowthStrategy::DepthWise`]: every node is split while above
//!   `max_depth`, XGBoost style.
//! - [`GrowthStrategy::LeafWise`]: the leaf with the largest gain is split
//!   next until `max_leaves` is reached, LightGBM style.
//!
//! When features are fixed per tree, only the smaller child's histogram is
//! built from rows and the sibling is derived by subtraction. With per-node
//! feature sampling every node builds its own histogram over its features.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand_xoshiro::Xoshiro256PlusPlus;

use super::binning::BinnedMatrix;
use super::histogram::{Histogram, RowStats};
use super::partition::RowPartitioner;
use super::sampling::ColumnSampler;
use super::split::{SplitCriterion, SplitInfo, find_best_split};
use crate::repr::{LeafValue, MutableTree, NodeId, TreeView};
use crate::utils::Parallelism;

/// Order in which nodes are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GrowthStrategy {
    /// Split every node until `max_depth`.
    DepthWise { max_depth: u32 },
    /// Split the best leaf until `max_leaves`; `max_depth == 0` means unlimited.
    LeafWise { max_leaves: u32, max_depth: u32 },
}

impl GrowthStrategy {
    /// Whether a node at `depth` may still be split.
    #[inline]
    fn depth_allows_split(&self, depth: u32) -> bool {
        match *self {
            GrowthStrategy::DepthWise { max_depth } => depth < max_depth,
            GrowthStrategy::LeafWise { max_depth, .. } => max_depth == 0 || depth < max_depth,
        }
    }
}

/// Structural limits for tree growing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowerParams {
    pub strategy: GrowthStrategy,
    /// Nodes with fewer rows are not split.
    pub min_samples_split: u32,
}

/// A node waiting to be expanded.
struct Candidate {
    node: NodeId,
    depth: u32,
    hist: Option<Histogram>,
    split: Option<SplitInfo>,
}

/// Leaf-wise queue entry: highest gain first, lower node id on ties.
struct Pending(Candidate);

impl Pending {
    fn gain(&self) -> f64 {
        self.0.split.as_ref().map_or(f64::NEG_INFINITY, |s| s.gain)
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain()
            .total_cmp(&other.gain())
            .then_with(|| other.0.node.cmp(&self.0.node))
    }
}

// =============================================================================
// TreeGrower
// =============================================================================

/// Grows single trees over a binned matrix.
pub struct TreeGrower<'a, C: SplitCriterion> {
    binned: &'a BinnedMatrix,
    criterion: &'a C,
    params: GrowerParams,
    parallelism: Parallelism,
    n_bins: usize,
}

/// Mutable state of one growing tree.
struct GrowState<'s, L: LeafValue> {
    tree: MutableTree<L>,
    partitioner: RowPartitioner,
    node_stats: Vec<Vec<f64>>,
    columns: &'s ColumnSampler,
    rng: &'s mut Xoshiro256PlusPlus,
}

impl<'a, C: SplitCriterion> TreeGrower<'a, C> {
    pub fn new(
        binned: &'a BinnedMatrix,
        criterion: &'a C,
        params: GrowerParams,
        parallelism: Parallelism,
    ) -> Self {
        let n_bins = (0..binned.n_features()).map(|f| binned.n_bins(f)).max().unwrap_or(1);
        Self { binned, criterion, params, parallelism, n_bins }
    }

    /// Grow a tree on `rows`.
    ///
    /// `stats` holds the per-row statistics the criterion reads. Leaves get
    /// `leaf_value(node_stats)`.
    pub fn grow<L: LeafValue>(
        &self,
        rows: Vec<u32>,
        stats: RowStats<'_>,
        columns: &ColumnSampler,
        rng: &mut Xoshiro256PlusPlus,
        leaf_value: impl Fn(&[f64]) -> L,
    ) -> MutableTree<L> {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        let root_stats = stats.sum(&rows);

        let mut state = GrowState {
            tree,
            partitioner: RowPartitioner::new(rows),
            node_stats: vec![root_stats],
            columns,
            rng,
        };

        let root = self.evaluate(&mut state, stats, root, 0, None);
        match self.params.strategy {
            GrowthStrategy::DepthWise { .. } => self.grow_depth_wise(&mut state, stats, root),
            GrowthStrategy::LeafWise { max_leaves, .. } => {
                self.grow_leaf_wise(&mut state, stats, root, max_leaves.max(1) as usize)
            }
        }

        let mut tree = state.tree;
        for node in 0..tree.n_nodes() as NodeId {
            if tree.is_leaf(node) {
                tree.make_leaf(node, leaf_value(&state.node_stats[node as usize]));
            }
        }
        tree
    }

    fn grow_depth_wise<L: LeafValue>(&self, state: &mut GrowState<'_, L>, stats: RowStats<'_>, root: Candidate) {
        let mut stack = vec![root];
        while let Some(candidate) = stack.pop() {
            if candidate.split.is_none() {
                continue;
            }
            let (left, right) = self.expand(state, stats, candidate);
            stack.push(right);
            stack.push(left);
        }
    }

    fn grow_leaf_wise<L: LeafValue>(
        &self,
        state: &mut GrowState<'_, L>,
        stats: RowStats<'_>,
        root: Candidate,
        max_leaves: usize,
    ) {
        let mut heap = BinaryHeap::new();
        if root.split.is_some() {
            heap.push(Pending(root));
        }
        let mut n_leaves = 1;
        while n_leaves < max_leaves {
            let Some(Pending(candidate)) = heap.pop() else { break };
            let (left, right) = self.expand(state, stats, candidate);
            n_leaves += 1;
            for child in [left, right] {
                if child.split.is_some() {
                    heap.push(Pending(child));
                }
            }
        }
    }

    /// Apply the candidate's split and evaluate both children.
    fn expand<L: LeafValue>(
        &self,
        state: &mut GrowState<'_, L>,
        stats: RowStats<'_>,
        candidate: Candidate,
    ) -> (Candidate, Candidate) {
        let Candidate { node, depth, hist, split } = candidate;
        let Some(split) = split else {
            unreachable!("only candidates with a split are expanded")
        };

        let (left, right) = state.tree.apply_numeric_split(node, split.feature as u32, split.threshold);
        let column = self.binned.column(split.feature);
        let (n_left, n_right) =
            state.partitioner.split(node, left, right, |row| column[row as usize] as usize <= split.bin);

        let needed = right as usize + 1;
        if state.node_stats.len() < needed {
            state.node_stats.resize(needed, Vec::new());
        }
        state.node_stats[left as usize] = split.left;
        state.node_stats[right as usize] = split.right;

        let depth = depth + 1;
        let left_ok = self.can_split(depth, n_left);
        let right_ok = self.can_split(depth, n_right);

        // Subtraction trick: build the smaller child, derive the larger one.
        let (left_hist, right_hist) = match hist {
            Some(parent) if left_ok && right_ok => {
                let (small, small_is_left) = if n_left <= n_right { (left, true) } else { (right, false) };
                let mut small_hist = Histogram::zeros(parent.features().to_vec(), self.n_bins, self.criterion.width());
                small_hist.build(self.binned, stats, state.partitioner.rows(small), self.parallelism);
                let large_hist = Histogram::subtract(&parent, &small_hist);
                if small_is_left {
                    (Some(small_hist), Some(large_hist))
                } else {
                    (Some(large_hist), Some(small_hist))
                }
            }
            _ => (None, None),
        };

        let left = self.evaluate(state, stats, left, depth, left_hist);
        let right = self.evaluate(state, stats, right, depth, right_hist);
        (left, right)
    }

    /// Find the best split of `node`, building its histogram if needed.
    fn evaluate<L: LeafValue>(
        &self,
        state: &mut GrowState<'_, L>,
        stats: RowStats<'_>,
        node: NodeId,
        depth: u32,
        hist: Option<Histogram>,
    ) -> Candidate {
        if !self.can_split(depth, state.partitioner.count(node)) {
            return Candidate { node, depth, hist: None, split: None };
        }

        let hist = hist.unwrap_or_else(|| {
            let features = state.columns.sample_for_node(state.rng);
            let mut hist = Histogram::zeros(features, self.n_bins, self.criterion.width());
            hist.build(self.binned, stats, state.partitioner.rows(node), self.parallelism);
            hist
        });

        let split = find_best_split(self.criterion, &hist, self.binned, &state.node_stats[node as usize]);
        let keep_hist = split.is_some() && !state.columns.samples_per_node();
        Candidate {
            node,
            depth,
            hist: keep_hist.then_some(hist),
            split,
        }
    }

    #[inline]
    fn can_split(&self, depth: u32, n_rows: usize) -> bool {
        self.params.strategy.depth_allows_split(depth)
            && n_rows >= self.params.min_samples_split.max(2) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::ScalarLeaf;
    use crate::training::split::{GainParams, GiniCriterion};
    use ndarray::Array2;
    use rand::SeedableRng;

    /// Two classes separated on feature 0 at 0.5, feature 1 is noise.
    fn gini_setup(n: usize) -> (Array2<f32>, Vec<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 { i as f32 / n as f32 } else { ((i * 7) % 11) as f32 }
        });
        let mut stats = vec![0.0; n * 3];
        for i in 0..n {
            let class = usize::from(i >= n / 2);
            stats[i * 3 + class] = 1.0;
            stats[i * 3 + 2] = 1.0;
        }
        (x, stats)
    }

    fn params(strategy: GrowthStrategy) -> GrowerParams {
        GrowerParams { strategy, min_samples_split: 2 }
    }

    #[test]
    fn depth_wise_respects_max_depth() {
        let (x, stats) = gini_setup(64);
        let binned = BinnedMatrix::from_features(x.view(), 256, Parallelism::Sequential);
        let gini = GiniCriterion { n_classes: 2, min_samples_leaf: 1 };
        let grower = TreeGrower::new(&binned, &gini, params(GrowthStrategy::DepthWise { max_depth: 1 }), Parallelism::Sequential);

        let columns = ColumnSampler::new(2, 1.0, None);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let tree = grower
            .grow((0..64).collect(), RowStats::new(&stats, 3), &columns, &mut rng, |s| ScalarLeaf(s[1] as f32))
            .freeze();

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.split_index(0), 0);
        // Pure children: class-1 weight 0 on the left, 32 on the right.
        assert_eq!(tree.predict_row(&[0.1, 0.0]).0, 0.0);
        assert_eq!(tree.predict_row(&[0.9, 0.0]).0, 32.0);
    }

    #[test]
    fn pure_nodes_are_not_split() {
        let (x, stats) = gini_setup(32);
        let binned = BinnedMatrix::from_features(x.view(), 256, Parallelism::Sequential);
        let gini = GiniCriterion { n_classes: 2, min_samples_leaf: 1 };
        let grower = TreeGrower::new(&binned, &gini, params(GrowthStrategy::DepthWise { max_depth: 10 }), Parallelism::Sequential);

        let columns = ColumnSampler::new(2, 1.0, None);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let tree = grower
            .grow((0..32).collect(), RowStats::new(&stats, 3), &columns, &mut rng, |s| ScalarLeaf(s[2] as f32))
            .freeze();
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn leaf_wise_caps_leaves() {
        // Regression-like gradients: grad = -i, hess = 1.
        let n = 100;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f32);
        let stats: Vec<f64> = (0..n).flat_map(|i| [-(i as f64), 1.0, 1.0]).collect();
        let binned = BinnedMatrix::from_features(x.view(), 256, Parallelism::Sequential);
        let gain = GainParams { reg_lambda: 0.0, min_child_weight: 0.0, ..Default::default() };

        for max_leaves in [2u32, 5, 8] {
            let strategy = GrowthStrategy::LeafWise { max_leaves, max_depth: 0 };
            let grower = TreeGrower::new(&binned, &gain, params(strategy), Parallelism::Sequential);
            let columns = ColumnSampler::new(1, 1.0, None);
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
            let tree = grower
                .grow((0..n as u32).collect(), RowStats::new(&stats, 3), &columns, &mut rng, |s| {
                    ScalarLeaf(gain.compute_leaf_weight(s[0], s[1]))
                })
                .freeze();
            assert_eq!(tree.n_leaves(), max_leaves as usize);
            assert_eq!(tree.validate(1), Ok(()));
        }
    }

    #[test]
    fn derived_histograms_keep_leaf_counts_exact() {
        // Leaves store the row count their histogram stats claim; it must
        // match the rows that actually reach them.
        let n = 80;
        let (x, _) = gini_setup(n);
        let mut stats = vec![0.0; n * 3];
        for i in 0..n {
            // Overlapping classes so the tree keeps splitting.
            let class = usize::from((i * 7) % 5 < 2) ^ usize::from(i >= n / 2);
            stats[i * 3 + class] = 1.0;
            stats[i * 3 + 2] = 1.0;
        }
        let binned = BinnedMatrix::from_features(x.view(), 256, Parallelism::Sequential);
        let gini = GiniCriterion { n_classes: 2, min_samples_leaf: 3 };
        let strategy = GrowthStrategy::DepthWise { max_depth: 4 };
        let grower = TreeGrower::new(&binned, &gini, params(strategy), Parallelism::Sequential);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let tree = grower
            .grow((0..n as u32).collect(), RowStats::new(&stats, 3), &ColumnSampler::new(2, 1.0, None), &mut rng, |s| {
                ScalarLeaf(s[2] as f32)
            })
            .freeze();
        assert!(tree.n_leaves() > 2);

        let mut reached = vec![0.0f32; tree.n_nodes()];
        for row in x.rows() {
            let features = row.to_vec();
            reached[tree.traverse_to_leaf(&features) as usize] += 1.0;
        }
        for node in 0..tree.n_nodes() as NodeId {
            if tree.is_leaf(node) {
                assert_eq!(tree.leaf_value(node).0, reached[node as usize]);
            }
        }
    }
}
