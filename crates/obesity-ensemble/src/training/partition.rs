//! Row partitioning for tree training.
//!
//! All rows of the tree being grown live in one contiguous buffer. Every node
//! owns a range of it; splitting a node partitions its range in place into
//! two adjacent child ranges.
//!
//! ```text
//! root owns everything:
//!   indices: [0, 1, 2, 3, 4, 5, 6, 7]
//!   node 0 -> 0..8
//!
//! split node 0 into 1 (even rows) and 2 (odd rows):
//!   indices: [0, 2, 4, 6, 1, 3, 5, 7]
//!   node 1 -> 0..4, node 2 -> 4..8
//! ```
//!
//! The partition is stable: rows keep their relative order within a child.

use crate::repr::NodeId;

/// Row index ranges per tree node.
#[derive(Debug, Clone)]
pub struct RowPartitioner {
    indices: Vec<u32>,
    scratch: Vec<u32>,
    node_begin: Vec<usize>,
    node_count: Vec<usize>,
}

impl RowPartitioner {
    /// Start a tree with `rows` at the root (node 0).
    pub fn new(rows: Vec<u32>) -> Self {
        let n = rows.len();
        Self {
            indices: rows,
            scratch: Vec::with_capacity(n),
            node_begin: vec![0],
            node_count: vec![n],
        }
    }

    /// Rows owned by `node`.
    #[inline]
    pub fn rows(&self, node: NodeId) -> &[u32] {
        let begin = self.node_begin[node as usize];
        &self.indices[begin..begin + self.node_count[node as usize]]
    }

    /// Number of rows owned by `node`.
    #[inline]
    pub fn count(&self, node: NodeId) -> usize {
        self.node_count[node as usize]
    }

    /// Split the rows of `node` between `left` and `right`.
    ///
    /// Rows for which `goes_left` is true go to `left`. Returns the child
    /// row counts.
    pub fn split(
        &mut self,
        node: NodeId,
        left: NodeId,
        right: NodeId,
        goes_left: impl Fn(u32) -> bool,
    ) -> (usize, usize) {
        let begin = self.node_begin[node as usize];
        let count = self.node_count[node as usize];
        let range = &mut self.indices[begin..begin + count];

        self.scratch.clear();
        let mut n_left = 0;
        for i in 0..count {
            let row = range[i];
            if goes_left(row) {
                range[n_left] = row;
                n_left += 1;
            } else {
                self.scratch.push(row);
            }
        }
        range[n_left..].copy_from_slice(&self.scratch);

        let needed = left.max(right) as usize + 1;
        if self.node_begin.len() < needed {
            self.node_begin.resize(needed, 0);
            self.node_count.resize(needed, 0);
        }
        self.node_begin[left as usize] = begin;
        self.node_count[left as usize] = n_left;
        self.node_begin[right as usize] = begin + n_left;
        self.node_count[right as usize] = count - n_left;

        (n_left, count - n_left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_stable_and_contiguous() {
        let mut partitioner = RowPartitioner::new((0..8).collect());
        let (n_left, n_right) = partitioner.split(0, 1, 2, |row| row % 2 == 0);

        assert_eq!((n_left, n_right), (4, 4));
        assert_eq!(partitioner.rows(1), &[0, 2, 4, 6]);
        assert_eq!(partitioner.rows(2), &[1, 3, 5, 7]);

        partitioner.split(2, 3, 4, |row| row > 4);
        assert_eq!(partitioner.rows(3), &[5, 7]);
        assert_eq!(partitioner.rows(4), &[1, 3]);
        assert_eq!(partitioner.rows(1), &[0, 2, 4, 6]);
        assert_eq!(partitioner.count(4), 2);
    }

    #[test]
    fn sampled_rows_only() {
        let mut partitioner = RowPartitioner::new(vec![9, 3, 7]);
        partitioner.split(0, 1, 2, |row| row < 5);
        assert_eq!(partitioner.rows(1), &[3]);
        assert_eq!(partitioner.rows(2), &[9, 7]);
    }
}
