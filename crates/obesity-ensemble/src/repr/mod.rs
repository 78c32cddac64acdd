//! Decision tree and forest representations shared by all tree models.

/// Node identifier: an index into a tree's SoA arrays.
pub type NodeId = u32;

mod forest;
mod leaf;
mod tree;

pub use forest::{Forest, ForestValidationError};
pub use leaf::{LeafValue, ProbaLeaf, ScalarLeaf};
pub use tree::{MutableTree, Tree, TreeValidationError, TreeView};
