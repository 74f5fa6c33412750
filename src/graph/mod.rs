//! Control-flow graph analyses: a directed graph keyed by opaque node
//! identifiers, a depth-first spanning tree, and a Lengauer–Tarjan
//! dominator tree with dominance frontiers.

pub mod directed;
pub mod dominator_tree;

pub use directed::DirectedGraph;
pub use dominator_tree::{DfSpanningTree, DominatorTree};
