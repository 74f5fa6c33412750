//! Error taxonomy for the graph-construction public boundary.
//!
//! Expression simplification never fails: every rule either fires or
//! doesn't, and division/modulo by zero are handled by simply not firing
//! (see `simplify::rules`). Graph construction, on the other hand, can be
//! misused by a caller (an edge referencing an unknown key, a missing
//! root), and those cases get a typed, non-panicking error.

use thiserror::Error;

/// Errors that can occur while building or querying a [`crate::graph::DirectedGraph`]
/// or a [`crate::graph::DominatorTree`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// An edge referenced a key that was never added with `add_node`.
    #[error("edge references unknown node key: {0}")]
    UnknownNode(String),
    /// A dominator tree or spanning tree was requested on a graph with no root set.
    #[error("graph has no root node")]
    NoRoot,
    /// The declared root key was never added with `add_node`.
    #[error("root key is not a node in the graph: {0}")]
    RootNotFound(String),
}
