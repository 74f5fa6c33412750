//! A directed graph keyed by an externally supplied, opaque key type.
//!
//! Nodes are stored in an [`IndexMap`] so iteration order matches
//! insertion order — callers that key nodes by basic-block address get a
//! graph whose `iter_nodes()` order is observable and stable, the same
//! property `ControlFlowGraph`'s `SecondaryMap<Block, _>` gets for free
//! from `Block`'s internally sequential numbering. Because our keys are
//! supplied by the caller rather than allocated by us, an `IndexMap` is
//! the structure that gets us the same property for an arbitrary `K`.

use std::hash::Hash;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::GraphError;

/// Per-node adjacency. Most basic blocks have one or two successors, so a
/// small inline capacity avoids a heap allocation for the common case.
#[derive(Clone, Default)]
struct GraphNode<K> {
    predecessors: SmallVec<[K; 4]>,
    successors: SmallVec<[K; 4]>,
}

/// A directed graph over externally-keyed nodes, with an optional root.
#[derive(Clone)]
pub struct DirectedGraph<K> {
    nodes: IndexMap<K, GraphNode<K>>,
    root: Option<K>,
}

impl<K> Default for DirectedGraph<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DirectedGraph<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    /// An empty graph with no nodes and no root.
    pub fn new() -> Self {
        DirectedGraph {
            nodes: IndexMap::new(),
            root: None,
        }
    }

    /// Add a node for `key`. Re-adding an existing key resets its
    /// adjacency (matches `SecondaryMap::resize`'s clear-on-grow
    /// behavior in cranelift-codegen's `ControlFlowGraph::clear`).
    pub fn add_node(&mut self, key: K) {
        self.nodes.insert(key, GraphNode::default());
    }

    /// True if `key` has been added.
    pub fn contains(&self, key: &K) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declare `key` the graph's root. Fails if `key` was never added.
    pub fn set_root(&mut self, key: K) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&key) {
            return Err(GraphError::RootNotFound(format!("{key:?}")));
        }
        self.root = Some(key);
        Ok(())
    }

    /// The declared root, if any.
    pub fn root(&self) -> Option<&K> {
        self.root.as_ref()
    }

    /// Add a directed edge `from -> to`. Both endpoints must already be
    /// nodes in the graph.
    pub fn add_edge(&mut self, from: K, to: K) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&from) {
            return Err(GraphError::UnknownNode(format!("{from:?}")));
        }
        if !self.nodes.contains_key(&to) {
            return Err(GraphError::UnknownNode(format!("{to:?}")));
        }
        self.nodes[&from].successors.push(to.clone());
        self.nodes[&to].predecessors.push(from);
        Ok(())
    }

    /// Successors of `key`, in edge-insertion order.
    pub fn successors(&self, key: &K) -> &[K] {
        self.nodes.get(key).map(|n| n.successors.as_slice()).unwrap_or(&[])
    }

    /// Predecessors of `key`, in edge-insertion order.
    pub fn predecessors(&self, key: &K) -> &[K] {
        self.nodes.get(key).map(|n| n.predecessors.as_slice()).unwrap_or(&[])
    }

    /// Every node key, in insertion order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &K> {
        self.nodes.keys()
    }

    /// Nodes not reachable from the root by following successor edges.
    /// An ambient diagnostic: the dominator-tree build silently drops
    /// unreachable nodes (see `graph::dominator_tree`), and a caller who
    /// wants to know why can ask here instead of that being forced on
    /// every build.
    pub fn unreachable_from_root(&self) -> Vec<K> {
        let mut visited = std::collections::HashSet::new();
        if let Some(root) = &self.root {
            let mut stack = vec![root.clone()];
            while let Some(key) = stack.pop() {
                if visited.insert(key.clone()) {
                    for succ in self.successors(&key) {
                        stack.push(succ.clone());
                    }
                }
            }
        }
        self.nodes.keys().filter(|k| !visited.contains(*k)).cloned().collect()
    }
}
