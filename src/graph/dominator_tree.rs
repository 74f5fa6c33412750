//! Depth-first spanning trees and Lengauer–Tarjan dominator trees over a
//! [`DirectedGraph`].
//!
//! The scratch state the algorithm needs during construction (`semi`,
//! `ancestor`, `best`, `samedom`, `bucket`) is kept in parallel maps
//! rather than stored on the public node type, and is dropped once
//! `build` returns — cranelift-codegen's `DominatorTree` keeps its
//! working set on `DomNode` directly because its nodes are never exposed
//! outside the crate; ours are, so we don't carry construction-only
//! fields on them.

use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::error::GraphError;
use crate::graph::directed::DirectedGraph;

/// A depth-first spanning tree over a rooted [`DirectedGraph`]: the tree
/// edges discovered by a DFS from the graph's root, plus each node's
/// pre-order rank (`dfnum`).
pub struct DfSpanningTree<K> {
    order: Vec<K>,
    dfnum: IndexMap<K, u32>,
    parent: IndexMap<K, Option<K>>,
}

impl<K> DfSpanningTree<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    /// Run a depth-first walk from `graph`'s root, recording tree edges
    /// and pre-order numbers. Explicit-stack, not recursive, so a deep
    /// CFG cannot overflow the call stack.
    pub fn build(graph: &DirectedGraph<K>) -> Result<Self, GraphError> {
        let root = graph.root().cloned().ok_or(GraphError::NoRoot)?;
        if !graph.contains(&root) {
            return Err(GraphError::RootNotFound(format!("{root:?}")));
        }

        let mut order = Vec::new();
        let mut dfnum = IndexMap::new();
        let mut parent = IndexMap::new();
        let mut visited: HashSet<K> = HashSet::new();
        let mut stack: Vec<(K, Option<K>)> = vec![(root, None)];

        while let Some((node, par)) = stack.pop() {
            if visited.contains(&node) {
                continue;
            }
            visited.insert(node.clone());
            dfnum.insert(node.clone(), order.len() as u32);
            parent.insert(node.clone(), par);
            order.push(node.clone());

            for succ in graph.successors(&node).iter().rev() {
                if !visited.contains(succ) {
                    stack.push((succ.clone(), Some(node.clone())));
                }
            }
        }

        Ok(DfSpanningTree { order, dfnum, parent })
    }

    /// Nodes in DFS pre-order.
    pub fn iter_nodes(&self) -> &[K] {
        &self.order
    }

    /// True if `key` was reached by the DFS.
    pub fn contains(&self, key: &K) -> bool {
        self.dfnum.contains_key(key)
    }

    /// `key`'s pre-order rank, or `None` if unreached.
    pub fn dfnum(&self, key: &K) -> Option<u32> {
        self.dfnum.get(key).copied()
    }

    /// `key`'s tree predecessor; `None` for the root or an unreached node.
    pub fn parent(&self, key: &K) -> Option<&K> {
        self.parent.get(key).and_then(|p| p.as_ref())
    }
}

/// Path-compressing lookup of the ancestor of `v` (within the
/// partially-linked forest `ancestor`) whose semidominator has the
/// lowest `dfnum`. Classic Lengauer–Tarjan `AncestorWithLowestSemi`.
fn ancestor_with_lowest_semi<K>(
    v: &K,
    ancestor: &mut IndexMap<K, Option<K>>,
    best: &mut IndexMap<K, K>,
    semi: &IndexMap<K, K>,
    tree: &DfSpanningTree<K>,
) -> K
where
    K: Clone + Eq + Hash,
{
    let a = match ancestor.get(v).cloned().flatten() {
        Some(a) => a,
        None => return best.get(v).cloned().expect("best is initialized for every node"),
    };
    if ancestor.get(&a).cloned().flatten().is_some() {
        let compressed = ancestor_with_lowest_semi(&a, ancestor, best, semi, tree);
        let grandancestor = ancestor.get(&a).cloned().flatten();
        ancestor.insert(v.clone(), grandancestor);

        let v_best = best.get(v).cloned().expect("best is initialized for every node");
        let v_best_semi_dfnum = tree.dfnum(semi.get(&v_best).unwrap()).unwrap();
        let compressed_semi_dfnum = tree.dfnum(semi.get(&compressed).unwrap()).unwrap();
        if compressed_semi_dfnum < v_best_semi_dfnum {
            best.insert(v.clone(), compressed);
        }
    }
    best.get(v).cloned().expect("best is initialized for every node")
}

/// A dominator tree over the same node keys as the source CFG, with
/// memoized per-node dominance frontiers.
pub struct DominatorTree<K> {
    root: K,
    idom: IndexMap<K, Option<K>>,
    children: IndexMap<K, Vec<K>>,
    graph: DirectedGraph<K>,
    df_cache: RefCell<IndexMap<K, IndexSet<K>>>,
}

impl<K> DominatorTree<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    /// Compute the dominator tree of `graph` using the Lengauer–Tarjan
    /// algorithm. `graph` must have a root; nodes unreachable from it are
    /// silently omitted (see [`DirectedGraph::unreachable_from_root`] for
    /// a caller-facing diagnostic).
    pub fn build(graph: DirectedGraph<K>) -> Result<Self, GraphError> {
        let tree = DfSpanningTree::build(&graph)?;
        let root = graph.root().cloned().expect("DfSpanningTree::build already checked for a root");

        let mut semi: IndexMap<K, K> = IndexMap::new();
        let mut ancestor: IndexMap<K, Option<K>> = IndexMap::new();
        let mut best: IndexMap<K, K> = IndexMap::new();
        let mut samedom: IndexMap<K, Option<K>> = IndexMap::new();
        let mut bucket: IndexMap<K, Vec<K>> = IndexMap::new();
        let mut idom: IndexMap<K, Option<K>> = IndexMap::new();

        for key in tree.iter_nodes() {
            semi.insert(key.clone(), key.clone());
            ancestor.insert(key.clone(), None);
            best.insert(key.clone(), key.clone());
            samedom.insert(key.clone(), None);
            bucket.insert(key.clone(), Vec::new());
            idom.insert(key.clone(), None);
        }

        for i in (1..tree.iter_nodes().len()).rev() {
            let n = tree.iter_nodes()[i].clone();
            let p = tree.parent(&n).cloned().expect("non-root node has a tree parent");
            let mut s = p.clone();

            for pred in graph.predecessors(&n) {
                if !tree.contains(pred) {
                    // Predecessor unreachable from root: not part of the
                    // spanning tree, and so cannot affect semidominators.
                    continue;
                }
                let v = pred.clone();
                let candidate = if tree.dfnum(&v).unwrap() <= tree.dfnum(&n).unwrap() {
                    v
                } else {
                    let y = ancestor_with_lowest_semi(&v, &mut ancestor, &mut best, &semi, &tree);
                    semi.get(&y).unwrap().clone()
                };
                if tree.dfnum(&candidate).unwrap() < tree.dfnum(&s).unwrap() {
                    s = candidate;
                }
            }

            semi.insert(n.clone(), s.clone());
            bucket.get_mut(&s).unwrap().push(n.clone());

            ancestor.insert(n.clone(), Some(p.clone()));
            best.insert(n.clone(), n.clone());

            let p_bucket = std::mem::take(bucket.get_mut(&p).unwrap());
            for v in p_bucket {
                let y = ancestor_with_lowest_semi(&v, &mut ancestor, &mut best, &semi, &tree);
                if semi.get(&y).unwrap() == semi.get(&v).unwrap() {
                    idom.insert(v, Some(p.clone()));
                } else {
                    samedom.insert(v, Some(y));
                }
            }
        }

        for i in 1..tree.iter_nodes().len() {
            let n = tree.iter_nodes()[i].clone();
            if let Some(sd) = samedom.get(&n).cloned().flatten() {
                let sd_idom = idom.get(&sd).cloned().flatten();
                idom.insert(n, sd_idom);
            }
        }
        idom.insert(root.clone(), None);

        let mut children: IndexMap<K, Vec<K>> = IndexMap::new();
        for key in tree.iter_nodes() {
            children.insert(key.clone(), Vec::new());
        }
        for key in tree.iter_nodes() {
            if let Some(id) = idom.get(key).cloned().flatten() {
                children.get_mut(&id).unwrap().push(key.clone());
            }
        }

        log::trace!(
            "dominator_tree::build: {} node(s), {} reachable",
            graph.len(),
            tree.iter_nodes().len()
        );

        Ok(DominatorTree {
            root,
            idom,
            children,
            graph,
            df_cache: RefCell::new(IndexMap::new()),
        })
    }

    /// This node's immediate dominator, or `None` for the root.
    pub fn idom(&self, key: &K) -> Option<&K> {
        self.idom.get(key).and_then(|p| p.as_ref())
    }

    /// This node's children in the dominator tree, insertion order not
    /// meaningful beyond being stable across calls.
    pub fn children(&self, key: &K) -> &[K] {
        self.children.get(key).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// True if `v` dominates `u` (every path from the root to `u` passes
    /// through `v`), including the trivial case `v == u`.
    pub fn dominates(&self, v: &K, u: &K) -> bool {
        let mut cur = u.clone();
        loop {
            if cur == *v {
                return true;
            }
            if cur == self.root {
                return false;
            }
            match self.idom(&cur) {
                Some(next) => cur = next.clone(),
                None => return false,
            }
        }
    }

    /// True if `v` dominates `u` and `v != u`.
    pub fn strictly_dominates(&self, v: &K, u: &K) -> bool {
        v != u && self.dominates(v, u)
    }

    /// The dominance frontier of `n`: nodes where `n`'s dominance ends.
    /// Computed lazily and memoized.
    pub fn dominance_frontier(&self, n: &K) -> IndexSet<K> {
        if let Some(cached) = self.df_cache.borrow().get(n) {
            return cached.clone();
        }
        let df = self.compute_df(n);
        self.df_cache.borrow_mut().insert(n.clone(), df.clone());
        df
    }

    fn compute_df(&self, n: &K) -> IndexSet<K> {
        let mut df = IndexSet::new();

        for y in self.graph.successors(n) {
            if self.idom(y) != Some(n) {
                df.insert(y.clone());
            }
        }

        for c in self.children(n).to_vec() {
            for w in self.dominance_frontier(&c) {
                if !self.dominates(n, &w) || *n == w {
                    df.insert(w);
                }
            }
        }

        df
    }
}
