//! Algebraic expression simplification and control-flow dominance
//! analysis for a decompiler's intermediate representation.
//!
//! Two independent pieces live here:
//!
//! - [`simplify`] rewrites expression trees ([`ir::Expr`]) to a fixed
//!   point using a fixed, ordered set of local rewrite rules.
//! - [`graph`] computes a depth-first spanning tree, a Lengauer–Tarjan
//!   dominator tree, and dominance frontiers over a control-flow graph
//!   whose nodes are opaque caller-supplied keys.
//!
//! Neither component depends on the other.

pub mod error;
pub mod graph;
pub mod ir;
pub mod simplify;
pub mod stmt;

pub use error::GraphError;
pub use graph::{DfSpanningTree, DirectedGraph, DominatorTree};
pub use ir::{BinOp, CmpOp, Expr, UnOp};
pub use simplify::{reduce_expr, reduce_stmt};
pub use stmt::Stmt;
