//! A thin statement type: the lifter's unit of top-level expression
//! ownership. This crate does not interpret statement kinds (assignment,
//! call, branch); it only needs access to the expressions a statement
//! holds so `reduce_stmt` can simplify each of them.

use crate::ir::Expr;

/// An ordered collection of top-level expressions owned by one statement.
#[derive(Clone, Debug, Default)]
pub struct Stmt {
    exprs: Vec<Expr>,
}

impl Stmt {
    /// Build a statement from its top-level expressions.
    pub fn new(exprs: Vec<Expr>) -> Stmt {
        Stmt { exprs }
    }

    /// The statement's top-level expressions, in order.
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    /// Mutable access to the statement's top-level expressions, in order.
    pub fn exprs_mut(&mut self) -> &mut [Expr] {
        &mut self.exprs
    }
}
