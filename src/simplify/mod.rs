//! Fixed-point algebraic simplification of expression trees.
//!
//! `reduce_expr` walks the tree in post-order, trying the rules in
//! `rules` in priority order at each subexpression. The first rewrite
//! found terminates that pass; passes repeat until one finds nothing to
//! rewrite. See `rules` for the rule set itself.

mod rules;

use crate::ir::Expr;
use crate::stmt::Stmt;

/// One pass over `e`: recurse into children first, then try the rule set
/// on `e` itself. Returns `true` and stops as soon as any rewrite fires
/// anywhere in the tree.
fn rewrite_pass(e: &mut Expr) -> bool {
    for child in e.children_mut() {
        if rewrite_pass(child) {
            return true;
        }
    }
    if let Some(alt) = rules::apply_rules(e) {
        log::trace!("simplify: {e} -> {alt}");
        e.replace(alt);
        return true;
    }
    false
}

/// Simplify `expr` in place to a fixed point: repeat passes until none of
/// them find a rewrite.
pub fn reduce_expr(expr: &mut Expr) {
    log::trace!("reduce_expr: start {expr}");
    let mut passes = 0u32;
    while rewrite_pass(expr) {
        passes += 1;
    }
    log::trace!("reduce_expr: done after {passes} rewrite(s): {expr}");
}

/// Simplify every top-level expression a statement owns.
pub fn reduce_stmt(stmt: &mut Stmt) {
    for expr in stmt.exprs_mut() {
        reduce_expr(expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, CmpOp, UnOp, UnknownKind};

    fn var(id: u32) -> Expr {
        Expr::unknown(UnknownKind::Variable, id, 32)
    }

    #[test]
    fn converges_through_multiple_rules() {
        // (x * 1) + 0 -> x
        let mut e = Expr::binary(BinOp::Add, Expr::binary(BinOp::Mul, var(0), Expr::value(1, 32)), Expr::value(0, 32));
        reduce_expr(&mut e);
        assert_eq!(e, var(0));
    }

    #[test]
    fn fold_agrees_with_native_arith() {
        let mut e = Expr::binary(BinOp::Sub, Expr::value(5, 32), Expr::value(3, 32));
        reduce_expr(&mut e);
        assert_eq!(e, Expr::value(2, 32));
    }

    #[test]
    fn reassociates_and_collapses_constants() {
        let mut e = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Add, var(0), Expr::value(2, 32)),
            Expr::value(3, 32),
        );
        reduce_expr(&mut e);
        assert_eq!(e, Expr::binary(BinOp::Add, var(0), Expr::value(5, 32)));
    }

    #[test]
    fn equality_of_difference_and_zero() {
        let mut e = Expr::binary(
            BinOp::Cmp(CmpOp::Eq),
            Expr::binary(BinOp::Sub, var(0), var(1)),
            Expr::value(0, 32),
        );
        reduce_expr(&mut e);
        assert_eq!(e, Expr::binary(BinOp::Cmp(CmpOp::Eq), var(0), var(1)));
    }

    #[test]
    fn double_negation_cancels_after_reduction() {
        let mut e = Expr::unary(UnOp::BoolNot, Expr::unary(UnOp::BoolNot, var(0)));
        reduce_expr(&mut e);
        assert_eq!(e, var(0));
    }

    #[test]
    fn idempotent_on_already_simplified_tree() {
        let mut e = var(0);
        reduce_expr(&mut e);
        let once = e.clone();
        reduce_expr(&mut e);
        assert_eq!(e, once);
    }

    #[test]
    fn reduce_stmt_simplifies_every_top_level_expr() {
        let mut stmt = Stmt::new(vec![
            Expr::binary(BinOp::Add, var(0), Expr::value(0, 32)),
            Expr::binary(BinOp::Mul, var(1), Expr::value(1, 32)),
        ]);
        reduce_stmt(&mut stmt);
        assert_eq!(stmt.exprs(), &[var(0), var(1)]);
    }
}
