//! The fixed, ordered set of rewrite rules the driver applies.
//!
//! Each rule is a pure function from a node to an optional replacement.
//! Rules never look below their own operands for anything but a `Value`
//! literal; they rely on the post-order walk having already simplified
//! children before a parent is visited.

use crate::ir::condcodes::CondCode;
use crate::ir::{BinOp, CmpOp, Expr, UnOp};

/// Width-correct all-ones mask for a `size`-bit value. `1i64 << 64` is
/// undefined, so 64-bit width is handled as the literal all-ones pattern.
fn all_ones_mask(size: u32) -> i64 {
    if size >= 64 {
        -1i64
    } else {
        (1i64 << size) - 1
    }
}

fn as_binary(e: &Expr) -> Option<(BinOp, &Expr, &Expr, u32)> {
    match e {
        Expr::Binary { op, lhs, rhs, size } => Some((*op, lhs, rhs, *size)),
        _ => None,
    }
}

/// Rule 1: identity elimination — `x + 0 -> x`, `x - 0 -> x`, `x * 1 -> x`,
/// `x / 1 -> x`.
pub fn correct_arith(e: &Expr) -> Option<Expr> {
    let (op, lhs, rhs, _) = as_binary(e)?;
    match op {
        BinOp::Add | BinOp::Sub if rhs.is_value(0) => Some((**lhs).clone()),
        BinOp::Mul | BinOp::Div if rhs.is_value(1) => Some((**lhs).clone()),
        _ => None,
    }
}

/// Rule 2: sign correction — `x + (-c) -> x - c`, `x - (-c) -> x + c`.
pub fn correct_sign(e: &Expr) -> Option<Expr> {
    let (op, lhs, rhs, size) = as_binary(e)?;
    let c = rhs.as_value()?;
    if c >= 0 {
        return None;
    }
    match op {
        BinOp::Add => Some(Expr::Binary {
            op: BinOp::Sub,
            lhs: lhs.clone(),
            rhs: Box::new(Expr::value(-c, size)),
            size,
        }),
        BinOp::Sub => Some(Expr::Binary {
            op: BinOp::Add,
            lhs: lhs.clone(),
            rhs: Box::new(Expr::value(-c, size)),
            size,
        }),
        _ => None,
    }
}

/// Rule 3: `&(*x) -> x`, `*(&x) -> x`.
pub fn correct_ref(e: &Expr) -> Option<Expr> {
    match e {
        Expr::Unary { op: UnOp::AddrOf, operand, .. } => match operand.as_ref() {
            Expr::Unary { op: UnOp::Deref, operand: inner, .. } => Some((**inner).clone()),
            _ => None,
        },
        Expr::Unary { op: UnOp::Deref, operand, .. } => match operand.as_ref() {
            Expr::Unary { op: UnOp::AddrOf, operand: inner, .. } => Some((**inner).clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Rule 4: bitwise identities on `Xor`/`Or`/`And`/`Shl`.
pub fn correct_bitwise(e: &Expr) -> Option<Expr> {
    let (op, lhs, rhs, size) = as_binary(e)?;
    match op {
        BinOp::Xor => {
            if rhs.is_value(0) {
                Some((**lhs).clone())
            } else if rhs.as_ref() == lhs.as_ref() {
                Some(Expr::value(0, size))
            } else if rhs.is_value(all_ones_mask(size)) {
                Some(Expr::unary(UnOp::Not, (**lhs).clone()))
            } else {
                None
            }
        }
        BinOp::Or => {
            if rhs.is_value(0) || rhs.as_ref() == lhs.as_ref() {
                Some((**lhs).clone())
            } else if rhs.is_value(all_ones_mask(size)) {
                Some(Expr::value(all_ones_mask(size), size))
            } else {
                None
            }
        }
        BinOp::And => {
            if rhs.is_value(0) {
                Some(Expr::value(0, size))
            } else if rhs.as_ref() == lhs.as_ref() {
                Some((**rhs).clone())
            } else {
                None
            }
        }
        BinOp::Shl => {
            let c = rhs.as_value()?;
            let (inner_op, x, c2, _) = as_binary(lhs)?;
            if inner_op != BinOp::Shr {
                return None;
            }
            let c2 = c2.as_value()?;
            if c2 != c {
                return None;
            }
            let mask = all_ones_mask(c as u32);
            Some(Expr::binary(
                BinOp::And,
                (**x).clone(),
                Expr::unary(UnOp::Not, Expr::value(mask, size)),
            ))
        }
        _ => None,
    }
}

/// Rule 5: equality normalization — constants move across `==`.
pub fn equality(e: &Expr) -> Option<Expr> {
    let (op, lhs, rhs, size) = as_binary(e)?;
    if op != BinOp::Cmp(CmpOp::Eq) {
        return None;
    }
    if let (Some((inner_op, x, c1, _)), Some(c2)) = (as_binary(lhs), rhs.as_value()) {
        if let Some(c1) = c1.as_value() {
            match inner_op {
                BinOp::Add => {
                    return Some(Expr::binary(
                        BinOp::Cmp(CmpOp::Eq),
                        (**x).clone(),
                        Expr::value(c2 - c1, size),
                    ));
                }
                BinOp::Sub => {
                    return Some(Expr::binary(
                        BinOp::Cmp(CmpOp::Eq),
                        (**x).clone(),
                        Expr::value(c2 + c1, size),
                    ));
                }
                _ => {}
            }
        }
    }
    if rhs.is_value(0) {
        if let Some((inner_op, x, y, _)) = as_binary(lhs) {
            match inner_op {
                BinOp::Sub => {
                    return Some(Expr::binary(BinOp::Cmp(CmpOp::Eq), (**x).clone(), (**y).clone()));
                }
                BinOp::Add => {
                    return Some(Expr::binary(
                        BinOp::Cmp(CmpOp::Eq),
                        (**x).clone(),
                        Expr::unary(UnOp::Neg, (**y).clone()),
                    ));
                }
                _ => {}
            }
        }
    }
    None
}

/// Rule 6: push `BoolNot` inward — De Morgan, comparison inversion, and
/// double-negation elimination.
pub fn negate(e: &Expr) -> Option<Expr> {
    let operand = match e {
        Expr::Unary { op: UnOp::BoolNot, operand, .. } => operand.as_ref(),
        _ => return None,
    };
    match operand {
        Expr::Binary { op: BinOp::BoolAnd, lhs, rhs, .. } => Some(Expr::binary(
            BinOp::BoolOr,
            Expr::unary(UnOp::BoolNot, (**lhs).clone()),
            Expr::unary(UnOp::BoolNot, (**rhs).clone()),
        )),
        Expr::Binary { op: BinOp::BoolOr, lhs, rhs, .. } => Some(Expr::binary(
            BinOp::BoolAnd,
            Expr::unary(UnOp::BoolNot, (**lhs).clone()),
            Expr::unary(UnOp::BoolNot, (**rhs).clone()),
        )),
        Expr::Binary { op: BinOp::Cmp(cc), lhs, rhs, .. } => Some(Expr::binary(
            BinOp::Cmp(cc.complement()),
            (**lhs).clone(),
            (**rhs).clone(),
        )),
        Expr::Unary { op: UnOp::BoolNot, operand: inner, .. } => Some((**inner).clone()),
        _ => None,
    }
}

/// Rule 7: fold converged comparisons joined by `BoolOr` over the same
/// operand pair into a single comparison.
pub fn converged_cond(e: &Expr) -> Option<Expr> {
    let (op, lhs, rhs, _) = as_binary(e)?;
    if op != BinOp::BoolOr {
        return None;
    }
    let (lop, lx, ly, _) = as_binary(lhs)?;
    let (rop, rx, ry, _) = as_binary(rhs)?;
    if lx != rx || ly != ry {
        return None;
    }
    let cc = match (lop, rop) {
        (BinOp::Cmp(CmpOp::Gt), BinOp::Cmp(CmpOp::Eq)) | (BinOp::Cmp(CmpOp::Eq), BinOp::Cmp(CmpOp::Gt)) => CmpOp::Ge,
        (BinOp::Cmp(CmpOp::Lt), BinOp::Cmp(CmpOp::Eq)) | (BinOp::Cmp(CmpOp::Eq), BinOp::Cmp(CmpOp::Lt)) => CmpOp::Le,
        (BinOp::Cmp(CmpOp::Lt), BinOp::Cmp(CmpOp::Gt)) | (BinOp::Cmp(CmpOp::Gt), BinOp::Cmp(CmpOp::Lt)) => CmpOp::Ne,
        _ => return None,
    };
    Some(Expr::binary(BinOp::Cmp(cc), (**lx).clone(), (**ly).clone()))
}

fn eval_arith(op: BinOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinOp::Add => Some(a.wrapping_add(b)),
        BinOp::Sub => Some(a.wrapping_sub(b)),
        BinOp::Mul => Some(a.wrapping_mul(b)),
        BinOp::Div => a.checked_div(b),
        BinOp::Mod => a.checked_rem(b),
        BinOp::And => Some(a & b),
        BinOp::Or => Some(a | b),
        BinOp::Xor => Some(a ^ b),
        _ => None,
    }
}

/// Rule 8: fold a binary arithmetic/bitwise expression over two `Value`
/// operands into a single `Value`. Division and modulo by zero simply do
/// not fire.
pub fn constant_folding(e: &Expr) -> Option<Expr> {
    let (op, lhs, rhs, size) = as_binary(e)?;
    if !op.is_foldable_arith() {
        return None;
    }
    let a = lhs.as_value()?;
    let b = rhs.as_value()?;
    debug_assert_eq!(lhs.size(), rhs.size(), "constant_folding over mismatched operand widths");
    let result = eval_arith(op, a, b)?;
    Some(Expr::value(result, size))
}

/// Rule 9: re-bracket `(x op c1) op c0` (same associative operator, both
/// constants) to `x op (c1 op c0)` so a later fold can collapse the
/// constants.
pub fn ctx_fold_assoc(e: &Expr) -> Option<Expr> {
    let (op0, lhs, c0, size) = as_binary(e)?;
    if !op0.is_associative() {
        return None;
    }
    let c0 = c0.as_value()?;
    let (op1, x, c1, _) = as_binary(lhs)?;
    if op0 != op1 {
        return None;
    }
    let c1v = c1.as_value()?;
    Some(Expr::binary(
        op0,
        (**x).clone(),
        Expr::binary(op0, Expr::value(c1v, size), Expr::value(c0, size)),
    ))
}

/// Rule 10: fold `(x op1 c1) op0 c0` (`op0`, `op1` in `{Add, Sub}`) into
/// `x op0 (±c1 + c0)`, folding the sign difference between the two
/// operators into the combined constant.
pub fn ctx_fold_arith(e: &Expr) -> Option<Expr> {
    let (op0, lhs, c0, size) = as_binary(e)?;
    if !matches!(op0, BinOp::Add | BinOp::Sub) {
        return None;
    }
    let c0 = c0.as_value()?;
    let (op1, x, c1, _) = as_binary(lhs)?;
    if !matches!(op1, BinOp::Add | BinOp::Sub) {
        return None;
    }
    let c1 = c1.as_value()?;
    let sign: i64 = if op1 == op0 { 1 } else { -1 };
    let combined = sign.wrapping_mul(c1).wrapping_add(c0);
    Some(Expr::binary(op0, (**x).clone(), Expr::value(combined, size)))
}

/// Try each rule in fixed priority order; return the first match.
pub fn apply_rules(e: &Expr) -> Option<Expr> {
    correct_arith(e)
        .or_else(|| correct_sign(e))
        .or_else(|| correct_ref(e))
        .or_else(|| correct_bitwise(e))
        .or_else(|| equality(e))
        .or_else(|| negate(e))
        .or_else(|| converged_cond(e))
        .or_else(|| constant_folding(e))
        .or_else(|| ctx_fold_assoc(e))
        .or_else(|| ctx_fold_arith(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::UnknownKind;

    fn var(id: u32) -> Expr {
        Expr::unknown(UnknownKind::Variable, id, 32)
    }

    #[test]
    fn add_zero_identity() {
        let e = Expr::binary(BinOp::Add, var(0), Expr::value(0, 32));
        assert_eq!(apply_rules(&e), Some(var(0)));
    }

    #[test]
    fn add_negative_constant_becomes_sub() {
        let e = Expr::binary(BinOp::Add, var(0), Expr::value(-3, 32));
        assert_eq!(apply_rules(&e), Some(Expr::binary(BinOp::Sub, var(0), Expr::value(3, 32))));
    }

    #[test]
    fn double_addrof_deref_cancels() {
        let e = Expr::unary(UnOp::AddrOf, Expr::unary(UnOp::Deref, var(0)));
        assert_eq!(apply_rules(&e), Some(var(0)));
    }

    #[test]
    fn xor_self_is_zero() {
        let e = Expr::binary(BinOp::Xor, var(0), var(0));
        assert_eq!(apply_rules(&e), Some(Expr::value(0, 32)));
    }

    #[test]
    fn and_zero_is_zero() {
        let e = Expr::binary(BinOp::And, var(0), Expr::value(0, 32));
        assert_eq!(apply_rules(&e), Some(Expr::value(0, 32)));
    }

    #[test]
    fn and_self_is_self() {
        let e = Expr::binary(BinOp::And, var(0), var(0));
        assert_eq!(apply_rules(&e), Some(var(0)));
    }

    #[test]
    fn eq_sub_zero_becomes_eq_operands() {
        let e = Expr::binary(
            BinOp::Cmp(CmpOp::Eq),
            Expr::binary(BinOp::Sub, var(0), var(1)),
            Expr::value(0, 32),
        );
        assert_eq!(apply_rules(&e), Some(Expr::binary(BinOp::Cmp(CmpOp::Eq), var(0), var(1))));
    }

    #[test]
    fn bool_not_and_pushes_demorgan() {
        let e = Expr::unary(UnOp::BoolNot, Expr::binary(BinOp::BoolAnd, var(0), var(1)));
        assert_eq!(
            apply_rules(&e),
            Some(Expr::binary(
                BinOp::BoolOr,
                Expr::unary(UnOp::BoolNot, var(0)),
                Expr::unary(UnOp::BoolNot, var(1)),
            ))
        );
    }

    #[test]
    fn bool_not_comparison_inverts() {
        let e = Expr::unary(UnOp::BoolNot, Expr::binary(BinOp::Cmp(CmpOp::Lt), var(0), var(1)));
        assert_eq!(apply_rules(&e), Some(Expr::binary(BinOp::Cmp(CmpOp::Ge), var(0), var(1))));
    }

    #[test]
    fn double_bool_not_cancels() {
        let e = Expr::unary(UnOp::BoolNot, Expr::unary(UnOp::BoolNot, var(0)));
        assert_eq!(apply_rules(&e), Some(var(0)));
    }

    #[test]
    fn converged_gt_eq_becomes_ge() {
        let e = Expr::binary(
            BinOp::BoolOr,
            Expr::binary(BinOp::Cmp(CmpOp::Gt), var(0), var(1)),
            Expr::binary(BinOp::Cmp(CmpOp::Eq), var(0), var(1)),
        );
        assert_eq!(apply_rules(&e), Some(Expr::binary(BinOp::Cmp(CmpOp::Ge), var(0), var(1))));
    }

    #[test]
    fn constant_folding_evaluates() {
        let e = Expr::binary(BinOp::Sub, Expr::value(5, 32), Expr::value(3, 32));
        assert_eq!(apply_rules(&e), Some(Expr::value(2, 32)));
    }

    #[test]
    fn division_by_zero_does_not_fire() {
        let e = Expr::binary(BinOp::Div, Expr::value(5, 32), Expr::value(0, 32));
        assert_eq!(apply_rules(&e), None);
    }

    #[test]
    fn ctx_fold_arith_flips_sign_on_mismatched_operators() {
        // (x + 2) - 3 -> x - 1 (== x + (-1)): outer op is Sub, inner is Add,
        // so the inner constant's sign flips before combining with the outer one.
        let e = Expr::binary(
            BinOp::Sub,
            Expr::binary(BinOp::Add, var(0), Expr::value(2, 32)),
            Expr::value(3, 32),
        );
        assert_eq!(apply_rules(&e), Some(Expr::binary(BinOp::Sub, var(0), Expr::value(1, 32))));
    }

    #[test]
    fn ctx_fold_arith_flips_sign_the_other_way() {
        // (x - 2) + 5 -> x + 3: outer op is Add, inner is Sub, so the inner
        // constant's sign flips the other way.
        let e = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Sub, var(0), Expr::value(2, 32)),
            Expr::value(5, 32),
        );
        assert_eq!(apply_rules(&e), Some(Expr::binary(BinOp::Add, var(0), Expr::value(3, 32))));
    }

    #[test]
    fn assoc_rebrackets_nested_constants() {
        let e = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Add, var(0), Expr::value(2, 32)),
            Expr::value(3, 32),
        );
        let rebracketed = apply_rules(&e).unwrap();
        assert_eq!(
            rebracketed,
            Expr::binary(BinOp::Add, var(0), Expr::binary(BinOp::Add, Expr::value(2, 32), Expr::value(3, 32)))
        );
    }
}
