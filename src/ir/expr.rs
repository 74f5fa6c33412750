//! The expression tree the simplifier rewrites.
//!
//! Expressions are an owned recursive tree: interior nodes hold their
//! children in a `Box`. Rewrites are applied through `&mut Expr` borrows
//! rather than through an explicit parent link — in Rust, exclusive access
//! to a subtree through its parent's `&mut` borrow already plays the role
//! a parent pointer would play in a language without a borrow checker.

use core::fmt;

use crate::ir::condcodes::CmpOp;

/// Operand width in bits.
pub type Size = u32;

/// Unary operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum UnOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Bitwise complement, `!x`.
    Not,
    /// Logical negation, `!x` on a boolean-valued expression.
    BoolNot,
    /// Address-of, `&x`.
    AddrOf,
    /// Dereference, `*x`.
    Deref,
}

/// Binary operators, including comparisons.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    BoolAnd,
    BoolOr,
    /// A comparison; the specific relation is carried by [`CmpOp`].
    Cmp(CmpOp),
}

impl BinOp {
    /// True for the operators `constant_folding` evaluates directly.
    pub fn is_foldable_arith(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::And | BinOp::Or | BinOp::Xor
        )
    }

    /// True for the associative operators `ctx_fold_assoc` re-brackets.
    pub fn is_associative(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul | BinOp::And | BinOp::Or | BinOp::Xor)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::And => write!(f, "&"),
            BinOp::Or => write!(f, "|"),
            BinOp::Xor => write!(f, "^"),
            BinOp::Shl => write!(f, "<<"),
            BinOp::Shr => write!(f, ">>"),
            BinOp::BoolAnd => write!(f, "&&"),
            BinOp::BoolOr => write!(f, "||"),
            BinOp::Cmp(cc) => write!(f, "{cc}"),
        }
    }
}

/// Which kind of opaque leaf placeholder an [`Expr::Unknown`] stands in for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum UnknownKind {
    Register,
    Variable,
    Memory,
}

/// Identity of an unknown leaf, assigned by the lifter. Two unknowns with
/// the same `(kind, id)` are the same reference and compare equal.
pub type UnknownId = u32;

/// An expression tree node.
///
/// Every variant carries its own [`Size`] in bits. Equality is purely
/// structural: same variant, same size, equal scalar attributes, and
/// recursively equal operands in order.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum Expr {
    /// A literal integer value.
    Value { value: i64, size: Size },
    /// An opaque leaf: a register, variable, or memory reference.
    Unknown {
        kind: UnknownKind,
        id: UnknownId,
        size: Size,
    },
    /// A unary operator applied to one operand.
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        size: Size,
    },
    /// A binary operator applied to two ordered operands.
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        size: Size,
    },
}

impl Expr {
    /// Build a literal value node.
    pub fn value(value: i64, size: Size) -> Expr {
        Expr::Value { value, size }
    }

    /// Build an unknown leaf node.
    pub fn unknown(kind: UnknownKind, id: UnknownId, size: Size) -> Expr {
        Expr::Unknown { kind, id, size }
    }

    /// Build a unary expression. Size is inherited from the operand.
    pub fn unary(op: UnOp, operand: Expr) -> Expr {
        let size = operand.size();
        Expr::Unary {
            op,
            operand: Box::new(operand),
            size,
        }
    }

    /// Build a binary expression. Size is inherited from the left operand,
    /// matching the rule `constant_folding` uses for its result width.
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        let size = lhs.size();
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            size,
        }
    }

    /// This node's bit width.
    pub fn size(&self) -> Size {
        match self {
            Expr::Value { size, .. }
            | Expr::Unknown { size, .. }
            | Expr::Unary { size, .. }
            | Expr::Binary { size, .. } => *size,
        }
    }

    /// True for a `Value` node carrying exactly `v`.
    pub fn is_value(&self, v: i64) -> bool {
        matches!(self, Expr::Value { value, .. } if *value == v)
    }

    /// The literal value of a `Value` node, if this is one.
    pub fn as_value(&self) -> Option<i64> {
        match self {
            Expr::Value { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Replace this node's identity with `alt` in place. The parent's
    /// operand slot is updated because `self` is reached through it.
    pub fn replace(&mut self, alt: Expr) {
        *self = alt;
    }

    /// Yield every subexpression in post-order (children before parent),
    /// including `self` last. When `deep` is false, only direct operands
    /// are yielded (no recursion into grandchildren).
    pub fn iter_operands(&self, deep: bool) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.walk_post_order(deep, &mut out);
        out
    }

    fn walk_post_order<'a>(&'a self, deep: bool, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::Value { .. } | Expr::Unknown { .. } => {}
            Expr::Unary { operand, .. } => {
                if deep {
                    operand.walk_post_order(deep, out);
                } else {
                    out.push(operand);
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                if deep {
                    lhs.walk_post_order(deep, out);
                    rhs.walk_post_order(deep, out);
                } else {
                    out.push(lhs);
                    out.push(rhs);
                }
            }
        }
        if deep {
            out.push(self);
        }
    }

    /// Direct child operands, left to right, without recursion.
    pub fn children(&self) -> Vec<&Expr> {
        self.iter_operands(false)
    }

    /// Mutable direct child operands, left to right.
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            Expr::Value { .. } | Expr::Unknown { .. } => Vec::new(),
            Expr::Unary { operand, .. } => vec![operand.as_mut()],
            Expr::Binary { lhs, rhs, .. } => vec![lhs.as_mut(), rhs.as_mut()],
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Value { value, .. } => write!(f, "{value}"),
            Expr::Unknown { kind, id, .. } => write!(f, "{kind:?}#{id}"),
            Expr::Unary { op, operand, .. } => write!(f, "{op:?}({operand})"),
            Expr::Binary { op, lhs, rhs, .. } => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_allocation_identity() {
        let a = Expr::binary(BinOp::Add, Expr::value(1, 32), Expr::value(2, 32));
        let b = Expr::binary(BinOp::Add, Expr::value(1, 32), Expr::value(2, 32));
        assert_eq!(a, b);
    }

    #[test]
    fn replace_mutates_in_place() {
        let mut e = Expr::unary(UnOp::Neg, Expr::value(5, 32));
        e.replace(Expr::value(-5, 32));
        assert_eq!(e, Expr::value(-5, 32));
    }

    #[test]
    fn post_order_visits_children_before_self() {
        let e = Expr::binary(BinOp::Add, Expr::value(1, 32), Expr::value(2, 32));
        let order = e.iter_operands(true);
        assert_eq!(order.len(), 3);
        assert_eq!(order[2], &e);
    }
}
