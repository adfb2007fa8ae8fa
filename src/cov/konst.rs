// Copyright (c) 2016-2020 Fabian Schuiki

//! Constant folding over the expression tree.
//!
//! Folding is a pure recursion that either resolves an expression to a
//! concrete arbitrary-precision integer or reports that the expression is
//! not a compile-time constant. The latter is not an error; only a
//! computation that needs the value (such as resolving a bit selection)
//! turns it into a diagnostic.

use num::{BigInt, One, Signed, Zero};

use crate::ast::{BinaryOp, Expr, ExprData, UnaryOp};

/// Attempt to reduce an expression to a constant integer.
///
/// Returns `None` if the expression is not a compile-time constant. Signal
/// references, selections, concatenations, and replications never are; their
/// values only exist at runtime.
pub fn fold(expr: &Expr) -> Option<BigInt> {
    match expr.data {
        ExprData::IntExpr { ref value, .. } => Some(value.clone()),
        ExprData::UnaryExpr(op, ref arg) => {
            let arg = fold(arg)?;
            apply_unary(op, &arg).ok()
        }
        ExprData::BinaryExpr(op, ref lhs, ref rhs) => {
            let lhs = fold(lhs)?;
            let rhs = fold(rhs)?;
            apply_binary(op, &lhs, &rhs).ok()
        }
        ExprData::CondExpr(ref cond, ref then, ref other) => {
            let cond = fold(cond)?;
            let then = fold(then)?;
            let other = fold(other)?;
            apply_cond(&cond, &then, &other).ok()
        }
        ExprData::SymExpr(_)
        | ExprData::SelectExpr { .. }
        | ExprData::ConcatExpr(_)
        | ExprData::ReplicateExpr { .. } => None,
    }
}

/// Apply a unary operator to a constant value.
pub fn apply_unary(op: UnaryOp, arg: &BigInt) -> Result<BigInt, String> {
    match op {
        UnaryOp::Not => Ok(-arg - 1),
        UnaryOp::Neg => Ok(-arg),
        UnaryOp::LogicNot => Ok(bool_int(arg.is_zero())),
        UnaryOp::RedOr => reduce_nonneg(op, arg, |v| bool_int(!v.is_zero())),
        UnaryOp::RedNor => reduce_nonneg(op, arg, |v| bool_int(v.is_zero())),
        UnaryOp::RedXor => reduce_nonneg(op, arg, |v| bool_int(count_ones(v) % 2 == 1)),
        UnaryOp::RedXnor => reduce_nonneg(op, arg, |v| bool_int(count_ones(v) % 2 == 0)),
        // AND reductions see every bit up to the operand width, which a bare
        // value does not determine.
        UnaryOp::RedAnd | UnaryOp::RedNand => {
            Err(format!("cannot evaluate `{}` without a width", op))
        }
    }
}

/// Apply a binary operator to two constant values.
pub fn apply_binary(op: BinaryOp, lhs: &BigInt, rhs: &BigInt) -> Result<BigInt, String> {
    Ok(match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::And => lhs & rhs,
        BinaryOp::Or => lhs | rhs,
        BinaryOp::Xor => lhs ^ rhs,
        BinaryOp::Eq => bool_int(lhs == rhs),
        BinaryOp::Neq => bool_int(lhs != rhs),
        BinaryOp::Lt => bool_int(lhs < rhs),
        BinaryOp::Leq => bool_int(lhs <= rhs),
        BinaryOp::Gt => bool_int(lhs > rhs),
        BinaryOp::Geq => bool_int(lhs >= rhs),
        BinaryOp::LogicAnd => bool_int(!lhs.is_zero() && !rhs.is_zero()),
        BinaryOp::LogicOr => bool_int(!lhs.is_zero() || !rhs.is_zero()),
    })
}

/// Apply the conditional operator to three constant values.
pub fn apply_cond(cond: &BigInt, then: &BigInt, other: &BigInt) -> Result<BigInt, String> {
    if cond.is_zero() {
        Ok(other.clone())
    } else {
        Ok(then.clone())
    }
}

/// Whether a literal value is representable in the given number of bits,
/// using the standard two's-complement range for that width.
///
/// A non-negative value fits iff its magnitude occupies no more than the
/// full width unsigned; a negative value fits iff it is no less than
/// `-2^(width-1)`.
pub fn bit_fits(value: &BigInt, width: &BigInt) -> bool {
    if value.is_negative() {
        // -2^(w-1) is the most negative representable value. Checking the
        // bit length of |value| - 1 captures the boundary exactly.
        BigInt::from((value.abs() - 1u8).bits()) < *width
    } else {
        BigInt::from(value.bits()) <= *width
    }
}

fn bool_int(b: bool) -> BigInt {
    if b {
        BigInt::one()
    } else {
        BigInt::zero()
    }
}

fn reduce_nonneg<F>(op: UnaryOp, arg: &BigInt, f: F) -> Result<BigInt, String>
where
    F: FnOnce(&BigInt) -> BigInt,
{
    if arg.is_negative() {
        Err(format!("cannot evaluate `{}` of a negative value", op))
    } else {
        Ok(f(arg))
    }
}

fn count_ones(value: &BigInt) -> u64 {
    value
        .to_biguint()
        .map(|v| v.count_ones())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprData::*;
    use mealy_common::source::INVALID_SPAN;

    fn int(value: i64) -> Expr {
        Expr::new(
            INVALID_SPAN,
            IntExpr {
                value: BigInt::from(value),
                width: None,
            },
        )
    }

    fn big(value: i64) -> BigInt {
        BigInt::from(value)
    }

    #[test]
    fn fold_arithmetic() {
        let e = Expr::new(
            INVALID_SPAN,
            BinaryExpr(BinaryOp::Add, Box::new(int(40)), Box::new(int(2))),
        );
        assert_eq!(fold(&e), Some(big(42)));
        let e = Expr::new(INVALID_SPAN, UnaryExpr(UnaryOp::Neg, Box::new(int(7))));
        assert_eq!(fold(&e), Some(big(-7)));
    }

    #[test]
    fn fold_conditional_picks_branch() {
        let e = Expr::new(
            INVALID_SPAN,
            CondExpr(Box::new(int(0)), Box::new(int(1)), Box::new(int(2))),
        );
        assert_eq!(fold(&e), Some(big(2)));
        let e = Expr::new(
            INVALID_SPAN,
            CondExpr(Box::new(int(3)), Box::new(int(1)), Box::new(int(2))),
        );
        assert_eq!(fold(&e), Some(big(1)));
    }

    #[test]
    fn fold_stops_at_runtime_values() {
        let e = Expr::new(
            INVALID_SPAN,
            BinaryExpr(
                BinaryOp::Add,
                Box::new(Expr::new(INVALID_SPAN, SymExpr(crate::symtbl::Symbol(0)))),
                Box::new(int(2)),
            ),
        );
        assert_eq!(fold(&e), None);
    }

    #[test]
    fn fit_boundaries() {
        // 2^w - 1 is the largest value fitting width w.
        assert!(bit_fits(&big(255), &big(8)));
        assert!(!bit_fits(&big(256), &big(8)));
        assert!(bit_fits(&big(256), &big(9)));
        // -2^(w-1) is the smallest.
        assert!(bit_fits(&big(-128), &big(8)));
        assert!(!bit_fits(&big(-129), &big(8)));
        assert!(bit_fits(&big(0), &big(1)));
        // Values far beyond the host integer width must not be truncated.
        let wide: BigInt = BigInt::one() << 100;
        assert!(bit_fits(&(wide.clone() - 1), &big(100)));
        assert!(!bit_fits(&wide, &big(100)));
    }
}
