//! Simplification rules for multiplication, division and matrix multiplication.

use crate::{
    step_collector::StepCollector,
    symbolic::{simplify::{rules::{do_binary, same_type}, step::Step}, BinaryOp, Expr},
};

/// `0*a = 0`
/// `a*0 = 0`
/// `0/a = 0`, only when `a` is a non-zero number
/// `0@a = 0`
///
/// The zero takes the shape and domain of the original expression, so a product that evaluated
/// to a vector still does. `0/a` with any other `a` is left alone, as it is NaN wherever `a` is
/// zero.
pub fn multiply_zero(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let either_zero = |lhs: &Expr, rhs: &Expr| {
        if lhs.is_zero() || rhs.is_zero() {
            same_type(expr, expr.zeros_like())
        } else {
            None
        }
    };

    let opt = do_binary(expr, BinaryOp::Mul, either_zero)
        .or_else(|| do_binary(expr, BinaryOp::MatMul, either_zero))
        .or_else(|| do_binary(expr, BinaryOp::Div, |lhs, rhs| {
            let nonzero = rhs.as_scalar().is_some_and(|value| value != 0.0);
            if lhs.is_zero() && nonzero {
                same_type(expr, expr.zeros_like())
            } else {
                None
            }
        }))?;

    step_collector.push(Step::MultiplyZero);
    Some(opt)
}

/// `1*a = a`
/// `a*1 = a`
/// `a/1 = a`
pub fn multiply_one(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let opt = do_binary(expr, BinaryOp::Mul, |lhs, rhs| {
        if lhs.is_one() {
            same_type(expr, rhs.clone())
        } else if rhs.is_one() {
            same_type(expr, lhs.clone())
        } else {
            None
        }
    })
        .or_else(|| do_binary(expr, BinaryOp::Div, |lhs, rhs| {
            if rhs.is_one() {
                same_type(expr, lhs.clone())
            } else {
                None
            }
        }))?;

    step_collector.push(Step::MultiplyOne);
    Some(opt)
}

/// Applies all multiplication rules.
///
/// All multiplication rules will reduce the size of the expression.
pub fn all(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    multiply_zero(expr, step_collector)
        .or_else(|| multiply_one(expr, step_collector))
}
