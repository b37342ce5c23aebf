//! Implementation of the simplification rules.
//!
//! Each rule in this module is a function that takes the expression to simplify as an argument,
//! and returns `Some(expr)` with the simplified expression if the rule applies, or `None` if the
//! rule does not apply.
//!
//! A rule must never change the domain of the expression, or its shape once that shape is
//! known; [`same_type`] is used to reject rewrites that would.

pub mod add;
pub mod flatten;
pub mod fold;
pub mod multiply;
pub mod power;

use crate::step_collector::StepCollector;
use crate::symbolic::{BinaryOp, Expr, ExprKind, Shape, UnaryOp};
use super::step::Step;

/// If the expression is a binary expression with the given operator, calls the given
/// transformation function with the left and right-hand-side operands.
///
/// Returns `Some(expr)` with the transformed expression if a transformation was applied.
pub(crate) fn do_binary(
    expr: &Expr,
    op: BinaryOp,
    f: impl Copy + Fn(&Expr, &Expr) -> Option<Expr>,
) -> Option<Expr> {
    match expr.kind() {
        ExprKind::Binary(target, [lhs, rhs]) if *target == op => f(lhs, rhs),
        _ => None,
    }
}

/// If the expression is a unary expression with the given operator, calls the given
/// transformation function with the operand.
///
/// Returns `Some(expr)` with the transformed expression if a transformation was applied.
pub(crate) fn do_unary(
    expr: &Expr,
    op: UnaryOp,
    f: impl Copy + Fn(&Expr) -> Option<Expr>,
) -> Option<Expr> {
    match expr.kind() {
        ExprKind::Unary(target, child) if *target == op => f(child),
        _ => None,
    }
}

/// If the expression is a flattened sum, calls the given transformation function with the
/// terms.
///
/// Returns `Some(expr)` with the transformed expression if a transformation was applied.
pub(crate) fn do_sum(expr: &Expr, f: impl Copy + Fn(&[Expr]) -> Option<Expr>) -> Option<Expr> {
    match expr.kind() {
        ExprKind::Sum(terms) => f(terms),
        _ => None,
    }
}

/// Returns `Some(new)` if `new` has the same domain as `old`, and the same shape if the shape of
/// `old` is known.
pub(crate) fn same_type(old: &Expr, new: Expr) -> Option<Expr> {
    let same_shape = old.shape() == Shape::Unknown || old.shape() == new.shape();
    if same_shape && old.domain() == new.domain() {
        Some(new)
    } else {
        None
    }
}

/// Applies all rules.
pub fn all(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    fold::all(expr, step_collector)
        .or_else(|| multiply::all(expr, step_collector))
        .or_else(|| add::all(expr, step_collector))
        .or_else(|| power::all(expr, step_collector))
        .or_else(|| flatten::all(expr, step_collector))
}
