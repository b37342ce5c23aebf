//! Simplification rules for power expressions.

use nalgebra::DVector;
use crate::{
    step_collector::StepCollector,
    symbolic::{simplify::{rules::{do_binary, same_type}, step::Step}, BinaryOp, Expr, Shape},
};

/// `a^0 = 1`
///
/// `0^0` is defined as `1` by this rule, matching [`f64::powf`].
pub fn power_zero(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let opt = do_binary(expr, BinaryOp::Pow, |_, rhs| {
        if !rhs.is_zero() {
            return None;
        }

        let domain = expr.domain().clone();
        match expr.shape() {
            Shape::Column(n) => same_type(expr, Expr::vector_on(DVector::from_element(n, 1.0), domain)),
            Shape::Scalar | Shape::Unknown => same_type(expr, Expr::scalar_on(1.0, domain)),
            Shape::Matrix(..) => None,
        }
    })?;

    // keep the step collection logic outside of the closure to make it implement `Fn`
    step_collector.push(Step::PowerZero);
    Some(opt)
}

/// `a^1 = a`
pub fn power_one(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let opt = do_binary(expr, BinaryOp::Pow, |lhs, rhs| {
        if rhs.is_one() {
            same_type(expr, lhs.clone())
        } else {
            None
        }
    })?;

    step_collector.push(Step::PowerOne);
    Some(opt)
}

/// Applies all power rules.
///
/// All power rules will reduce the size of the expression.
pub fn all(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    power_zero(expr, step_collector)
        .or_else(|| power_one(expr, step_collector))
}
