//! Flattening of nested additions into a single sum.

use crate::{
    step_collector::StepCollector,
    symbolic::{simplify::{rules::same_type, step::Step}, BinaryOp, Expr, ExprKind},
};

/// Returns the terms of the expression if it is an addition, or [`None`] otherwise.
fn addition_terms(expr: &Expr) -> Option<&[Expr]> {
    match expr.kind() {
        ExprKind::Binary(BinaryOp::Add, terms) => Some(terms.as_slice()),
        ExprKind::Sum(terms) => Some(terms.as_slice()),
        _ => None,
    }
}

/// Flattens a chain of additions into a single [`ExprKind::Sum`].
///
/// `a+(b+c) = a+b+c`
/// `(a+b)+c = a+b+c`
pub fn flatten_sum(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let terms = addition_terms(expr)?;
    if !terms.iter().any(|term| addition_terms(term).is_some()) {
        return None;
    }

    let mut new_terms = Vec::new();
    for term in terms {
        match addition_terms(term) {
            Some(inner) => new_terms.extend(inner.iter().cloned()),
            None => new_terms.push(term.clone()),
        }
    }
    let opt = same_type(expr, Expr::sum(new_terms).ok()?)?;

    step_collector.push(Step::FlattenSum);
    Some(opt)
}

/// Applies all flattening rules.
pub fn all(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    flatten_sum(expr, step_collector)
}
