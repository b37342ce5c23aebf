//! Constant folding.

use crate::{
    numerical::{Eval, Value},
    step_collector::StepCollector,
    symbolic::{simplify::{rules::same_type, step::Step}, Expr, ExprKind, Shape},
};

/// Returns true if folding the expression would lose information the discretiser needs.
///
/// A number on a non-empty domain stands for that number at every mesh node of the domain, so a
/// concatenation of such numbers can only be stacked once the node counts are known.
fn needs_mesh(expr: &Expr) -> bool {
    match expr.kind() {
        ExprKind::Concatenation(children) => children.iter()
            .any(|child| matches!(child.shape(), Shape::Scalar | Shape::Unknown)),
        _ => false,
    }
}

/// Replaces an operator applied to constant operands with its value.
///
/// `2*3 = 6`
/// `exp(0) = 1`
/// `matrix @ vector = vector`
///
/// Folding is skipped if the result is not finite, so that no `NaN` or infinite number ever
/// appears in a simplified tree.
pub fn fold_constant(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    if expr.kind().is_leaf() || !expr.is_constant() || needs_mesh(expr) {
        return None;
    }

    let value = expr.eval_default().ok()?;
    if !value.is_finite() {
        return None;
    }

    let domain = expr.domain().clone();
    let folded = match value {
        Value::Scalar(value) => Expr::scalar_on(value, domain),
        Value::Vector(values) => Expr::vector_on(values, domain),
        Value::Matrix(matrix) => Expr::matrix(matrix).with_domain(domain),
    };
    let opt = same_type(expr, folded)?;

    step_collector.push(Step::FoldConstant);
    Some(opt)
}

/// Applies all folding rules.
pub fn all(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    fold_constant(expr, step_collector)
}
