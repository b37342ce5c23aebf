//! Module to simplify expressions.
//!
//! This module provides the [`simplify`] function, which reduces the size of an expression
//! without changing the value it evaluates to. It does this by repeatedly applying rewriting
//! rules to every node of the tree, bottom-up, in multiple passes, until no more rules apply.
//!
//! The rules (see [`rules`]) fold constants, eliminate additive and multiplicative identities,
//! and flatten chains of additions into a single [`ExprKind::Sum`](super::ExprKind::Sum), which
//! is cheaper to evaluate. No rule reorders operands, and no rule changes the domain or known
//! shape of the node it rewrites, so a simplified tree can always replace the original.
//!
//! Since passes continue until a pass changes nothing, simplifying an already simplified
//! expression returns it unchanged.

pub mod rules;
pub mod step;

use crate::step_collector::StepCollector;
use std::collections::HashMap;
use step::Step;
use super::Expr;

/// The maximum number of passes over the tree.
pub const MAX_PASSES: usize = 64;

/// Simplifies a single node, whose children are already simplified.
///
/// Returns the new node and true if any rule applied.
fn simplify_node(expr: Expr, step_collector: &mut dyn StepCollector<Step>) -> (Expr, bool) {
    let mut expr = expr;
    let mut changed = false;
    for _ in 0..MAX_PASSES {
        match rules::all(&expr, step_collector) {
            Some(new_expr) => {
                expr = new_expr;
                changed = true;
            },
            None => break,
        }
    }
    (expr, changed)
}

/// Runs one bottom-up pass over the tree, simplifying each distinct node once.
fn simplify_pass(
    expr: &Expr,
    memo: &mut HashMap<usize, Expr>,
    changed: &mut bool,
    step_collector: &mut dyn StepCollector<Step>,
) -> Expr {
    if let Some(simplified) = memo.get(&expr.id()) {
        return simplified.clone();
    }

    // rebuilding cannot fail, since rules preserve the domain and shape of what they rewrite
    let rebuilt = expr
        .map_children(|child| Ok(simplify_pass(child, memo, changed, step_collector)))
        .unwrap_or_else(|_| expr.clone());
    if !rebuilt.ptr_eq(expr) {
        *changed = true;
    }

    let (simplified, node_changed) = simplify_node(rebuilt, step_collector);
    *changed |= node_changed;
    memo.insert(expr.id(), simplified.clone());
    simplified
}

/// Base implementation of the simplification algorithm.
fn inner_simplify(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> (Expr, bool) {
    let mut expr = expr.clone();
    let mut changed_at_least_once = false;

    for pass in 0..MAX_PASSES {
        let mut changed_in_this_pass = false;
        let mut memo = HashMap::new();
        expr = simplify_pass(&expr, &mut memo, &mut changed_in_this_pass, step_collector);
        log::trace!("simplify pass {}: changed = {}", pass, changed_in_this_pass);

        if !changed_in_this_pass {
            break;
        }
        changed_at_least_once = true;
    }

    (expr, changed_at_least_once)
}

/// Simplify the given expression.
pub fn simplify(expr: &Expr) -> Expr {
    inner_simplify(expr, &mut ()).0
}

/// Simplify the given expression. The steps taken by the simplifier will also be collected and
/// returned. This is useful for debugging.
pub fn simplify_with_steps(expr: &Expr) -> (Expr, Vec<Step>) {
    let mut steps = Vec::new();
    let expr = inner_simplify(expr, &mut steps).0;
    (expr, steps)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use crate::numerical::{Ctxt, Eval, Value};
    use crate::symbolic::{exp, sqrt, BinaryOp, Domain, ExprKind};
    use nalgebra::{dvector, DVector};
    use nalgebra_sparse::CsrMatrix;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use super::*;

    fn x() -> Expr {
        Expr::variable("x", "negative electrode")
    }

    fn y() -> Expr {
        Expr::variable("y", "negative electrode")
    }

    #[test]
    fn fold_constants() {
        let expr = ((Expr::scalar(2.0) * 3.0).unwrap() + exp(0.0).unwrap()).unwrap();
        assert_eq!(simplify(&expr), Expr::scalar(7.0));
    }

    #[test]
    fn identities() {
        // 0 + x*1 + 0*y
        let expr = Expr::sum(vec![
            Expr::scalar(0.0),
            (x() * 1.0).unwrap(),
            (0.0 * y()).unwrap(),
        ]).unwrap();
        assert_eq!(simplify(&expr), x());

        let expr = (0.0 - x()).unwrap();
        assert_eq!(simplify(&expr), -x());

        let expr = -(-x());
        assert_eq!(simplify(&expr), x());

        let expr = (x() / 1.0).unwrap().pow(1.0).unwrap();
        assert_eq!(simplify(&expr), x());
    }

    #[test]
    fn multiply_zero_keeps_domain() {
        let expr = (Expr::parameter("k") * 0.0).unwrap();
        let expr = (expr * x()).unwrap();
        let simplified = simplify(&expr);
        assert_eq!(simplified, Expr::scalar_on(0.0, "negative electrode"));
    }

    #[test]
    fn multiply_zero_keeps_shape() {
        let y = Expr::state_vector(0..3, Domain::empty());
        let expr = (&y * 0.0).unwrap();
        assert_eq!(simplify(&expr), Expr::vector(DVector::zeros(3)));
    }

    #[test]
    fn zero_over_unknown_is_kept() {
        let expr = (0.0 / x()).unwrap();
        assert_eq!(simplify(&expr), expr);

        let expr = (0.0 / Expr::scalar(4.0)).unwrap();
        assert_eq!(simplify(&expr), Expr::scalar(0.0));

        // k may be zero once a value is substituted
        let expr = (0.0 / Expr::parameter("k")).unwrap();
        let simplified = simplify(&expr);
        assert!(matches!(simplified.kind(), ExprKind::Binary(BinaryOp::Div, _)));
    }

    #[test]
    fn flatten_sums() {
        let a = Expr::parameter("a");
        let b = Expr::parameter("b");
        let c = Expr::parameter("c");
        let expr = (&a + (&b + (&c + 2.0).unwrap()).unwrap()).unwrap();
        let (simplified, steps) = simplify_with_steps(&expr);
        assert_eq!(simplified, Expr::sum(vec![a, b, c, Expr::scalar(2.0)]).unwrap());
        assert!(steps.contains(&Step::FlattenSum));
    }

    #[test]
    fn combine_constant_terms() {
        let a = Expr::parameter("a");
        let expr = Expr::sum(vec![Expr::scalar(2.0), a.clone(), Expr::scalar(3.0)]).unwrap();
        assert_eq!(simplify(&expr), Expr::sum(vec![a, Expr::scalar(5.0)]).unwrap());
    }

    #[test]
    fn fold_discrete_constants() {
        let m = Expr::matrix(CsrMatrix::identity(2));
        let v = Expr::vector(dvector![1.0, 2.0]);
        let expr = (m.matmul(&v).unwrap() * 3.0).unwrap();
        assert_eq!(simplify(&expr), Expr::vector(dvector![3.0, 6.0]));
    }

    #[test]
    fn never_folds_to_nan() {
        let expr = Expr::scalar(-1.0).pow(0.5).unwrap();
        let simplified = simplify(&expr);
        assert_eq!(simplified, expr);
        assert!(matches!(simplified.kind(), ExprKind::Binary(BinaryOp::Pow, _)));
    }

    #[test]
    fn shared_subtrees_stay_shared() {
        let shared = (x() * 1.0).unwrap();
        let expr = (&shared + &shared).unwrap();
        let simplified = simplify(&expr);
        let children = simplified.children();
        assert!(children[0].ptr_eq(&children[1]));
    }

    #[test]
    fn already_simplified_is_untouched() {
        let expr = ((x() * &y()).unwrap() + 1.0).unwrap();
        let (simplified, steps) = simplify_with_steps(&expr);
        assert!(simplified.ptr_eq(&expr));
        assert!(steps.is_empty());
    }

    /// Builds a random tree over `x` and `y` with the given depth.
    fn random_tree(rng: &mut StdRng, depth: usize) -> Expr {
        if depth == 0 {
            return match rng.gen_range(0..4) {
                0 => x(),
                1 => y(),
                2 => Expr::scalar(rng.gen_range(0..3) as f64),
                _ => Expr::scalar(rng.gen_range(0.5..2.0)),
            };
        }

        let lhs = random_tree(rng, depth - 1);
        let rhs = random_tree(rng, depth - 1);
        match rng.gen_range(0..7) {
            0 => (lhs + rhs).unwrap(),
            1 => (lhs - rhs).unwrap(),
            2 => (lhs * rhs).unwrap(),
            3 => (lhs / ((&rhs * &rhs).unwrap() + 1.0).unwrap()).unwrap(),
            4 => -lhs,
            5 => sqrt((&lhs * &lhs).unwrap() + 1.0).unwrap(),
            _ => lhs.pow(Expr::scalar(rng.gen_range(0..3) as f64)).unwrap(),
        }
    }

    #[test]
    fn preserves_value_and_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(0xba77);
        for _ in 0..200 {
            let expr = random_tree(&mut rng, 4);
            let simplified = simplify(&expr);
            assert_eq!(simplify(&simplified), simplified);

            let mut ctxt = Ctxt::new();
            ctxt.add_var("x", Value::Scalar(rng.gen_range(0.5..1.5)));
            ctxt.add_var("y", Value::Scalar(rng.gen_range(0.5..1.5)));
            let (Value::Scalar(before), Value::Scalar(after)) = (
                expr.eval(&ctxt).unwrap(),
                simplified.eval(&ctxt).unwrap(),
            ) else {
                panic!("expected scalars");
            };
            assert_relative_eq!(before, after, epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}
