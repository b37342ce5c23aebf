//! Simplification rules for addition, subtraction and negation.

use crate::{
    step_collector::StepCollector,
    symbolic::{
        simplify::{rules::{do_binary, do_sum, do_unary, same_type}, step::Step},
        BinaryOp,
        Expr,
        ExprKind,
        UnaryOp,
    },
};

/// `0+a = a`
/// `a+0 = a`
/// `a-0 = a`
pub fn add_zero(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let opt = do_binary(expr, BinaryOp::Add, |lhs, rhs| {
        if lhs.is_zero() {
            same_type(expr, rhs.clone())
        } else if rhs.is_zero() {
            same_type(expr, lhs.clone())
        } else {
            None
        }
    })
        .or_else(|| do_binary(expr, BinaryOp::Sub, |lhs, rhs| {
            if rhs.is_zero() {
                same_type(expr, lhs.clone())
            } else {
                None
            }
        }))
        .or_else(|| do_sum(expr, |terms| {
            // keep all non-zero terms
            let new_terms = terms.iter()
                .filter(|term| !term.is_zero())
                .cloned()
                .collect::<Vec<_>>();

            match new_terms.len() {
                n if n == terms.len() => None,
                0 => same_type(expr, expr.zeros_like()),
                1 => same_type(expr, new_terms[0].clone()),
                _ => same_type(expr, Expr::sum(new_terms).ok()?),
            }
        }))?;

    // keep the step collection logic outside of the closure to make it implement `Fn`
    step_collector.push(Step::AddZero);
    Some(opt)
}

/// `0-a = -a`
pub fn subtract_from_zero(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let opt = do_binary(expr, BinaryOp::Sub, |lhs, rhs| {
        if lhs.is_zero() {
            same_type(expr, -rhs)
        } else {
            None
        }
    })?;

    step_collector.push(Step::SubtractFromZero);
    Some(opt)
}

/// `--a = a`
pub fn double_negation(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let opt = do_unary(expr, UnaryOp::Neg, |child| {
        match child.kind() {
            ExprKind::Unary(UnaryOp::Neg, inner) => same_type(expr, inner.clone()),
            _ => None,
        }
    })?;

    step_collector.push(Step::DoubleNegation);
    Some(opt)
}

/// Combines the domain-less numbers in a sum into a single term, placed last.
///
/// `2+a+3 = a+5`
pub fn combine_constant_terms(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    let opt = do_sum(expr, |terms| {
        let is_number = |term: &Expr| term.as_scalar().is_some() && term.domain().is_empty();
        if terms.iter().filter(|term| is_number(term)).count() < 2 {
            return None;
        }

        let total = terms.iter()
            .filter_map(|term| if is_number(term) { term.as_scalar() } else { None })
            .sum::<f64>();
        let mut new_terms = terms.iter()
            .filter(|term| !is_number(term))
            .cloned()
            .collect::<Vec<_>>();
        new_terms.push(Expr::scalar(total));

        match new_terms.len() {
            1 => same_type(expr, new_terms.remove(0)),
            _ => same_type(expr, Expr::sum(new_terms).ok()?),
        }
    })?;

    step_collector.push(Step::CombineConstantTerms);
    Some(opt)
}

/// Applies all addition rules.
///
/// All addition rules will reduce the size of the expression.
pub fn all(expr: &Expr, step_collector: &mut dyn StepCollector<Step>) -> Option<Expr> {
    add_zero(expr, step_collector)
        .or_else(|| subtract_from_zero(expr, step_collector))
        .or_else(|| double_negation(expr, step_collector))
        .or_else(|| combine_constant_terms(expr, step_collector))
}
