use bamm_error::Error;
use std::collections::HashMap;
use crate::symbolic::{
    error::{ShapeMismatch, UnresolvedSymbol},
    Expr,
    ExprKind,
    UnaryOp,
};
use super::{ctxt::Ctxt, error::{MissingInput, StateOutOfRange}, value::Value};

/// Any type that can be evaluated to produce a value.
pub trait Eval {
    /// Evaluate the expression to produce a value, using the given context.
    fn eval(&self, ctxt: &Ctxt) -> Result<Value, Error>;

    /// Evaluate the expression to produce a value, using an empty context.
    fn eval_default(&self) -> Result<Value, Error> {
        self.eval(&Ctxt::default())
    }
}

impl Eval for Expr {
    fn eval(&self, ctxt: &Ctxt) -> Result<Value, Error> {
        Evaluator { ctxt, memo: HashMap::new() }.eval(self)
    }
}

/// Evaluates a tree, computing each shared sub-tree once.
struct Evaluator<'a> {
    ctxt: &'a Ctxt,
    memo: HashMap<usize, Value>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> Result<Value, Error> {
        if let Some(value) = self.memo.get(&expr.id()) {
            return Ok(value.clone());
        }

        let value = self.eval_node(expr)?;
        if expr.children().len() > 0 {
            self.memo.insert(expr.id(), value.clone());
        }
        Ok(value)
    }

    fn eval_node(&mut self, expr: &Expr) -> Result<Value, Error> {
        let unresolved = |kind: &'static str, name: &str| expr.error(UnresolvedSymbol {
            kind,
            name: name.to_string(),
        });

        match expr.kind() {
            ExprKind::Scalar(value) => Ok(Value::Scalar(*value)),
            ExprKind::Vector(values) => Ok(Value::Vector(values.clone())),
            ExprKind::Matrix(matrix) => Ok(Value::Matrix(matrix.clone())),
            ExprKind::Time => Ok(Value::Scalar(self.ctxt.time)),
            ExprKind::StateVector(range) => {
                if range.end > self.ctxt.state.len() {
                    return Err(expr.error(StateOutOfRange {
                        range: range.clone(),
                        len: self.ctxt.state.len(),
                    }));
                }
                Ok(Value::Vector(self.ctxt.state.rows(range.start, range.len()).into_owned()))
            },
            ExprKind::InputParameter(name) => self.ctxt.get_input(name)
                .map(Value::Scalar)
                .ok_or_else(|| expr.error(MissingInput {
                    name: name.clone(),
                    suggestions: self.ctxt.get_similar(name)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                })),
            ExprKind::Variable(name) => self.ctxt.get_var(name)
                .cloned()
                .ok_or_else(|| unresolved("variable", name)),
            ExprKind::SpatialVariable(name) => self.ctxt.get_var(name)
                .cloned()
                .ok_or_else(|| unresolved("spatial variable", name)),
            ExprKind::Parameter(name) => Err(unresolved("parameter", name)),
            ExprKind::FunctionParameter(name, _) => Err(unresolved("function parameter", name)),
            ExprKind::Unary(op, child) => {
                if op.is_spatial() {
                    return Err(unresolved("spatial operator", op.name()));
                }
                let value = self.eval(child)?;
                match op {
                    UnaryOp::Function(func) => value.apply(*func)
                        .ok_or_else(|| expr.children_error(&[0, 1], ShapeMismatch {
                            op: func.name().to_string(),
                            left: value.shape(),
                            right: value.shape(),
                        })),
                    _ => Ok(value.neg()),
                }
            },
            ExprKind::Binary(op, [lhs, rhs]) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Value::binary(*op, &lhs, &rhs)
                    .ok_or_else(|| expr.children_error(&[0, 1], ShapeMismatch {
                        op: op.symbol().to_string(),
                        left: lhs.shape(),
                        right: rhs.shape(),
                    }))
            },
            ExprKind::Sum(terms) => {
                let mut total = Value::Scalar(0.0);
                for term in terms {
                    let value = self.eval(term)?;
                    total = Value::binary(crate::symbolic::BinaryOp::Add, &total, &value)
                        .ok_or_else(|| expr.children_error(&[0, 1], ShapeMismatch {
                            op: "+".to_string(),
                            left: total.shape(),
                            right: value.shape(),
                        }))?;
                }
                Ok(total)
            },
            ExprKind::Concatenation(children) => {
                let values = children.iter()
                    .map(|child| self.eval(child))
                    .collect::<Result<Vec<_>, _>>()?;
                let shapes = values.iter().map(Value::shape).collect::<Vec<_>>();
                Value::concatenate(values)
                    .ok_or_else(|| expr.children_error(&[0, 1], ShapeMismatch {
                        op: "concatenation".to_string(),
                        left: shapes.first().copied().unwrap_or(crate::symbolic::Shape::Unknown),
                        right: shapes.last().copied().unwrap_or(crate::symbolic::Shape::Unknown),
                    }))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_abs,
        afe_relative_error_msg,
        afe_is_relative_eq,
        assert_float_relative_eq,
    };
    use crate::symbolic::{exp, Domain};
    use nalgebra::{dvector, DVector};
    use nalgebra_sparse::CsrMatrix;
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn scalar_arithmetic() {
        let expr = ((Expr::scalar(3.0) * -5.0).unwrap() / 4.0).unwrap();
        assert_eq!(expr.eval_default().unwrap(), Value::Scalar(-3.75));
    }

    #[test]
    fn state_slices() {
        let y = Expr::state_vector(1..3, Domain::empty());
        let expr = (exp(&y).unwrap() * 2.0).unwrap();
        let ctxt = Ctxt::at(0.0, dvector![9.0, 0.0, 1.0]);
        let Value::Vector(values) = expr.eval(&ctxt).unwrap() else {
            panic!("expected a vector");
        };
        assert_float_relative_eq!(values[0], 2.0);
        assert_float_relative_eq!(values[1], 2.0 * std::f64::consts::E);
    }

    #[test]
    fn matrix_times_state() {
        let y = Expr::state_vector(0..3, Domain::empty());
        let expr = Expr::matrix(CsrMatrix::identity(3)).matmul(&y).unwrap();
        let ctxt = Ctxt::at(0.0, DVector::from_vec(vec![1.0, 2.0, 3.0]));
        assert_eq!(expr.eval(&ctxt).unwrap(), Value::Vector(dvector![1.0, 2.0, 3.0]));
    }

    #[test]
    fn named_variables() {
        let c = Expr::variable("c", "separator");
        let expr = ((&c * &c).unwrap() + Expr::time()).unwrap();
        let mut ctxt = Ctxt::at(0.5, DVector::zeros(0));
        ctxt.add_var("c", Value::Scalar(3.0));
        assert_eq!(expr.eval(&ctxt).unwrap(), Value::Scalar(9.5));
    }

    #[test]
    fn unresolved_parameter() {
        let expr = (Expr::parameter("k") + 1.0).unwrap();
        let err = expr.eval_default().unwrap_err();
        let kind = err.downcast_ref::<UnresolvedSymbol>().unwrap();
        assert_eq!(kind.kind, "parameter");
        assert_eq!(kind.name, "k");
    }

    #[test]
    fn missing_input() {
        let expr = Expr::input_parameter("Current function [A]");
        let mut ctxt = Ctxt::new();
        ctxt.add_input("Current function [mA]", 1.0);
        let err = expr.eval(&ctxt).unwrap_err();
        let kind = err.downcast_ref::<MissingInput>().unwrap();
        assert_eq!(kind.suggestions, vec!["Current function [mA]".to_string()]);
    }

    #[test]
    fn state_out_of_range() {
        let y = Expr::state_vector(0..4, Domain::empty());
        let err = y.eval(&Ctxt::at(0.0, DVector::zeros(2))).unwrap_err();
        assert!(err.is::<StateOutOfRange>());
    }
}
