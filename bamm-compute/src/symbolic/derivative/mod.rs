//! Symbolic differentiation of expression trees.
//!
//! [`derivative`] differentiates a tree with respect to either:
//!
//! - a [`Variable`](ExprKind::Variable), giving the **pointwise** derivative. The derivative of
//!   the variable itself is `1` on the variable's domain. Spatial operators commute with the
//!   derivative, so `d/dc grad(D * c) = grad(D)`.
//! - a [`StateVector`](ExprKind::StateVector) slice, giving the **Jacobian** of a discretised
//!   tree. The derivative of a state slice is the sparse matrix selecting it from the target
//!   slice, so every non-zero derivative is a matrix with one column per entry of the target.
//!   Since every discrete spatial operator is a constant matrix, this is exact.
//!
//! Contributions that are trivially zero are dropped while the derivative is built, so the
//! derivative of a tree that does not depend on the target is the scalar `0`.

mod function;

use bamm_error::Error;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::{collections::HashMap, ops::Range};
use super::{
    error::{InvalidDifferentiationTarget, NotDifferentiable},
    log,
    BinaryOp,
    Domain,
    Expr,
    ExprKind,
    Shape,
    UnaryOp,
};
use function::function_derivative;

/// The trivial zero derivative.
fn zero() -> Expr {
    Expr::scalar(0.0)
}

#[derive(Default)]
struct MultBuilder {
    factors: Vec<Expr>,
    zero: bool,
}

impl MultBuilder {
    fn mult(&mut self, e: Expr) {
        if e.is_zero() {
            self.zero = true;
        } else if !e.is_one() {
            self.factors.push(e);
        }
    }

    /// Multiplies the factors from left to right, so that vector-valued factors scale the rows
    /// of a matrix-valued derivative placed last.
    fn build(self) -> Result<Expr, Error> {
        if self.zero {
            return Ok(zero());
        }

        let mut factors = self.factors.into_iter();
        let Some(first) = factors.next() else {
            return Ok(Expr::scalar(1.0));
        };
        factors.try_fold(first, |product, factor| product * factor)
    }
}

#[derive(Default)]
struct SumBuilder(Vec<Expr>);

impl SumBuilder {
    fn add(&mut self, e: Expr) {
        if !e.is_zero() {
            self.0.push(e)
        }
    }

    fn build(mut self) -> Result<Expr, Error> {
        match self.0.len() {
            0 => Ok(zero()),
            1 => Ok(self.0.remove(0)),
            _ => Expr::sum(self.0),
        }
    }
}

/// Multiplies two expressions, dropping trivial factors.
fn product(lhs: Expr, rhs: Expr) -> Result<Expr, Error> {
    let mut mult = MultBuilder::default();
    mult.mult(lhs);
    mult.mult(rhs);
    mult.build()
}

/// What a tree is differentiated with respect to.
enum Target {
    /// A variable, for pointwise derivatives.
    Variable(Expr),

    /// A slice of the state vector, for Jacobians.
    State(Range<usize>),
}

/// Returns the sparse matrix that selects the entries of `range` out of `target`.
fn selection(range: &Range<usize>, target: &Range<usize>) -> Expr {
    let start = range.start.max(target.start);
    let end = range.end.min(target.end);
    if start >= end {
        return zero();
    }

    let mut coo = CooMatrix::new(range.len(), target.len());
    for i in start..end {
        coo.push(i - range.start, i - target.start, 1.0);
    }
    Expr::matrix(CsrMatrix::from(&coo))
}

/// Differentiates a tree, computing the derivative of each shared sub-tree once.
struct Differentiator {
    target: Target,
    memo: HashMap<usize, Expr>,
}

impl Differentiator {
    /// Broadcasts the derivative of a single-row value to `rows` rows, when differentiating with
    /// respect to the state.
    fn broadcast(&self, d: Expr, rows: Option<usize>) -> Result<Expr, Error> {
        match (&self.target, d.shape(), rows) {
            (Target::State(_), Shape::Matrix(1, _), Some(rows)) if rows > 1 => {
                Expr::matrix(ones(rows)).matmul(d)
            },
            _ => Ok(d),
        }
    }

    /// Differentiates a child of a node with the given number of rows.
    fn diff_child(&mut self, child: &Expr, rows: Option<usize>) -> Result<Expr, Error> {
        let d = self.diff(child)?;
        self.broadcast(d, rows)
    }

    fn diff(&mut self, expr: &Expr) -> Result<Expr, Error> {
        if let Some(d) = self.memo.get(&expr.id()) {
            return Ok(d.clone());
        }

        let d = self.diff_node(expr)?;
        self.memo.insert(expr.id(), d.clone());
        Ok(d)
    }

    fn diff_node(&mut self, expr: &Expr) -> Result<Expr, Error> {
        let rows = expr.shape().rows();

        match expr.kind() {
            ExprKind::Variable(_) => match &self.target {
                Target::Variable(x) if expr == x => Ok(Expr::scalar_on(1.0, x.domain().clone())),
                _ => Ok(zero()),
            },
            ExprKind::StateVector(range) => match &self.target {
                Target::State(target) => Ok(selection(range, target)),
                Target::Variable(_) => Ok(zero()),
            },
            ExprKind::FunctionParameter(name, _) => Err(expr.error(NotDifferentiable {
                name: name.clone(),
            })),
            ExprKind::Scalar(_)
                | ExprKind::Parameter(_)
                | ExprKind::InputParameter(_)
                | ExprKind::Time
                | ExprKind::SpatialVariable(_)
                | ExprKind::Vector(_)
                | ExprKind::Matrix(_) => Ok(zero()),
            ExprKind::Unary(op, child) => {
                let dchild = self.diff(child)?;
                if dchild.is_zero() {
                    return Ok(zero());
                }

                match op {
                    UnaryOp::Neg => Ok(-dchild),
                    UnaryOp::Function(func) => product(function_derivative(*func, child)?, dchild),
                    _ => {
                        // linear spatial operators act on the derivative over the same domain
                        let dchild = if dchild.domain().is_empty() {
                            dchild.with_domain(child.domain().clone())
                        } else {
                            dchild
                        };
                        Expr::unary(*op, dchild)
                    },
                }
            },
            ExprKind::Binary(op, [a, b]) => {
                let da = self.diff_child(a, rows)?;
                let db = self.diff_child(b, rows)?;
                let mut sum = SumBuilder::default();

                match op {
                    BinaryOp::Add => {
                        sum.add(da);
                        sum.add(db);
                    },
                    BinaryOp::Sub => {
                        sum.add(da);
                        if !db.is_zero() {
                            sum.add(-db);
                        }
                    },
                    BinaryOp::Mul => {
                        // (a*b)' = a*b' + b*a'
                        sum.add(product(a.clone(), db)?);
                        sum.add(product(b.clone(), da)?);
                    },
                    BinaryOp::Div => {
                        // (a/b)' = a'/b - (a/b^2)*b'
                        if !da.is_zero() {
                            sum.add((da / b)?);
                        }
                        if !db.is_zero() {
                            let factor = (a / b.pow(2.0)?)?;
                            sum.add(-product(factor, db)?);
                        }
                    },
                    BinaryOp::Pow => {
                        // (a^b)' = b*a^(b-1)*a' + a^b*log(a)*b'
                        if !da.is_zero() {
                            let factor = (b * a.pow((b - 1.0)?)?)?;
                            sum.add(product(factor, da)?);
                        }
                        if !db.is_zero() {
                            let factor = (expr * log(a)?)?;
                            sum.add(product(factor, db)?);
                        }
                    },
                    BinaryOp::MatMul => {
                        if !da.is_zero() {
                            return Err(expr.children_error(&[0], NotDifferentiable {
                                name: a.to_string(),
                            }));
                        }
                        if !db.is_zero() {
                            sum.add(a.matmul(db)?);
                        }
                    },
                }

                sum.build()
            },
            ExprKind::Sum(terms) => {
                let mut sum = SumBuilder::default();
                for term in terms {
                    sum.add(self.diff_child(term, rows)?);
                }
                sum.build()
            },
            ExprKind::Concatenation(children) => {
                let derivatives = children.iter()
                    .map(|child| self.diff(child))
                    .collect::<Result<Vec<_>, _>>()?;
                if derivatives.iter().all(Expr::is_zero) {
                    return Ok(zero());
                }

                let blocks = children.iter()
                    .zip(derivatives)
                    .map(|(child, d)| match &self.target {
                        Target::State(target) => {
                            let rows = child.shape().rows().unwrap_or(1);
                            if d.is_zero() {
                                Ok(Expr::matrix(CsrMatrix::zeros(rows, target.len())))
                            } else {
                                self.broadcast(d, Some(rows))
                            }
                        },
                        Target::Variable(_) if d.is_zero() => Ok(child.zeros_like()),
                        Target::Variable(_) => Ok(d),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::concatenation(blocks)
            },
        }
    }
}

/// A column of ones, used to broadcast single-row derivatives.
fn ones(rows: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(rows, 1);
    for i in 0..rows {
        coo.push(i, 0, 1.0);
    }
    CsrMatrix::from(&coo)
}

/// Computes the derivative of `f` with respect to `wrt`, which must be a variable or a slice of
/// the state vector.
///
/// For more information, see the [module-level documentation](self).
pub fn derivative(f: &Expr, wrt: &Expr) -> Result<Expr, Error> {
    let target = match wrt.kind() {
        ExprKind::Variable(_) => Target::Variable(wrt.clone()),
        ExprKind::StateVector(range) => Target::State(range.clone()),
        _ => return Err(wrt.error(InvalidDifferentiationTarget { target: wrt.to_string() })),
    };

    Differentiator { target, memo: HashMap::new() }.diff(f)
}

/// Computes the Jacobian of a discretised tree with respect to a state vector of the given
/// length.
pub fn jacobian(f: &Expr, state_len: usize) -> Result<Expr, Error> {
    derivative(f, &Expr::state_vector(0..state_len, Domain::empty()))
}
