//! Operator overloads and free functions for building expression trees.
//!
//! Building a node can fail (see [`Expr::from_kind`]), so the binary operators return
//! `Result<Expr, Error>`. To keep chains of operators readable, the right-hand side of an
//! operator applied to an [`Expr`] can be anything implementing [`IntoExpr`], including an
//! earlier `Result`, and a `Result` can be chained with a further [`Expr`]:
//!
//! ```
//! use bamm_compute::symbolic::{grad, Expr};
//!
//! let c = Expr::variable("c", "negative particle");
//! let d = Expr::parameter("D");
//! let flux = (d * grad(&c)) * &c;
//! assert_eq!(flux.unwrap().to_string(), "D * grad(c) * c");
//! ```

use bamm_error::Error;
use std::ops::{Add, Div, Mul, Neg, Sub};
use super::{BinaryOp, Expr, Func, Side, UnaryOp};

/// Conversion into an [`Expr`], possibly propagating an earlier construction error.
pub trait IntoExpr {
    fn into_expr(self) -> Result<Expr, Error>;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Result<Expr, Error> {
        Ok(self)
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Result<Expr, Error> {
        Ok(self.clone())
    }
}

impl IntoExpr for f64 {
    fn into_expr(self) -> Result<Expr, Error> {
        Ok(Expr::scalar(self))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::scalar(value)
    }
}

impl IntoExpr for Result<Expr, Error> {
    fn into_expr(self) -> Result<Expr, Error> {
        self
    }
}

macro_rules! impl_binary_op {
    ($($trait:ident, $method:ident => $op:expr;)*) => {
        $(
            impl<R: IntoExpr> $trait<R> for Expr {
                type Output = Result<Expr, Error>;

                fn $method(self, rhs: R) -> Self::Output {
                    Expr::binary($op, self, rhs.into_expr()?)
                }
            }

            impl<R: IntoExpr> $trait<R> for &Expr {
                type Output = Result<Expr, Error>;

                fn $method(self, rhs: R) -> Self::Output {
                    Expr::binary($op, self.clone(), rhs.into_expr()?)
                }
            }

            impl $trait<Expr> for Result<Expr, Error> {
                type Output = Result<Expr, Error>;

                fn $method(self, rhs: Expr) -> Self::Output {
                    Expr::binary($op, self?, rhs)
                }
            }

            impl $trait<&Expr> for Result<Expr, Error> {
                type Output = Result<Expr, Error>;

                fn $method(self, rhs: &Expr) -> Self::Output {
                    Expr::binary($op, self?, rhs.clone())
                }
            }

            impl $trait<Expr> for f64 {
                type Output = Result<Expr, Error>;

                fn $method(self, rhs: Expr) -> Self::Output {
                    Expr::binary($op, Expr::scalar(self), rhs)
                }
            }

            impl $trait<&Expr> for f64 {
                type Output = Result<Expr, Error>;

                fn $method(self, rhs: &Expr) -> Self::Output {
                    Expr::binary($op, Expr::scalar(self), rhs.clone())
                }
            }
        )*
    };
}

impl_binary_op! {
    Add, add => BinaryOp::Add;
    Sub, sub => BinaryOp::Sub;
    Mul, mul => BinaryOp::Mul;
    Div, div => BinaryOp::Div;
}

/// Negation cannot fail, since it does not change the domain or shape of its operand.
impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Self::Output {
        let domain = self.domain().clone();
        let shape = self.shape();
        Expr::build(super::ExprKind::Unary(UnaryOp::Neg, self), domain, shape, false)
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Self::Output {
        -self.clone()
    }
}

/// The spatial gradient of the operand.
pub fn grad(x: impl IntoExpr) -> Result<Expr, Error> {
    Expr::unary(UnaryOp::Grad, x.into_expr()?)
}

/// The spatial divergence of the operand.
pub fn div(x: impl IntoExpr) -> Result<Expr, Error> {
    Expr::unary(UnaryOp::Div, x.into_expr()?)
}

/// The value of the operand on the given side of its domain.
pub fn boundary_value(x: impl IntoExpr, side: Side) -> Result<Expr, Error> {
    Expr::unary(UnaryOp::BoundaryValue(side), x.into_expr()?)
}

/// The integral of the operand over its domain.
pub fn integral(x: impl IntoExpr) -> Result<Expr, Error> {
    Expr::unary(UnaryOp::Integral, x.into_expr()?)
}

/// Concatenates the given children along their (disjoint) domains.
pub fn concatenation<I>(children: I) -> Result<Expr, Error>
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    let children = children.into_iter()
        .map(IntoExpr::into_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Expr::concatenation(children)
}

macro_rules! impl_functions {
    ($($name:ident => $func:ident),* $(,)?) => {
        $(
            #[doc = concat!("Applies `", stringify!($name), "` to the operand.")]
            pub fn $name(x: impl IntoExpr) -> Result<Expr, Error> {
                Expr::unary(UnaryOp::Function(Func::$func), x.into_expr()?)
            }
        )*
    };
}

impl_functions! {
    exp => Exp,
    log => Log,
    sqrt => Sqrt,
    tanh => Tanh,
    sinh => Sinh,
    cosh => Cosh,
    sin => Sin,
    cos => Cos,
}
