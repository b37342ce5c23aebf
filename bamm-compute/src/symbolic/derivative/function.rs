//! Symbolic derivatives of the elementary functions in [`Func`].

use bamm_error::Error;
use crate::symbolic::{cos, cosh, exp, sin, sinh, sqrt, tanh, Expr, Func};

/// Computes the derivative of the function with respect to its argument, evaluated at `arg`.
///
/// The caller applies the chain rule by multiplying with the derivative of `arg`.
pub(super) fn function_derivative(func: Func, arg: &Expr) -> Result<Expr, Error> {
    match func {
        Func::Exp => exp(arg),
        Func::Log => 1.0 / arg,
        Func::Sqrt => 0.5 / sqrt(arg)?,
        Func::Tanh => 1.0 - tanh(arg)?.pow(2.0)?,
        Func::Sinh => cosh(arg),
        Func::Cosh => sinh(arg),
        Func::Sin => cos(arg),
        Func::Cos => Ok(-sin(arg)?),
    }
}
