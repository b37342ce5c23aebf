//! Symbolic representation and manipulation of model equations.
//!
//! # Expression representation
//!
//! Model equations are represented as trees of [`Expr`] nodes. Unlike an AST, these trees are
//! immutable and shared: a sub-tree referenced from two equations is the same node, and every
//! transformation builds a new tree, reusing untouched sub-trees. Each node records the spatial
//! [`Domain`] it is defined over and the [`Shape`] of its value, both derived from its children
//! when the node is built.
//!
//! ```
//! use bamm_compute::symbolic::{div, grad, Expr};
//!
//! let c = Expr::variable("c", "negative particle");
//! let d = Expr::parameter("D");
//! let rhs = div(d * grad(&c)).unwrap();
//! assert_eq!(rhs.to_string(), "div(D * grad(c))");
//! ```
//!
//! # Transformations
//!
//! - [`simplify()`] folds constants, removes additive and multiplicative identities, and flattens
//!   addition chains, without changing the value the tree evaluates to.
//! - [`substitute()`] replaces parameters with numbers or with the symbolic definitions of
//!   function parameters, using a [`ParameterValues`] set.
//! - [`derivative()`] differentiates a tree with respect to a variable or a slice of the
//!   discrete state vector.

pub mod derivative;
pub mod domain;
pub mod error;
pub mod expr;
pub mod shape;
pub mod simplify;
pub mod substitute;

pub use derivative::derivative;
pub use domain::Domain;
pub use expr::{
    boundary_value,
    concatenation,
    cos,
    cosh,
    div,
    exp,
    grad,
    integral,
    log,
    sin,
    sinh,
    sqrt,
    tanh,
    BinaryOp,
    Expr,
    ExprKind,
    Func,
    IntoExpr,
    Side,
    UnaryOp,
};
pub use shape::Shape;
pub use simplify::{simplify, simplify_with_steps};
pub use substitute::{substitute, ParameterValue, ParameterValues};
