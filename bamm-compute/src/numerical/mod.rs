//! Numerical evaluation of expression trees.
//!
//! Discretised trees only contain numbers, vectors, sparse matrices, slices of the state vector,
//! the time, and input parameters, so they can be evaluated directly to a [`Value`] given a
//! [`Ctxt`] holding the current time and state. Shared sub-trees are evaluated once per call.

pub mod ctxt;
pub mod error;
pub mod eval;
pub mod value;

pub use ctxt::Ctxt;
pub use eval::Eval;
pub use value::Value;
