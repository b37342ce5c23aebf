//! Expression trees, simplification, differentiation and spatial discretisation for continuum
//! battery models.
//!
//! The crate is organised around the stages a model goes through before it can be handed to a
//! numerical integrator:
//!
//! - [`symbolic`]: the immutable [`Expr`](symbolic::Expr) tree model equations are written in,
//!   along with the simplifier, parameter substitution and the differentiator.
//! - [`discretise`]: meshes, spatial schemes and the [`Discretisation`](discretise::Discretisation)
//!   that replaces variables and spatial operators with discrete vectors and matrices.
//! - [`numerical`]: evaluation of discretised trees at a given time and state vector.

pub mod consts;
pub mod discretise;
pub mod numerical;
pub mod step_collector;
pub mod symbolic;
