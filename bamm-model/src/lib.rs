//! Battery models and the pipeline that turns them into discrete systems.
//!
//! A [`Model`] is written with the expression trees of [`bamm_compute`]. A [`Pipeline`] runs each
//! of its trees through simplification, parameter substitution and spatial discretisation, and
//! produces a [`DiscretisedModel`]: the residual, exact Jacobian and mass matrix of a DAE
//! `M y' = F(t, y)`, ready to be handed to a numerical integrator.
//!
//! ```
//! use bamm_compute::{
//!     discretise::{config::{DiscretisationConfig, DomainGeometry}, BoundaryCondition, BoundaryPair, SchemeKind},
//!     symbolic::{div, grad, Expr, ParameterValues},
//! };
//! use bamm_model::{Model, Pipeline};
//! use nalgebra::DVector;
//!
//! let c = Expr::variable("c", "rod");
//! let mut model = Model::new("heat");
//! model.rhs.insert(c.clone(), div(Expr::parameter("k") * grad(&c)).unwrap());
//! model.boundary_conditions.insert(c.clone(), BoundaryPair::new(
//!     BoundaryCondition::neumann(0.0),
//!     BoundaryCondition::neumann(0.0),
//! ));
//! model.initial_conditions.insert(c, Expr::scalar(1.0));
//!
//! let config = DiscretisationConfig::empty()
//!     .with_region("rod", SchemeKind::FiniteVolume, 10, DomainGeometry::cartesian(0.0, 1.0));
//! let values = [("k", 2.0)].into_iter().collect::<ParameterValues>();
//! let discretised = Pipeline::new(config).unwrap().process(&model, &values).unwrap();
//!
//! let y0 = discretised.initial_state().unwrap();
//! assert_eq!(y0, DVector::from_element(10, 1.0));
//! assert!(discretised.residual(0.0, &y0).unwrap().norm() < 1e-12);
//! ```

pub mod discretised;
pub mod error;
pub mod model;
pub mod parameters;
pub mod pipeline;

pub use discretised::DiscretisedModel;
pub use model::Model;
pub use pipeline::{process, Pipeline};
