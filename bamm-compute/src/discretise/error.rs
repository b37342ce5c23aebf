//! Errors that can occur while discretising expressions.

use bamm_attrs::ErrorKind;
use crate::symbolic::Domain;
use super::{mesh::CoordSys, scheme::SchemeKind};

/// A domain referenced by an expression has no spatial scheme assigned to it.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("no spatial scheme is assigned to the `{}` domain", self.domain),
    labels = ["this expression is defined over it"],
    help = "assign a scheme to the domain in the discretisation configuration",
)]
pub struct MissingDiscretisation {
    /// The name of the domain.
    pub domain: String,
}

/// A domain has a scheme assigned to it but no mesh.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the `{}` domain has no mesh", self.domain),
    labels = ["this expression is defined over it"],
    help = "give the domain a number of mesh points and a geometry",
)]
pub struct MissingMesh {
    /// The name of the domain.
    pub domain: String,
}

/// An expression spans several regions discretised with different schemes.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the regions of {} are discretised with different schemes", self.domains),
    labels = ["this expression spans them"],
    help = "regions joined into one domain must share a scheme",
)]
pub struct SchemeConflict {
    /// The domain spanning the conflicting regions.
    pub domains: Domain,
}

/// A scheme was assigned to a domain with a coordinate system it does not support.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the {} scheme does not support {} coordinates", self.scheme, self.coord_sys),
)]
pub struct UnsupportedCoordinateSystem {
    /// The scheme.
    pub scheme: SchemeKind,

    /// The unsupported coordinate system.
    pub coord_sys: CoordSys,
}

/// The discretisation configuration is invalid.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("invalid discretisation configuration: {}", self.reason),
)]
pub struct InvalidConfiguration {
    /// What is wrong with the configuration.
    pub reason: String,
}

/// A variable has no slice of the state vector.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the variable `{}` has no slice of the state vector", self.name),
    labels = ["this variable"],
    help = "every variable must be the key of an equation of the model",
)]
pub struct UnknownVariable {
    /// The name of the variable.
    pub name: String,
}

/// Two different variables share a name, so they cannot be told apart in the state vector.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("more than one variable is named `{}`", self.name),
    labels = ["this variable"],
    help = "give variables on different domains different names",
)]
pub struct DuplicateVariable {
    /// The shared name.
    pub name: String,
}
