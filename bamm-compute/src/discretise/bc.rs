//! Boundary conditions.

use indexmap::IndexMap;
use crate::symbolic::{Expr, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a boundary condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BcKind {
    /// The value of the quantity is prescribed at the boundary.
    Dirichlet,

    /// The gradient of the quantity (the flux) is prescribed at the boundary.
    Neumann,
}

/// A boundary condition on one side of a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCondition {
    /// The prescribed value.
    pub value: Expr,

    /// What the value prescribes.
    pub kind: BcKind,
}

impl BoundaryCondition {
    /// Prescribes the value of the quantity at the boundary.
    pub fn dirichlet(value: impl Into<Expr>) -> Self {
        Self { value: value.into(), kind: BcKind::Dirichlet }
    }

    /// Prescribes the gradient of the quantity at the boundary.
    pub fn neumann(value: impl Into<Expr>) -> Self {
        Self { value: value.into(), kind: BcKind::Neumann }
    }
}

/// The boundary conditions on both sides of a domain.
///
/// A missing condition on a side leaves the boundary insulated (zero flux).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryPair {
    /// The condition at the start of the domain.
    pub left: Option<BoundaryCondition>,

    /// The condition at the end of the domain.
    pub right: Option<BoundaryCondition>,
}

impl BoundaryPair {
    /// Creates a pair of boundary conditions.
    pub fn new(left: BoundaryCondition, right: BoundaryCondition) -> Self {
        Self { left: Some(left), right: Some(right) }
    }

    /// Returns the condition on the given side.
    pub fn get(&self, side: Side) -> Option<&BoundaryCondition> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    /// Returns the kinds of the conditions on both sides.
    pub fn kinds(&self) -> (Option<BcKind>, Option<BcKind>) {
        (self.left.as_ref().map(|bc| bc.kind), self.right.as_ref().map(|bc| bc.kind))
    }

    /// Applies a fallible transformation to the values of both conditions.
    pub fn try_map<F, E>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&Expr) -> Result<Expr, E>,
    {
        let mut map = |bc: &Option<BoundaryCondition>| bc.as_ref()
            .map(|bc| Ok(BoundaryCondition { value: f(&bc.value)?, kind: bc.kind }))
            .transpose();
        Ok(Self { left: map(&self.left)?, right: map(&self.right)? })
    }
}

/// The boundary conditions of a model, keyed by the expression whose gradient they apply to
/// (usually a variable).
pub type BoundaryConditions = IndexMap<Expr, BoundaryPair>;
