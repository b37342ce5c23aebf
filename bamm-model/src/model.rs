//! Symbolic battery models.

use bamm_compute::{
    discretise::bc::BoundaryConditions,
    symbolic::Expr,
};
use bamm_error::Error;
use indexmap::IndexMap;
use std::collections::HashSet;
use crate::error::IllPosedModel;

/// A model, written as symbolic expression trees.
///
/// The unknowns of the model are the keys of [`Model::rhs`] and [`Model::algebraic`]:
///
/// - `rhs` maps each differential variable `u` to the right-hand side `F` of `du/dt = F`,
/// - `algebraic` maps each algebraic variable `v` to an expression `G` that must satisfy `G = 0`.
///   The key only fixes which slice of the state vector the equation occupies.
///
/// Every differential and algebraic variable needs an entry in [`Model::initial_conditions`].
/// [`Model::variables`] holds derived quantities, evaluated from the solution for
/// post-processing.
///
/// A model is never modified by processing it, so trees can be freely shared between its fields.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// The name of the model.
    pub name: String,

    /// The right-hand sides of the differential equations, keyed by their variable.
    pub rhs: IndexMap<Expr, Expr>,

    /// The algebraic equations, keyed by the variable they determine.
    pub algebraic: IndexMap<Expr, Expr>,

    /// The boundary conditions of the operands of gradients in the model.
    pub boundary_conditions: BoundaryConditions,

    /// The initial value of each variable.
    pub initial_conditions: IndexMap<Expr, Expr>,

    /// Derived quantities, by name.
    pub variables: IndexMap<String, Expr>,
}

impl Model {
    /// Creates an empty model with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// The unknowns of the model: the differential variables, then the algebraic variables.
    ///
    /// This is also the order of their slices in the state vector.
    pub fn state_variables(&self) -> Vec<Expr> {
        self.rhs.keys().chain(self.algebraic.keys()).cloned().collect()
    }

    /// Checks that the model can be processed:
    ///
    /// - every key of `rhs` and `algebraic` is a variable,
    /// - no variable is both differential and algebraic,
    /// - no two variables share a name,
    /// - every variable has an initial condition.
    pub fn check_well_posedness(&self) -> Result<(), Error> {
        let ill_posed = |expr: &Expr, reason: String| {
            let source = expr.to_string();
            Error::new(vec![0..source.len()], IllPosedModel { reason }).with_source(source)
        };

        for key in self.rhs.keys().chain(self.algebraic.keys()) {
            if key.as_variable().is_none() {
                return Err(ill_posed(key, format!("`{}` is the key of an equation, but is not a variable", key)));
            }
        }

        if let Some(key) = self.rhs.keys().find(|key| self.algebraic.contains_key(*key)) {
            return Err(ill_posed(key, format!("`{}` is both a differential and an algebraic variable", key)));
        }

        let mut names = HashSet::new();
        for key in self.rhs.keys().chain(self.algebraic.keys()) {
            if let Some(name) = key.as_variable() {
                if !names.insert(name) {
                    return Err(ill_posed(key, format!("more than one variable is named `{}`", name)));
                }
            }
        }

        for key in self.rhs.keys().chain(self.algebraic.keys()) {
            if !self.initial_conditions.contains_key(key) {
                return Err(ill_posed(key, format!("`{}` has no initial condition", key)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bamm_compute::symbolic::{div, grad, Domain};
    use super::*;

    fn diffusion() -> Model {
        let c = Expr::variable("c", "negative particle");
        let mut model = Model::new("diffusion");
        model.rhs.insert(c.clone(), div(grad(&c)).unwrap());
        model.initial_conditions.insert(c, Expr::scalar(1.0));
        model
    }

    #[test]
    fn well_posed() {
        let mut model = diffusion();
        let v = Expr::variable("v", Domain::empty());
        model.algebraic.insert(v.clone(), (&v - 1.0).unwrap());
        model.initial_conditions.insert(v, Expr::scalar(0.0));
        assert!(model.check_well_posedness().is_ok());

        let names = model.state_variables().iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["c", "v"]);
    }

    #[test]
    fn missing_initial_condition() {
        let mut model = diffusion();
        model.initial_conditions.clear();
        let err = model.check_well_posedness().unwrap_err();
        assert_eq!(err.downcast_ref::<IllPosedModel>().unwrap().reason, "`c` has no initial condition");
        assert_eq!(err.source, "c");
    }

    #[test]
    fn keys_must_be_variables() {
        let mut model = diffusion();
        model.rhs.insert(Expr::parameter("D"), Expr::scalar(0.0));
        let err = model.check_well_posedness().unwrap_err();
        assert!(err.is::<IllPosedModel>());
    }

    #[test]
    fn variable_in_both_maps() {
        let mut model = diffusion();
        let c = Expr::variable("c", "negative particle");
        model.algebraic.insert(c.clone(), c);
        let err = model.check_well_posedness().unwrap_err();
        assert_eq!(
            err.downcast_ref::<IllPosedModel>().unwrap().reason,
            "`c` is both a differential and an algebraic variable",
        );
    }

    #[test]
    fn variables_with_the_same_name() {
        let mut model = diffusion();
        let other = Expr::variable("c", "positive particle");
        model.rhs.insert(other.clone(), div(grad(&other)).unwrap());
        model.initial_conditions.insert(other, Expr::scalar(2.0));
        let err = model.check_well_posedness().unwrap_err();
        assert_eq!(
            err.downcast_ref::<IllPosedModel>().unwrap().reason,
            "more than one variable is named `c`",
        );
    }
}
