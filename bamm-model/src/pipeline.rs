//! Processing symbolic models into discretised models.
//!
//! Every tree of a [`Model`] goes through the same stages:
//!
//! 1. [`simplify`], so that parameters in terms that vanish are never substituted,
//! 2. [`substitute`] the parameter values,
//! 3. [`simplify`] again, folding the substituted numbers,
//! 4. discretise with the [`Discretisation`] of the pipeline,
//! 5. [`simplify`] the discrete tree, folding products of constant matrices.
//!
//! The exact Jacobian of each equation is then the derivative of its discrete tree with respect to
//! the whole state vector.
//!
//! A [`Pipeline`] keeps its [`Discretisation`], and with it the cache of discrete operators,
//! across calls to [`Pipeline::process`]. Processing the same model with other parameter values
//! therefore reuses the operator matrices built the first time, and assigns the variables the
//! same slices of the state vector.

use bamm_compute::{
    discretise::{bc::BoundaryConditions, config::DiscretisationConfig, Discretisation},
    symbolic::{
        derivative::jacobian,
        error::ShapeMismatch,
        simplify,
        substitute,
        Expr,
        ParameterValues,
        Shape,
    },
};
use bamm_error::Error;
use indexmap::IndexMap;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::{collections::HashMap, ops::Range};
use crate::{
    discretised::{DiscretisedModel, Equation},
    model::Model,
};

/// Simplifies a symbolic tree, substitutes the parameter values into it, and simplifies the
/// result.
fn prepare(expr: &Expr, values: &ParameterValues) -> Result<Expr, Error> {
    let substituted = substitute(&simplify(expr), values)?;
    Ok(simplify(&substituted))
}

/// Checks that a discrete tree can fill the given rows of the state vector.
fn check_rows(discrete: &Expr, rows: &Range<usize>, op: &str) -> Result<(), Error> {
    match discrete.shape() {
        Shape::Scalar | Shape::Unknown => Ok(()),
        Shape::Column(n) if n == rows.len() => Ok(()),
        shape => {
            let source = discrete.to_string();
            Err(Error::new(vec![0..source.len()], ShapeMismatch {
                op: op.to_string(),
                left: shape,
                right: Shape::Column(rows.len()),
            }).with_source(source))
        },
    }
}

/// Processes models with a fixed discretisation.
#[derive(Debug)]
pub struct Pipeline {
    discretisation: Discretisation,
}

impl Pipeline {
    /// Builds the meshes and schemes of the configuration.
    pub fn new(config: DiscretisationConfig) -> Result<Self, Error> {
        Ok(Self { discretisation: Discretisation::new(config)? })
    }

    /// The discretisation used by the pipeline.
    pub fn discretisation(&self) -> &Discretisation {
        &self.discretisation
    }

    /// Discretises a parameter-free tree and simplifies the result.
    fn discretise(&mut self, expr: &Expr, bcs: &BoundaryConditions) -> Result<Expr, Error> {
        let discrete = self.discretisation.process_symbol(expr, bcs)?;
        Ok(simplify(&discrete))
    }

    /// Processes a model with the given parameter values.
    ///
    /// The model is left untouched. If any stage fails, the error is returned and nothing else is
    /// produced.
    pub fn process(&mut self, model: &Model, values: &ParameterValues) -> Result<DiscretisedModel, Error> {
        log::debug!("processing model `{}`", model.name);
        model.check_well_posedness()?;

        let state_variables = model.state_variables();
        self.discretisation.set_variable_slices(&state_variables)?;
        let slices = self.discretisation.slices().clone();
        let state_len = self.discretisation.state_len();

        let mut bcs = BoundaryConditions::new();
        for (operand, pair) in &model.boundary_conditions {
            let operand = prepare(operand, values)?;
            let pair = pair.try_map(|value| prepare(value, values))?;
            bcs.insert(operand, pair);
        }

        let rows_of = |variable: &Expr| -> Range<usize> {
            variable.as_variable()
                .and_then(|name| slices.get(name))
                .cloned()
                .unwrap_or(0..0)
        };

        let mut equations = Vec::new();
        for (variable, expr) in model.rhs.iter().chain(&model.algebraic) {
            let rows = rows_of(variable);
            let discrete = self.discretise(&prepare(expr, values)?, &bcs)?;
            check_rows(&discrete, &rows, "equation")?;
            let jacobian = simplify(&jacobian(&discrete, state_len)?);
            log::debug!(
                "equation of `{}`: {} discrete nodes, {} jacobian nodes",
                variable,
                discrete.size(),
                jacobian.size(),
            );
            equations.push(Equation { rows, expr: discrete, jacobian });
        }

        let mut initial_conditions = Vec::new();
        for variable in &state_variables {
            let rows = rows_of(variable);
            if let Some(ic) = model.initial_conditions.get(variable) {
                let discrete = self.discretise(&prepare(ic, values)?, &bcs)?;
                check_rows(&discrete, &rows, "initial condition")?;
                initial_conditions.push((rows, discrete));
            }
        }

        let mut variables = IndexMap::new();
        for (name, expr) in &model.variables {
            let discrete = self.discretise(&prepare(expr, values)?, &bcs)?;
            variables.insert(name.clone(), discrete);
        }

        let mass_matrix = self.mass_matrix(model, &slices, state_len)?;
        log::debug!(
            "processed model `{}`: {} equations, state of length {}, {} cached operators ({} hits)",
            model.name,
            equations.len(),
            state_len,
            self.discretisation.cache().len(),
            self.discretisation.cache().hits(),
        );

        Ok(DiscretisedModel {
            name: model.name.clone(),
            equations,
            initial_conditions,
            variables,
            slices,
            mass_matrix,
            state_len,
            inputs: HashMap::new(),
        })
    }

    /// Assembles the block-diagonal mass matrix: the mass matrix of each differential variable's
    /// domain, and zero rows for algebraic variables.
    fn mass_matrix(
        &mut self,
        model: &Model,
        slices: &IndexMap<String, Range<usize>>,
        state_len: usize,
    ) -> Result<CsrMatrix<f64>, Error> {
        let mut coo = CooMatrix::new(state_len, state_len);
        for variable in model.rhs.keys() {
            let Some(rows) = variable.as_variable().and_then(|name| slices.get(name)) else {
                continue;
            };
            let block = self.discretisation.mass_matrix(variable)?;
            for (i, j, m) in block.triplet_iter() {
                coo.push(rows.start + i, rows.start + j, *m);
            }
        }
        Ok(CsrMatrix::from(&coo))
    }
}

/// Processes a model with the given parameter values and discretisation configuration.
///
/// To process a model several times with the same configuration, use a [`Pipeline`], which
/// reuses the discrete operators between runs.
pub fn process(
    model: &Model,
    values: &ParameterValues,
    config: DiscretisationConfig,
) -> Result<DiscretisedModel, Error> {
    Pipeline::new(config)?.process(model, values)
}
