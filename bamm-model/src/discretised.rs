//! Discretised models, the interface between a processed model and a numerical integrator.

use bamm_compute::{
    discretise::error::UnknownVariable,
    numerical::{value::vstack, Ctxt, Eval, Value},
    symbolic::{error::ShapeMismatch, Expr, ExprKind, ParameterValue, ParameterValues, Shape},
};
use bamm_error::Error;
use indexmap::IndexMap;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use std::{collections::HashMap, ops::Range};
use crate::error::InvalidInput;

/// A discretised equation: the rows of the state vector it determines, the discrete tree of the
/// equation, and the discrete tree of its derivative with respect to the whole state vector.
#[derive(Debug, Clone)]
pub(crate) struct Equation {
    pub rows: Range<usize>,
    pub expr: Expr,
    pub jacobian: Expr,
}

/// A model whose equations are discrete trees, evaluable at any time and state.
///
/// The model is the semi-explicit DAE
///
/// ```text
/// M y' = F(t, y)
/// ```
///
/// where the rows of `F` are the right-hand sides of the differential equations, followed by the
/// algebraic equations (whose rows of the mass matrix `M` are zero). Each variable occupies the
/// rows of its slice of the state vector `y`.
///
/// Input parameters are given values with [`DiscretisedModel::substitute_inputs`], which does not
/// rebuild any tree.
#[derive(Debug, Clone)]
pub struct DiscretisedModel {
    pub(crate) name: String,
    pub(crate) equations: Vec<Equation>,
    pub(crate) initial_conditions: Vec<(Range<usize>, Expr)>,
    pub(crate) variables: IndexMap<String, Expr>,
    pub(crate) slices: IndexMap<String, Range<usize>>,
    pub(crate) mass_matrix: CsrMatrix<f64>,
    pub(crate) state_len: usize,
    pub(crate) inputs: HashMap<String, f64>,
}

/// Converts the value of a tree defining `rows` rows of the state vector to a vector.
fn rows_of(value: Value, rows: &Range<usize>, op: &str) -> Result<DVector<f64>, Error> {
    let shape = value.shape();
    value.into_vector(rows.len()).ok_or_else(|| Error::bare(ShapeMismatch {
        op: op.to_string(),
        left: shape,
        right: Shape::Column(rows.len()),
    }))
}

impl DiscretisedModel {
    /// The name of the model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The length of the state vector.
    pub fn state_len(&self) -> usize {
        self.state_len
    }

    /// The slice of the state vector occupied by each variable, in order.
    pub fn slices(&self) -> &IndexMap<String, Range<usize>> {
        &self.slices
    }

    /// The names of the derived quantities that can be evaluated with
    /// [`DiscretisedModel::variable`].
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// The names of the input parameters the equations depend on.
    pub fn input_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let trees = self.equations.iter()
            .map(|eq| &eq.expr)
            .chain(self.initial_conditions.iter().map(|(_, ic)| ic))
            .chain(self.variables.values());
        for tree in trees {
            for expr in tree.post_order_iter() {
                if let ExprKind::InputParameter(name) = expr.kind() {
                    if !names.contains(&name.as_str()) {
                        names.push(name.as_str());
                    }
                }
            }
        }
        names
    }

    /// Gives values to the input parameters of the model.
    ///
    /// Only parameters that are inputs of the model are read from `values`, and they must be
    /// numbers. Inputs without a value in `values` keep their previous value.
    pub fn substitute_inputs(&mut self, values: &ParameterValues) -> Result<(), Error> {
        let names = self.input_names().into_iter().map(str::to_string).collect::<Vec<_>>();
        for name in names {
            match values.get(&name) {
                Some(ParameterValue::Scalar(value)) => {
                    log::debug!("input parameter `{}` = {}", name, value);
                    self.inputs.insert(name, *value);
                },
                Some(_) => return Err(Error::bare(InvalidInput { name })),
                None => (),
            }
        }
        Ok(())
    }

    /// Checks that a vector has one entry per entry of the state vector.
    fn check_len(&self, v: &DVector<f64>, op: &str) -> Result<(), Error> {
        if v.len() == self.state_len {
            return Ok(());
        }
        Err(Error::bare(ShapeMismatch {
            op: op.to_string(),
            left: Shape::Column(v.len()),
            right: Shape::Column(self.state_len),
        }))
    }

    /// The evaluation context at the given time and state.
    fn ctxt(&self, t: f64, y: &DVector<f64>) -> Result<Ctxt, Error> {
        self.check_len(y, "state")?;
        let mut ctxt = Ctxt::at(t, y.clone());
        for (name, value) in &self.inputs {
            ctxt.add_input(name, *value);
        }
        Ok(ctxt)
    }

    /// Evaluates `F(t, y)`.
    pub fn residual(&self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>, Error> {
        let ctxt = self.ctxt(t, y)?;
        let mut residual = DVector::zeros(self.state_len);
        for eq in &self.equations {
            let value = eq.expr.eval(&ctxt)?;
            let rows = rows_of(value, &eq.rows, "residual")?;
            residual.rows_mut(eq.rows.start, eq.rows.len()).copy_from(&rows);
        }
        Ok(residual)
    }

    /// Evaluates `M y' - F(t, y)`, the residual of the model in fully implicit form.
    pub fn implicit_residual(
        &self,
        t: f64,
        y: &DVector<f64>,
        y_dot: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        self.check_len(y_dot, "state derivative")?;
        let residual = self.residual(t, y)?;
        let mut implicit = -residual;
        for (i, j, m) in self.mass_matrix.triplet_iter() {
            implicit[i] += m * y_dot[j];
        }
        Ok(implicit)
    }

    /// Evaluates the Jacobian `dF/dy(t, y)`.
    ///
    /// The Jacobian is exact: each block is the derivative of the discrete tree of an equation.
    pub fn jacobian(&self, t: f64, y: &DVector<f64>) -> Result<CsrMatrix<f64>, Error> {
        let ctxt = self.ctxt(t, y)?;
        let blocks = self.equations.iter()
            .map(|eq| {
                let value = eq.jacobian.eval(&ctxt)?;
                let shape = value.shape();
                value.into_matrix(eq.rows.len(), self.state_len).ok_or_else(|| Error::bare(ShapeMismatch {
                    op: "jacobian".to_string(),
                    left: shape,
                    right: Shape::Matrix(eq.rows.len(), self.state_len),
                }))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vstack(&blocks).unwrap_or_else(|| CsrMatrix::zeros(self.state_len, self.state_len)))
    }

    /// The mass matrix `M`.
    pub fn mass_matrix(&self) -> &CsrMatrix<f64> {
        &self.mass_matrix
    }

    /// Evaluates the initial conditions into a state vector.
    pub fn initial_state(&self) -> Result<DVector<f64>, Error> {
        let ctxt = self.ctxt(0.0, &DVector::zeros(self.state_len))?;
        let mut state = DVector::zeros(self.state_len);
        for (rows, ic) in &self.initial_conditions {
            let value = rows_of(ic.eval(&ctxt)?, rows, "initial condition")?;
            state.rows_mut(rows.start, rows.len()).copy_from(&value);
        }
        Ok(state)
    }

    /// Evaluates the derived quantity `name` at the given time and state.
    pub fn variable(&self, name: &str, t: f64, y: &DVector<f64>) -> Result<Value, Error> {
        let expr = self.variables.get(name)
            .ok_or_else(|| Error::bare(UnknownVariable { name: name.to_string() }))?;
        expr.eval(&self.ctxt(t, y)?)
    }
}
