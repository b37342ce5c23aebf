use levenshtein::levenshtein;
use nalgebra::DVector;
use std::collections::HashMap;
use super::value::Value;

/// A context to use when evaluating an expression, containing the values of the leaves that are
/// not known until evaluation time.
///
/// Discretised expressions only need the time, the state vector, and the values of any input
/// parameters. Values for named variables can also be added, which lets symbolic (not yet
/// discretised) trees be evaluated pointwise.
#[derive(Debug, Clone)]
pub struct Ctxt {
    /// The values of named variables.
    vars: HashMap<String, Value>,

    /// The values of input parameters.
    inputs: HashMap<String, f64>,

    /// The current time.
    pub time: f64,

    /// The current state vector.
    pub state: DVector<f64>,
}

impl Default for Ctxt {
    fn default() -> Self {
        Ctxt {
            vars: HashMap::new(),
            inputs: HashMap::new(),
            time: 0.0,
            state: DVector::zeros(0),
        }
    }
}

impl Ctxt {
    /// Creates a new empty context, at time zero with an empty state vector.
    pub fn new() -> Ctxt {
        Ctxt::default()
    }

    /// Creates a context at the given time and state.
    pub fn at(time: f64, state: DVector<f64>) -> Ctxt {
        Ctxt {
            time,
            state,
            ..Default::default()
        }
    }

    /// Add a variable to the context.
    pub fn add_var(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    /// Get the value of a variable in the context.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Add the value of an input parameter to the context.
    pub fn add_input(&mut self, name: &str, value: f64) {
        self.inputs.insert(name.to_string(), value);
    }

    /// Get the value of an input parameter in the context.
    pub fn get_input(&self, name: &str) -> Option<f64> {
        self.inputs.get(name).copied()
    }

    /// Returns all variables and inputs in the context with a name similar to the given name.
    pub fn get_similar(&self, name: &str) -> Vec<&str> {
        let mut similar = self.vars.keys()
            .chain(self.inputs.keys())
            .filter(|n| levenshtein(n, name) < 3)
            .map(|n| n.as_str())
            .collect::<Vec<_>>();
        similar.sort_unstable();
        similar
    }
}
