//! Replaces parameters with their values.
//!
//! A [`ParameterValues`] set maps parameter names to [`ParameterValue`]s. [`substitute`] walks a
//! tree and replaces every [`Parameter`](ExprKind::Parameter) and
//! [`FunctionParameter`](ExprKind::FunctionParameter) node with its value:
//!
//! - a number becomes a [`Scalar`](ExprKind::Scalar),
//! - an expression is itself substituted, then spliced in,
//! - a function is applied to the (substituted) argument trees of the function parameter, and the
//!   tree it returns is substituted in turn,
//! - an input parameter becomes an [`InputParameter`](ExprKind::InputParameter) leaf, whose value
//!   is only given at evaluation time.
//!
//! The result contains no parameter nodes. Sub-trees that contain no parameters are returned as
//! the same nodes, and shared sub-trees are substituted once.

use bamm_error::Error;
use indexmap::IndexMap;
use levenshtein::levenshtein;
use std::{collections::HashMap, fmt, sync::Arc};
use super::{error::{CyclicParameter, UnknownParameter}, Expr, ExprKind};

/// The symbolic definition of a function parameter.
pub type ParameterFn = dyn Fn(&[Expr]) -> Result<Expr, Error> + Send + Sync;

/// The value of a single parameter.
#[derive(Clone)]
pub enum ParameterValue {
    /// A number.
    Scalar(f64),

    /// An expression, which may refer to other parameters.
    Expr(Expr),

    /// A function of the arguments of a function parameter, returning its symbolic definition.
    Function(Arc<ParameterFn>),

    /// A value given at evaluation time. The parameter becomes an input parameter.
    Input,
}

impl ParameterValue {
    /// Creates a function value from the given closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Expr]) -> Result<Expr, Error> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }
}

impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "Scalar({})", value),
            Self::Expr(expr) => write!(f, "Expr({})", expr),
            Self::Function(_) => write!(f, "Function(..)"),
            Self::Input => write!(f, "Input"),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Expr> for ParameterValue {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

/// A set of parameter values, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ParameterValues {
    values: IndexMap<String, ParameterValue>,
}

impl ParameterValues {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of a parameter, returning the previous value if there was one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Option<ParameterValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Sets the values of many parameters at once, replacing existing values.
    pub fn update<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParameterValue>,
    {
        for (name, value) in values {
            self.insert(name, value);
        }
    }

    /// Returns the value of a parameter.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Returns true if the set contains a value for the parameter.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of parameters in the set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the parameters whose name contains the given keyword, ignoring case.
    pub fn search(&self, keyword: &str) -> Vec<(&str, &ParameterValue)> {
        let keyword = keyword.to_lowercase();
        self.iter()
            .filter(|(name, _)| name.to_lowercase().contains(&keyword))
            .collect()
    }

    /// Returns the names of parameters with a name similar to the given name.
    pub fn get_similar(&self, name: &str) -> Vec<String> {
        self.values.keys()
            .filter(|n| levenshtein(n, name) < 3)
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        values.update(iter);
        values
    }
}

/// Substitutes a tree, expanding each parameter value at most once per call.
struct Substituter<'a> {
    values: &'a ParameterValues,
    memo: HashMap<usize, Expr>,

    /// The names of the parameters currently being expanded.
    expanding: Vec<String>,
}

impl Substituter<'_> {
    fn unknown(&self, expr: &Expr, name: &str) -> Error {
        expr.error(UnknownParameter {
            name: name.to_string(),
            suggestions: self.values.get_similar(name),
        })
    }

    /// Substitutes the definition of the parameter `name`, guarding against definitions that
    /// refer back to themselves.
    fn expand(
        &mut self,
        expr: &Expr,
        name: &str,
        define: impl FnOnce() -> Result<Expr, Error>,
    ) -> Result<Expr, Error> {
        if self.expanding.iter().any(|n| n == name) {
            return Err(expr.error(CyclicParameter { name: name.to_string() }));
        }

        let definition = define()?;
        self.expanding.push(name.to_string());
        let result = self.substitute(&definition);
        self.expanding.pop();
        result
    }

    fn substitute_value(
        &mut self,
        expr: &Expr,
        name: &str,
        args: &[Expr],
    ) -> Result<Expr, Error> {
        let Some(value) = self.values.get(name) else {
            return Err(self.unknown(expr, name));
        };

        match value {
            ParameterValue::Scalar(value) => Ok(Expr::scalar(*value)),
            ParameterValue::Input => Ok(Expr::input_parameter(name)),
            ParameterValue::Expr(definition) => {
                let definition = definition.clone();
                self.expand(expr, name, || Ok(definition))
            },
            ParameterValue::Function(f) => {
                let f = Arc::clone(f);
                self.expand(expr, name, || f(args))
            },
        }
    }

    fn substitute(&mut self, expr: &Expr) -> Result<Expr, Error> {
        if let Some(substituted) = self.memo.get(&expr.id()) {
            return Ok(substituted.clone());
        }

        let substituted = match expr.kind() {
            ExprKind::Parameter(name) => self.substitute_value(expr, name, &[])?,
            ExprKind::FunctionParameter(name, args) => {
                let args = args.iter()
                    .map(|arg| self.substitute(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.substitute_value(expr, name, &args)?
            },
            _ => expr.map_children(|child| self.substitute(child))?,
        };

        // a definition evaluated inside an expansion may depend on the expansion stack
        if self.expanding.is_empty() {
            self.memo.insert(expr.id(), substituted.clone());
        }
        Ok(substituted)
    }
}

/// Replaces every parameter in `expr` with its value in `values`.
///
/// Returns [`UnknownParameter`] if a parameter has no value, and [`CyclicParameter`] if the
/// definition of a parameter refers back to itself.
pub fn substitute(expr: &Expr, values: &ParameterValues) -> Result<Expr, Error> {
    Substituter {
        values,
        memo: HashMap::new(),
        expanding: Vec::new(),
    }.substitute(expr)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_abs,
        afe_relative_error_msg,
        afe_is_relative_eq,
        assert_float_relative_eq,
    };
    use crate::numerical::{Ctxt, Eval, Value};
    use crate::symbolic::{exp, grad, simplify, Domain};
    use pretty_assertions::assert_eq;
    use super::*;

    fn c() -> Expr {
        Expr::variable("c", "negative electrode")
    }

    /// Returns true if the tree still contains a parameter node.
    fn has_parameters(expr: &Expr) -> bool {
        expr.any(|node| matches!(
            node.kind(),
            ExprKind::Parameter(_) | ExprKind::FunctionParameter(..)
        ))
    }

    #[test]
    fn scalars() {
        let expr = (Expr::parameter("a") * c()).unwrap();
        let values = ParameterValues::from_iter([("a", 2.0)]);
        let substituted = substitute(&expr, &values).unwrap();
        assert_eq!(substituted, (2.0 * c()).unwrap());
        assert_eq!(substituted.domain(), &Domain::from("negative electrode"));
    }

    #[test]
    fn unknown_parameter_suggests_names() {
        let expr = Expr::parameter("Diffusivity [m2.s-1]");
        let values = ParameterValues::from_iter([("Diffusivity [m2.s-2]", 1.0)]);
        let err = substitute(&expr, &values).unwrap_err();
        let kind = err.downcast_ref::<UnknownParameter>().unwrap();
        assert_eq!(kind.name, "Diffusivity [m2.s-1]");
        assert_eq!(kind.suggestions, vec!["Diffusivity [m2.s-2]".to_string()]);
    }

    #[test]
    fn function_parameters() {
        // D(c) = D_ref * exp(-c)
        let expr = grad(
            Expr::function_parameter("D", vec![c()]).unwrap() * grad(c()).unwrap(),
        ).unwrap();
        let mut values = ParameterValues::new();
        values.insert("D", ParameterValue::function(|args| {
            Expr::parameter("D_ref") * exp(-&args[0])?
        }));
        values.insert("D_ref", 3.0);

        let substituted = substitute(&expr, &values).unwrap();
        assert!(!has_parameters(&substituted));
        assert_eq!(substituted.to_string(), "grad(3 * exp(-c) * grad(c))");
    }

    #[test]
    fn arguments_are_substituted() {
        let expr = Expr::function_parameter("f", vec![Expr::parameter("x")]).unwrap();
        let values = ParameterValues::from_iter([
            ("f", ParameterValue::function(|args| args[0].clone() * 2.0)),
            ("x", ParameterValue::Scalar(4.0)),
        ]);
        let substituted = simplify(&substitute(&expr, &values).unwrap());
        assert_eq!(substituted, Expr::scalar(8.0));
    }

    #[test]
    fn expression_values() {
        // a = 2 * b, b = 5
        let values = ParameterValues::from_iter([
            ("a", ParameterValue::Expr((2.0 * Expr::parameter("b")).unwrap())),
            ("b", ParameterValue::Scalar(5.0)),
        ]);
        let substituted = substitute(&Expr::parameter("a"), &values).unwrap();
        assert_eq!(substituted.eval_default().unwrap(), Value::Scalar(10.0));
    }

    #[test]
    fn cyclic_definitions() {
        let values = ParameterValues::from_iter([
            ("f", ParameterValue::function(|args| {
                Expr::function_parameter("g", args.to_vec())
            })),
            ("g", ParameterValue::function(|args| {
                Expr::function_parameter("f", args.to_vec())
            })),
        ]);
        let expr = Expr::function_parameter("f", vec![c()]).unwrap();
        let err = substitute(&expr, &values).unwrap_err();
        assert_eq!(err.downcast_ref::<CyclicParameter>().unwrap().name, "f");
    }

    #[test]
    fn inputs_survive() {
        let expr = (Expr::parameter("Current [A]") * 2.0).unwrap();
        let values = ParameterValues::from_iter([("Current [A]", ParameterValue::Input)]);
        let substituted = substitute(&expr, &values).unwrap();
        assert_eq!(substituted, (Expr::input_parameter("Current [A]") * 2.0).unwrap());

        let mut ctxt = Ctxt::new();
        ctxt.add_input("Current [A]", 0.75);
        let value = substituted.eval(&ctxt).unwrap().as_scalar().unwrap();
        assert_float_relative_eq!(value, 1.5);
    }

    #[test]
    fn untouched_subtrees_keep_identity() {
        let untouched = (c() * c()).unwrap();
        let expr = (&untouched + Expr::parameter("a")).unwrap();
        let values = ParameterValues::from_iter([("a", 1.0)]);
        let substituted = substitute(&expr, &values).unwrap();
        assert!(substituted.children()[0].ptr_eq(&untouched));

        let no_parameters = substitute(&untouched, &values).unwrap();
        assert!(no_parameters.ptr_eq(&untouched));
    }

    #[test]
    fn search_and_update() {
        let mut values = ParameterValues::from_iter([
            ("Negative electrode thickness [m]", 8.52e-5),
            ("Separator thickness [m]", 1.2e-5),
            ("Ambient temperature [K]", 298.15),
        ]);
        let found = values.search("THICKNESS");
        assert_eq!(found.len(), 2);

        values.update([("Ambient temperature [K]", 308.15)]);
        assert!(matches!(
            values.get("Ambient temperature [K]"),
            Some(ParameterValue::Scalar(t)) if *t == 308.15
        ));
        assert_eq!(values.len(), 3);
    }
}
