//! Errors that can occur while building and transforming expression trees.

use ariadne::Fmt;
use bamm_attrs::ErrorKind;
use bamm_error::EXPR;
use super::{domain::Domain, shape::Shape};

/// Two operands defined on incompatible domains were combined.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "cannot combine expressions defined on different domains",
    labels = [
        format!("this operand is defined on {}", self.left),
        format!("this operand is defined on {}", self.right),
    ],
    help = "operands must be defined on the same domain, or one of them on no domain at all",
)]
pub struct DomainMismatch {
    /// The domain of the first offending operand.
    pub left: Domain,

    /// The domain of the second offending operand.
    pub right: Domain,
}

/// Two operands have incompatible shapes.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot apply `{}` to operands of these shapes", self.op),
    labels = [
        format!("this operand has shape {}", self.left),
        format!("this operand has shape {}", self.right),
    ],
)]
pub struct ShapeMismatch {
    /// The operator that was applied.
    pub op: String,

    /// The shape of the first offending operand.
    pub left: Shape,

    /// The shape of the second offending operand.
    pub right: Shape,
}

/// A spatial operator was applied to an expression that is not defined over any domain.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` needs an operand defined over a spatial domain", self.op),
    labels = ["this operand has no domain"],
)]
pub struct NoSpatialDomain {
    /// The name of the spatial operator.
    pub op: &'static str,
}

/// A parameter referenced by the expression has no value in the parameter set.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the parameter `{}` has no value", self.name),
    labels = ["this parameter"],
    help = if self.suggestions.is_empty() {
        "add a value for it to the parameter set".to_string()
    } else if self.suggestions.len() == 1 {
        format!("did you mean `{}`?", (&*self.suggestions[0]).fg(EXPR))
    } else {
        format!(
            "did you mean one of these parameters? {}",
            self.suggestions
                .iter()
                .map(|s| format!("`{}`", s.fg(EXPR)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    },
)]
pub struct UnknownParameter {
    /// The name of the parameter.
    pub name: String,

    /// Similarly named parameters in the parameter set, if any.
    pub suggestions: Vec<String>,
}

/// The definition of a function parameter refers back to itself.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the function parameter `{}` is defined in terms of itself", self.name),
    labels = ["this function parameter"],
)]
pub struct CyclicParameter {
    /// The name of the function parameter.
    pub name: String,
}

/// The expression cannot be differentiated symbolically.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` cannot be differentiated", self.name),
    labels = ["this expression"],
    help = "substitute parameter values before differentiating",
)]
pub struct NotDifferentiable {
    /// A description of the offending node.
    pub name: String,
}

/// A symbolic node survived into a stage that requires it to be resolved.
///
/// This indicates the pipeline stages were run out of order (for example, a parameter reached
/// the discretiser), rather than a problem with the model data.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unresolved {} `{}`", self.kind, self.name),
    labels = ["this node"],
    help = match self.kind {
        "parameter" | "function parameter" => "parameters must be substituted before discretisation",
        "variable" | "spatial operator" | "spatial variable" => "the expression must be discretised before it is evaluated",
        _ => "this node must be resolved by an earlier stage",
    },
)]
pub struct UnresolvedSymbol {
    /// The kind of node, such as `parameter` or `variable`.
    pub kind: &'static str,

    /// The name of the node.
    pub name: String,
}

/// An expression was differentiated with respect to something other than a variable or a slice
/// of the state vector.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot differentiate with respect to `{}`", self.target),
    labels = ["this expression"],
    help = "differentiate with respect to a variable, or a slice of the state vector",
)]
pub struct InvalidDifferentiationTarget {
    /// The rendered target expression.
    pub target: String,
}
