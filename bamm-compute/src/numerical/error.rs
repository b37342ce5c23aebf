//! Errors that can occur while evaluating expressions.

use ariadne::Fmt;
use bamm_attrs::ErrorKind;
use bamm_error::EXPR;
use std::ops::Range;

/// An input parameter has no value in the evaluation context.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("no value was given for the input parameter `{}`", self.name),
    labels = ["this input parameter"],
    help = if self.suggestions.is_empty() {
        "supply its value when evaluating the model".to_string()
    } else {
        format!("did you mean `{}`?", (&*self.suggestions[0]).fg(EXPR))
    },
)]
pub struct MissingInput {
    /// The name of the input parameter.
    pub name: String,

    /// Similarly named values in the context, if any.
    pub suggestions: Vec<String>,
}

/// A slice of the state vector lies outside the state vector given to the evaluator.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!(
        "the state slice {}..{} is out of range for a state vector of length {}",
        self.range.start,
        self.range.end,
        self.len,
    ),
    labels = ["this slice"],
    help = "the state vector must have one entry per discretised unknown",
)]
pub struct StateOutOfRange {
    /// The slice that was requested.
    pub range: Range<usize>,

    /// The length of the state vector.
    pub len: usize,
}
