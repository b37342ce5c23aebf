//! Errors that can occur while checking and processing a model.

use bamm_attrs::ErrorKind;

/// The model cannot be solved as posed.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the model is ill-posed: {}", self.reason),
    labels = ["this expression"],
)]
pub struct IllPosedModel {
    /// What is wrong with the model.
    pub reason: String,
}

/// A function parameter was applied to the wrong number of arguments.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!(
        "the function parameter `{}` takes {} argument(s), but {} were given",
        self.name,
        self.expected,
        self.given,
    ),
    labels = ["this function parameter"],
)]
pub struct ArgumentCount {
    /// The name of the function parameter.
    pub name: String,

    /// The number of arguments the definition takes.
    pub expected: usize,

    /// The number of arguments given.
    pub given: usize,
}

/// An input parameter was given a value that is not a number.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the input parameter `{}` must be given a number", self.name),
    help = "input parameters are evaluated, not substituted: give them a scalar value",
)]
pub struct InvalidInput {
    /// The name of the input parameter.
    pub name: String,
}
