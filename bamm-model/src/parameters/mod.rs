//! Parameter sets for battery models.
//!
//! Presets are plain [`ParameterValues`](bamm_compute::symbolic::ParameterValues) values: call the
//! preset function, change what you need with
//! [`insert`](bamm_compute::symbolic::ParameterValues::insert) or
//! [`update`](bamm_compute::symbolic::ParameterValues::update), and pass the result to the
//! pipeline.

pub mod lgm50;

pub use lgm50::lgm50;

use bamm_compute::symbolic::Expr;
use bamm_error::Error;
use crate::error::ArgumentCount;

/// Destructures the arguments of the function parameter `name` into an array, checking their
/// number.
pub(crate) fn arguments<const N: usize>(name: &str, args: &[Expr]) -> Result<[Expr; N], Error> {
    <[Expr; N]>::try_from(args.to_vec()).map_err(|args| Error::bare(ArgumentCount {
        name: name.to_string(),
        expected: N,
        given: args.len(),
    }))
}
