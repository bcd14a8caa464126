//! Primitive algorithmic steps.
//!
//! Each step allocates the free points it needs, registers the resulting
//! triples on the functions involved, and returns the new iterate together
//! with the oracle outputs that describe it.

pub mod bregman;
pub mod gradient;
pub mod linear_optimization;
pub mod proximal;

pub use bregman::{bregman_gradient_step, bregman_proximal_step};
pub use gradient::{exact_linesearch_step, inexact_gradient_step, InexactNotion};
pub use linear_optimization::linear_optimization_step;
pub use proximal::proximal_step;

use crate::error::Result;
use crate::expr::Expression;
use crate::functions::Function;

/// Fresh value for a triple of `f`, or zero when `f` is an operator.
pub(crate) fn fresh_value(f: &Function) -> Result<Expression> {
    if f.is_operator() {
        Ok(Expression::zero())
    } else {
        f.context().new_scalar()
    }
}
