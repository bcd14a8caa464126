//! Symbolic point/expression algebra.
//!
//! This module provides the value-free algebra that algorithm descriptions are
//! written in:
//! - `Point` - a vector as a linear combination of basis atoms
//! - `Expression` - a scalar with a linear part over scalar atoms and a
//!   symmetric bilinear part over point atoms
//! - `Atom` / `ProblemId` - opaque handles allocated by a problem's arena

pub mod atom;
pub mod expression;
pub mod ops;
pub mod point;

// Re-export main types
pub use atom::{Atom, ProblemId};
pub(crate) use atom::Context;
pub use expression::Expression;
pub use point::{inner_product, Point};
