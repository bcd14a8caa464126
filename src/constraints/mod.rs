//! Constraints between symbolic expressions.

pub mod constraint;

pub use constraint::{
    equal, greater_equal, less_equal, Constraint, ConstraintExt, ConstraintKind, Provenance,
};
