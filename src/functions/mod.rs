//! Function and operator classes.
//!
//! A class only knows how to turn recorded oracle triples into interpolation
//! constraints ([`FunctionClass`]). The [`Function`] handle records the triples
//! and exposes the oracle calls algorithm descriptions are written with.

pub mod bregman;
pub mod class;
pub mod convex;
pub mod function;
pub mod growth;
pub mod indicator;
pub mod lipschitz;
pub mod operators;

pub use bregman::{bregman_divergence, declare_relatively_smooth};
pub use class::{FunctionClass, Triple};
pub use convex::{
    ConvexFunction, SmoothConvexFunction, SmoothFunction, SmoothStronglyConvexFunction,
    StronglyConvexFunction,
};
pub use function::Function;
pub(crate) use function::LeafFunction;
pub use growth::{ConvexQgFunction, RsiEbFunction};
pub use indicator::ConvexIndicatorFunction;
pub use lipschitz::ConvexLipschitzFunction;
pub use operators::{
    CocoerciveOperator, LipschitzOperator, LipschitzStronglyMonotoneOperator, MonotoneOperator,
    StronglyMonotoneOperator,
};
