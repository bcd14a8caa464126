//! # peprust
//!
//! Worst-case performance estimation of first-order methods.
//!
//! An algorithm is described symbolically: points and function values are
//! abstract handles, oracle calls on declared functions record interpolation
//! samples, and the worst case of a performance metric over every function of
//! the class is computed by a semidefinite program solved with Clarabel.
//!
//! ## Quick Start
//!
//! ```ignore
//! use peprust::prelude::*;
//!
//! let (l, gamma, n) = (3.0, 1.0 / 3.0, 4);
//! let mut pep = Pep::new();
//! let f = pep.declare_function(SmoothConvexFunction::new(l)?)?;
//! let xs = f.stationary_point()?;
//! let x0 = pep.set_initial_point()?;
//! pep.set_initial_condition((&x0 - &xs).norm_squared().le(1.0))?;
//!
//! let mut x = x0.clone();
//! for _ in 0..n {
//!     x = &x - f.gradient(&x)? * gamma;
//! }
//! pep.set_performance_metric(f.value(&x)? - f.value(&xs)?)?;
//!
//! let result = pep.solve()?;
//! println!("worst case: {:?}", result.value); // ≈ L / (4nLγ + 2) = 1/6
//! ```
//!
//! ## Architecture
//!
//! - **Symbolic algebra** (`expr`): points and expressions in linear/bilinear
//!   normal form over atoms allocated by the problem's own arena
//! - **Function classes** (`functions`): each class turns recorded triples into
//!   its interpolation constraints
//! - **Primitive steps** (`steps`): proximal, inexact gradient, line search,
//!   Bregman and linear optimization steps
//! - **Compiler** (`compile`): Gram layout and linear forms over `(G, F, τ)`
//! - **Solver** (`solver`): stuffing into Clarabel's conic form
//! - **Certificate** (`certificate`): primal witness, dual certificate and
//!   verification diagnostics

pub mod certificate;
pub mod compile;
pub mod constraints;
pub mod error;
pub mod expr;
pub mod functions;
pub mod problem;
pub mod report;
pub mod solver;
pub mod sparse;
pub mod steps;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use peprust::prelude::*;
/// ```
pub mod prelude {
    // Algebra
    pub use crate::expr::{inner_product, Expression, Point};

    // Constraints
    pub use crate::constraints::{
        equal, greater_equal, less_equal, Constraint, ConstraintExt, ConstraintKind, Provenance,
    };

    // Functions and operators
    pub use crate::functions::{
        bregman_divergence, declare_relatively_smooth, CocoerciveOperator, ConvexFunction,
        ConvexIndicatorFunction, ConvexLipschitzFunction, ConvexQgFunction, Function,
        FunctionClass, LipschitzOperator, LipschitzStronglyMonotoneOperator, MonotoneOperator,
        RsiEbFunction, SmoothConvexFunction, SmoothFunction, SmoothStronglyConvexFunction,
        StronglyConvexFunction, StronglyMonotoneOperator, Triple,
    };

    // Steps
    pub use crate::steps::{
        bregman_gradient_step, bregman_proximal_step, exact_linesearch_step,
        inexact_gradient_step, linear_optimization_step, proximal_step, InexactNotion,
    };

    // Problem
    pub use crate::problem::Pep;

    // Solver and results
    pub use crate::certificate::{
        Diagnostics, DualCertificate, PepResult, ReductionSummary, Warning, Witness,
    };
    pub use crate::solver::{DimensionReduction, Settings, SolveStatus, SolverKind, Verbosity};

    // Errors
    pub use crate::error::{PepError, Result};
}

// Re-export main types at crate root
pub use certificate::PepResult;
pub use error::{PepError, Result};
pub use problem::Pep;
pub use solver::{Settings, SolveStatus};
