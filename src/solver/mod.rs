//! Solver interface.
//!
//! This module provides:
//! - Matrix stuffing of a compiled problem into conic standard form
//! - Clarabel solver integration and solve settings
//! - Dimension reduction of the worst-case Gram matrix

pub mod clarabel;
pub mod reduction;
pub mod stuffing;

pub use self::clarabel::{solve, RawSolution, Settings, SolveStatus, SolverKind, Verbosity};
pub use reduction::DimensionReduction;
pub(crate) use reduction::{reduce, ReducedSolve};
pub use stuffing::{
    smat, stuff_problem, stuff_reduction, svec_index, svec_len, ConeDims, StuffedProblem,
    VariableMap,
};
