//! Error types for peprust.

use thiserror::Error;

/// Error type for peprust operations.
#[derive(Debug, Error)]
pub enum PepError {
    /// The problem cannot be solved as stated (no metric, nothing bounding the trajectory, ...).
    #[error("Ill-posed problem: {0}")]
    IllPosed(String),

    /// A point or expression built in one problem was used in another.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Malformed oracle usage or invalid class parameters.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The problem was already compiled and can no longer grow.
    #[error("Problem already compiled: {0}")]
    AlreadyCompiled(String),

    /// Solver error.
    #[error("Solver error: {0}")]
    SolverError(String),

    /// Numerical error.
    #[error("Numerical error: {0}")]
    NumericalError(String),
}

/// Result type for peprust operations.
pub type Result<T> = std::result::Result<T, PepError>;
