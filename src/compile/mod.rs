//! Reduction of the symbolic problem to a finite system over `(G, F, τ)`.
//!
//! - `GramIndex` - deterministic layout of the reachable atoms
//! - `LinearForm` - an expression rewritten over Gram entries and scalars
//! - `CompiledPep` - the full compiled system handed to the solver

pub mod compiler;
pub mod gram;

pub use compiler::{CompiledConstraint, CompiledPep, FunctionSummary};
pub(crate) use compiler::{compile, Sources};
pub use gram::{GramIndex, LinearForm};
