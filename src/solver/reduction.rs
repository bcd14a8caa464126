//! Dimension reduction of the worst-case Gram matrix.
//!
//! Interior-point solvers return a maximal-rank point of the optimal face. Once
//! the worst-case value `τ*` is known, a second SDP over the same rows
//! minimizes `⟨W, G⟩` subject to `τ ≥ τ* − tol`. With `W = I` this is the trace
//! heuristic; the log-det heuristic repeats the solve with
//! `W = (G_prev + δI)⁻¹`.

use std::fmt;
use std::str::FromStr;

use log::debug;
use nalgebra::{DMatrix, SymmetricEigen};

use super::clarabel::{solve, RawSolution, Settings};
use super::stuffing::stuff_reduction;
use crate::compile::CompiledPep;
use crate::error::{PepError, Result};

/// Regularization `δ` of the log-det reweighting.
const LOGDET_REGULARIZATION: f64 = 1e-3;

/// Heuristic used to lower the rank of the worst-case Gram matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionReduction {
    /// One solve minimizing `tr(G)`.
    Trace,
    /// A trace solve followed by `iterations` reweighted solves.
    LogDet { iterations: usize },
}

impl DimensionReduction {
    fn solves(&self) -> usize {
        match self {
            DimensionReduction::Trace => 1,
            DimensionReduction::LogDet { iterations } => 1 + iterations,
        }
    }
}

impl FromStr for DimensionReduction {
    type Err = PepError;

    /// `"trace"`, `"logdet"` (one reweighting) or `"logdet<k>"`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        if lower == "trace" {
            return Ok(DimensionReduction::Trace);
        }
        if let Some(count) = lower.strip_prefix("logdet") {
            if count.is_empty() {
                return Ok(DimensionReduction::LogDet { iterations: 1 });
            }
            if let Ok(iterations) = count.parse::<usize>() {
                return Ok(DimensionReduction::LogDet { iterations });
            }
        }
        Err(PepError::InvalidArgument(format!(
            "unknown dimension reduction '{}' (expected trace, logdet or logdet<k>)",
            s
        )))
    }
}

impl fmt::Display for DimensionReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionReduction::Trace => f.write_str("trace"),
            DimensionReduction::LogDet { iterations } => write!(f, "logdet{}", iterations),
        }
    }
}

/// Outcome of the reduction solves.
#[derive(Debug, Clone)]
pub(crate) struct ReducedSolve {
    /// Last usable solve, or the first failed one when none succeeded.
    pub raw: RawSolution,
    pub solves: usize,
    pub solve_time: f64,
    pub iterations: u32,
}

/// Run the reduction solves for a problem whose worst case is at least `floor`.
pub(crate) fn reduce(
    compiled: &CompiledPep,
    floor: f64,
    method: DimensionReduction,
    settings: &Settings,
) -> Result<ReducedSolve> {
    let dim = compiled.dim();
    let mut weights = DMatrix::identity(dim, dim);
    let mut last: Option<RawSolution> = None;
    let (mut solves, mut solve_time, mut iterations) = (0, 0.0, 0);

    for round in 0..method.solves() {
        let stuffed = stuff_reduction(compiled, &weights, floor);
        let raw = solve(&stuffed, settings)?;
        solves += 1;
        solve_time += raw.solve_time;
        iterations += raw.iterations;
        debug!(
            "dimension reduction ({}) round {}: status {}",
            method, round, raw.status
        );

        let usable = raw.status.has_value();
        if usable {
            weights = reweight(&stuffed.var_map.unpack_gram(&raw.x));
        }
        if usable || last.is_none() {
            last = Some(raw);
        }
        if !usable {
            break;
        }
    }

    let raw = last.ok_or_else(|| {
        PepError::SolverError("dimension reduction performed no solve".to_string())
    })?;
    Ok(ReducedSolve {
        raw,
        solves,
        solve_time,
        iterations,
    })
}

/// `(G + δI)⁻¹` with negative eigenvalues of `G` clipped to zero.
fn reweight(gram: &DMatrix<f64>) -> DMatrix<f64> {
    if gram.nrows() == 0 {
        return gram.clone();
    }
    let mut eig = SymmetricEigen::new(gram.clone());
    eig.eigenvalues
        .apply(|l| *l = 1.0 / (l.max(0.0) + LOGDET_REGULARIZATION));
    eig.recompose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_methods() {
        assert_eq!(
            "trace".parse::<DimensionReduction>().unwrap(),
            DimensionReduction::Trace
        );
        assert_eq!(
            "LogDet".parse::<DimensionReduction>().unwrap(),
            DimensionReduction::LogDet { iterations: 1 }
        );
        assert_eq!(
            "logdet3".parse::<DimensionReduction>().unwrap(),
            DimensionReduction::LogDet { iterations: 3 }
        );
        assert!("nuclear".parse::<DimensionReduction>().is_err());
        assert_eq!(DimensionReduction::LogDet { iterations: 2 }.to_string(), "logdet2");
    }

    #[test]
    fn test_solve_counts() {
        assert_eq!(DimensionReduction::Trace.solves(), 1);
        assert_eq!(DimensionReduction::LogDet { iterations: 4 }.solves(), 5);
    }

    #[test]
    fn test_reweight_inverts_regularized_gram() {
        let g = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let w = reweight(&g);
        assert!((w[(0, 0)] - 1.0 / (1.0 + LOGDET_REGULARIZATION)).abs() < 1e-9);
        assert!((w[(1, 1)] - 1.0 / LOGDET_REGULARIZATION).abs() < 1e-6);
        assert!(w[(0, 1)].abs() < 1e-9);
    }
}
