//! Clarabel solver integration.
//!
//! This module provides the interface to the Clarabel conic solver.

use std::fmt;
use std::str::FromStr;

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};

use super::reduction::DimensionReduction;
use super::stuffing::{svec_len, ConeDims, StuffedProblem};
use crate::error::{PepError, Result};

/// Solution status from the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Solved to reduced accuracy.
    Inaccurate,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded (the worst case is infinite).
    Unbounded,
    /// Maximum iterations reached.
    MaxIterations,
    /// Time limit reached.
    TimeLimit,
    /// Numerical difficulties.
    NumericalError,
    /// Unknown status.
    Unknown,
}

impl SolveStatus {
    /// Whether the solver iterate is worth reporting as a bound.
    pub fn has_value(&self) -> bool {
        !matches!(
            self,
            SolveStatus::Infeasible | SolveStatus::Unbounded | SolveStatus::Unknown
        )
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Inaccurate => "inaccurate",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::MaxIterations => "max iterations",
            SolveStatus::TimeLimit => "time limit",
            SolveStatus::NumericalError => "numerical error",
            SolveStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl From<SolverStatus> for SolveStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => SolveStatus::Optimal,
            SolverStatus::AlmostSolved => SolveStatus::Inaccurate,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                SolveStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                SolveStatus::Unbounded
            }
            SolverStatus::MaxIterations => SolveStatus::MaxIterations,
            SolverStatus::MaxTime => SolveStatus::TimeLimit,
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
                SolveStatus::NumericalError
            }
            _ => SolveStatus::Unknown,
        }
    }
}

/// Backend selection by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverKind {
    #[default]
    Clarabel,
}

impl FromStr for SolverKind {
    type Err = PepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(SolverKind::Clarabel),
            other => Err(PepError::InvalidArgument(format!(
                "unknown solver '{}' (available: clarabel)",
                other
            ))),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Clarabel => f.write_str("clarabel"),
        }
    }
}

/// How much a solve reports through `log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Nothing above debug level.
    #[default]
    Quiet,
    /// Problem size, status and verification numbers.
    Summary,
    /// Summary plus the solver's own iteration log.
    Solver,
}

/// Solve and verification settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub solver: SolverKind,
    pub verbosity: Verbosity,
    /// Maximum iterations.
    pub max_iter: u32,
    /// Time limit in seconds.
    pub time_limit: f64,
    /// Absolute gap tolerance.
    pub tol_gap_abs: f64,
    /// Relative gap tolerance.
    pub tol_gap_rel: f64,
    /// Feasibility tolerance.
    pub tol_feas: f64,
    /// Threshold for the certificate and witness checks.
    pub verification_tol: f64,
    /// Eigenvalues below `rank_tol · λ_max` are dropped from the witness.
    pub rank_tol: f64,
    /// Second solve lowering the witness rank, off by default.
    pub dimension_reduction: Option<DimensionReduction>,
    /// The reduction keeps `τ ≥ value − reduction_tol`.
    pub reduction_tol: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            solver: SolverKind::Clarabel,
            verbosity: Verbosity::Quiet,
            max_iter: 100,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            verification_tol: 1e-5,
            rank_tol: 1e-7,
            dimension_reduction: None,
            reduction_tol: 1e-4,
        }
    }
}

impl Settings {
    /// Select the backend by name.
    pub fn with_solver(mut self, name: &str) -> Result<Self> {
        self.solver = name.parse()?;
        Ok(self)
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_tolerances(mut self, gap_abs: f64, gap_rel: f64, feas: f64) -> Self {
        self.tol_gap_abs = gap_abs;
        self.tol_gap_rel = gap_rel;
        self.tol_feas = feas;
        self
    }

    pub fn with_verification_tol(mut self, tol: f64) -> Self {
        self.verification_tol = tol;
        self
    }

    pub fn with_rank_tol(mut self, tol: f64) -> Self {
        self.rank_tol = tol;
        self
    }

    pub fn with_dimension_reduction(mut self, method: DimensionReduction) -> Self {
        self.dimension_reduction = Some(method);
        self
    }

    pub fn with_reduction_tol(mut self, tol: f64) -> Self {
        self.reduction_tol = tol;
        self
    }
}

/// Raw solver output, in stuffed coordinates.
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub status: SolveStatus,
    /// Primal variables.
    pub x: Vec<f64>,
    /// Dual variables, one per row of A.
    pub z: Vec<f64>,
    /// Primal slacks, one per row of A.
    pub s: Vec<f64>,
    /// Solve time in seconds.
    pub solve_time: f64,
    /// Number of iterations.
    pub iterations: u32,
}

/// Solve the stuffed problem.
pub fn solve(problem: &StuffedProblem, settings: &Settings) -> Result<RawSolution> {
    match settings.solver {
        SolverKind::Clarabel => solve_clarabel(problem, settings),
    }
}

fn solve_clarabel(problem: &StuffedProblem, settings: &Settings) -> Result<RawSolution> {
    let p = to_clarabel_csc(&problem.p);
    let a = to_clarabel_csc(&problem.a);
    let cones = to_clarabel_cones(&problem.cone_dims);

    let clarabel_settings = DefaultSettingsBuilder::default()
        .verbose(settings.verbosity >= Verbosity::Solver)
        .max_iter(settings.max_iter)
        .time_limit(settings.time_limit)
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .tol_feas(settings.tol_feas)
        .build()
        .map_err(|e| PepError::SolverError(format!("invalid Clarabel settings: {}", e)))?;

    let mut solver = DefaultSolver::new(&p, &problem.q, &a, &problem.b, &cones, clarabel_settings);
    solver.solve();

    Ok(RawSolution {
        status: solver.solution.status.into(),
        x: solver.solution.x.clone(),
        z: solver.solution.z.clone(),
        s: solver.solution.s.clone(),
        solve_time: solver.solution.solve_time,
        iterations: solver.info.iterations,
    })
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

/// Convert cone dimensions to Clarabel cones.
fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();

    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }

    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }

    if svec_len(dims.psd) > 0 {
        cones.push(SupportedConeT::PSDTriangleConeT(dims.psd));
    }

    cones
}
