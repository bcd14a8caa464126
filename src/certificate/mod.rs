//! Solve results: the bound, a primal witness, a dual certificate and the
//! numbers that check them against each other.

pub mod diagnostics;
pub mod dual;
pub mod witness;

pub use diagnostics::Diagnostics;
pub use dual::{DualCertificate, Multiplier};
pub use witness::Witness;

use std::fmt;

use crate::compile::CompiledPep;
use crate::expr::ProblemId;
use crate::solver::{
    DimensionReduction, RawSolution, ReducedSolve, Settings, SolveStatus, StuffedProblem,
    VariableMap,
};

/// Non-fatal issue attached to a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The solver stopped short of full accuracy; the value may be unreliable.
    InaccurateSolve { status: SolveStatus },
    /// The solver's Gram matrix or scalars violate a compiled row or `G ⪰ 0`.
    PrimalInfeasible { violation: f64 },
    /// A dual check failed; the bound stands but is not certified.
    CertificateUnverified { reason: String },
    /// The factored witness violates a compiled constraint.
    WitnessInfeasible { violation: f64 },
    /// The dimension reduction solve failed; the witness is the one from the
    /// worst-case solve.
    ReductionFailed { status: SolveStatus },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InaccurateSolve { status } => {
                write!(f, "solver status '{}', the bound may be unreliable", status)
            }
            Warning::PrimalInfeasible { violation } => {
                write!(f, "solver iterate violates a constraint by {:.3e}", violation)
            }
            Warning::CertificateUnverified { reason } => {
                write!(f, "dual certificate not verified: {}", reason)
            }
            Warning::WitnessInfeasible { violation } => {
                write!(f, "witness violates a constraint by {:.3e}", violation)
            }
            Warning::ReductionFailed { status } => {
                write!(f, "dimension reduction ended with status '{}'", status)
            }
        }
    }
}

/// The second solve run by [`DimensionReduction`].
#[derive(Debug, Clone)]
pub struct ReductionSummary {
    pub method: DimensionReduction,
    /// Status of the last reduction solve.
    pub status: SolveStatus,
    pub solves: usize,
    /// `τ` at the reduced Gram matrix, at least `value − reduction_tol`.
    pub tau: Option<f64>,
    /// Witness rank from the worst-case solve.
    pub rank_before: usize,
    /// Witness rank after reduction.
    pub rank_after: usize,
    pub solve_time: f64,
    pub iterations: u32,
}

/// Outcome of `Pep::solve`.
#[derive(Debug, Clone)]
pub struct PepResult {
    pub status: SolveStatus,
    /// The worst-case bound, when the solver produced one.
    pub value: Option<f64>,
    pub witness: Option<Witness>,
    pub certificate: Option<DualCertificate>,
    pub diagnostics: Option<Diagnostics>,
    /// Present when a dimension reduction was requested and attempted.
    pub reduction: Option<ReductionSummary>,
    pub warnings: Vec<Warning>,
}

impl PepResult {
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Optimal and every check passed.
    pub fn is_verified(&self) -> bool {
        self.is_optimal() && self.warnings.is_empty()
    }
}

/// Absolute tolerances scale with the size of the bound.
fn scaled_tol(settings: &Settings, tau: f64) -> f64 {
    settings.verification_tol * tau.abs().max(1.0)
}

/// Turn a raw solve into a result, running every verification check.
pub(crate) fn analyze(
    problem: ProblemId,
    compiled: &CompiledPep,
    stuffed: &StuffedProblem,
    raw: &RawSolution,
    settings: &Settings,
) -> PepResult {
    if !raw.status.has_value() {
        return PepResult {
            status: raw.status,
            value: None,
            witness: None,
            certificate: None,
            diagnostics: None,
            reduction: None,
            warnings: Vec::new(),
        };
    }

    let tau = stuffed.var_map.unpack_tau(&raw.x);
    let witness = witness_from(problem, compiled, &stuffed.var_map, raw, settings);
    let certificate = DualCertificate::assemble(compiled, stuffed, &raw.z);
    let diagnostics = Diagnostics::compute(compiled, stuffed, raw, &witness, &certificate);

    let mut warnings = solve_warnings(raw.status, &diagnostics, settings);
    warnings.extend(witness_warning(&diagnostics, scaled_tol(settings, tau)));

    PepResult {
        status: raw.status,
        value: Some(tau),
        witness: Some(witness),
        certificate: Some(certificate),
        diagnostics: Some(diagnostics),
        reduction: None,
        warnings,
    }
}

fn witness_from(
    problem: ProblemId,
    compiled: &CompiledPep,
    var_map: &VariableMap,
    raw: &RawSolution,
    settings: &Settings,
) -> Witness {
    Witness::reconstruct(
        problem,
        compiled.index.clone(),
        var_map.unpack_gram(&raw.x),
        var_map.unpack_scalars(&raw.x).to_vec(),
        var_map.unpack_tau(&raw.x),
        settings.rank_tol,
    )
}

/// Status, primal and dual checks of the worst-case solve.
fn solve_warnings(status: SolveStatus, d: &Diagnostics, settings: &Settings) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if status != SolveStatus::Optimal {
        warnings.push(Warning::InaccurateSolve { status });
    }
    let tol = settings.verification_tol;
    let scaled = scaled_tol(settings, d.tau);

    let primal = d
        .primal_psd_violation
        .max(d.max_equality_violation)
        .max(d.max_inequality_violation);
    if primal > scaled {
        warnings.push(Warning::PrimalInfeasible { violation: primal });
    }

    let mut reasons = Vec::new();
    if d.dual_psd_violation > scaled {
        reasons.push(format!(
            "dual matrix has eigenvalue {:.3e}",
            -d.dual_psd_violation
        ));
    }
    if d.min_inequality_multiplier < -scaled {
        reasons.push(format!(
            "negative inequality multiplier {:.3e}",
            d.min_inequality_multiplier
        ));
    }
    if d.stationarity_residual > scaled {
        reasons.push(format!("stationarity residual {:.3e}", d.stationarity_residual));
    }
    if d.gap_rel > tol {
        reasons.push(format!("relative duality gap {:.3e}", d.gap_rel));
    }
    if d.complementary_slackness > scaled {
        reasons.push(format!(
            "complementary slackness {:.3e}",
            d.complementary_slackness
        ));
    }
    if !reasons.is_empty() {
        warnings.push(Warning::CertificateUnverified {
            reason: reasons.join("; "),
        });
    }
    warnings
}

fn witness_warning(d: &Diagnostics, scaled: f64) -> Option<Warning> {
    let violation = d
        .witness_equality_violation
        .max(d.witness_inequality_violation);
    (violation > scaled).then_some(Warning::WitnessInfeasible { violation })
}

/// Replace the witness of `result` by the one from the reduction solves.
///
/// The value, certificate and dual diagnostics keep describing the worst-case
/// solve; only the witness numbers are recomputed.
pub(crate) fn attach_reduction(
    result: &mut PepResult,
    problem: ProblemId,
    compiled: &CompiledPep,
    var_map: &VariableMap,
    reduced: &ReducedSolve,
    method: DimensionReduction,
    settings: &Settings,
) {
    let rank_before = result.witness.as_ref().map_or(0, Witness::rank);
    let raw = &reduced.raw;
    let mut summary = ReductionSummary {
        method,
        status: raw.status,
        solves: reduced.solves,
        tau: None,
        rank_before,
        rank_after: rank_before,
        solve_time: reduced.solve_time,
        iterations: reduced.iterations,
    };

    if raw.status.has_value() {
        let witness = witness_from(problem, compiled, var_map, raw, settings);
        summary.tau = Some(witness.tau());
        summary.rank_after = witness.rank();
        if let Some(d) = result.diagnostics.as_mut() {
            d.check_witness(compiled, &witness);
            let scaled = scaled_tol(settings, d.tau);
            result
                .warnings
                .retain(|w| !matches!(w, Warning::WitnessInfeasible { .. }));
            result.warnings.extend(witness_warning(d, scaled));
        }
        result.witness = Some(witness);
    } else {
        result
            .warnings
            .push(Warning::ReductionFailed { status: raw.status });
    }
    result.reduction = Some(summary);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_diagnostics() -> Diagnostics {
        Diagnostics {
            tau: 0.5,
            dual_tau: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::InaccurateSolve {
            status: SolveStatus::TimeLimit,
        };
        assert!(w.to_string().contains("time limit"));
        let w = Warning::WitnessInfeasible { violation: 0.5 };
        assert!(w.to_string().contains("5.000e-1"));
        let w = Warning::ReductionFailed {
            status: SolveStatus::NumericalError,
        };
        assert!(w.to_string().contains("numerical error"));
    }

    #[test]
    fn test_clean_solve_has_no_warnings() {
        let warnings = solve_warnings(
            SolveStatus::Optimal,
            &clean_diagnostics(),
            &Settings::default(),
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_primal_violation_is_flagged() {
        let settings = Settings::default();
        for d in [
            Diagnostics {
                primal_psd_violation: 1e-2,
                ..clean_diagnostics()
            },
            Diagnostics {
                max_equality_violation: 1e-3,
                ..clean_diagnostics()
            },
            Diagnostics {
                max_inequality_violation: 1e-3,
                ..clean_diagnostics()
            },
        ] {
            let warnings = solve_warnings(SolveStatus::Optimal, &d, &settings);
            assert_eq!(warnings.len(), 1);
            assert!(matches!(warnings[0], Warning::PrimalInfeasible { .. }));
        }
    }

    #[test]
    fn test_primal_tolerance_scales_with_bound() {
        // 1e-4 is within 1e-5 · |τ| for τ = 100
        let d = Diagnostics {
            tau: 100.0,
            dual_tau: 100.0,
            max_inequality_violation: 1e-4,
            ..Default::default()
        };
        assert!(solve_warnings(SolveStatus::Optimal, &d, &Settings::default()).is_empty());
    }

    #[test]
    fn test_dual_failures_share_one_warning() {
        let d = Diagnostics {
            dual_psd_violation: 1e-2,
            min_inequality_multiplier: -1e-2,
            ..clean_diagnostics()
        };
        let warnings = solve_warnings(SolveStatus::Inaccurate, &d, &Settings::default());
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0],
            Warning::InaccurateSolve {
                status: SolveStatus::Inaccurate
            }
        );
        match &warnings[1] {
            Warning::CertificateUnverified { reason } => {
                assert!(reason.contains("dual matrix"));
                assert!(reason.contains("multiplier"));
            }
            other => panic!("unexpected warning {:?}", other),
        }
    }

    #[test]
    fn test_witness_warning_threshold() {
        let mut d = clean_diagnostics();
        assert!(witness_warning(&d, 1e-5).is_none());
        d.witness_inequality_violation = 1e-3;
        assert_eq!(
            witness_warning(&d, 1e-5),
            Some(Warning::WitnessInfeasible { violation: 1e-3 })
        );
    }
}
