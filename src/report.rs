//! Human-readable summary of a compiled problem and its solve.
//!
//! Building a [`Report`] does not log anything; [`Report::emit`] forwards the
//! lines to the `log` facade.

use log::Level;

use crate::certificate::PepResult;
use crate::compile::CompiledPep;
use crate::constraints::Provenance;
use crate::solver::Verbosity;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub level: Level,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    /// Problem lines followed by outcome lines.
    pub fn new(compiled: &CompiledPep, result: Option<&PepResult>) -> Self {
        let mut report = Report::problem(compiled);
        if let Some(result) = result {
            report.lines.extend(Report::outcome(result).lines);
        }
        report
    }

    /// Size of the compiled problem and per-function constraint counts.
    pub fn problem(compiled: &CompiledPep) -> Self {
        let mut report = Report::default();
        report.info(format!(
            "Gram matrix of size {}x{}, {} scalar variables",
            compiled.dim(),
            compiled.dim(),
            compiled.index.scalar_count()
        ));
        report.info(format!(
            "{} initial condition(s), {} user constraint(s), {} performance metric(s)",
            compiled.count(Provenance::InitialCondition),
            compiled.count(Provenance::User),
            compiled.metrics.len()
        ));
        for f in &compiled.functions {
            report.info(format!(
                "function {} ({}): {} triples, {} constraints",
                f.name, f.class, f.triples, f.constraints
            ));
        }
        report
    }

    /// Status, bound, verification numbers and warnings of a solve.
    pub fn outcome(result: &PepResult) -> Self {
        let mut report = Report::default();
        report.info(format!("solver status: {}", result.status));
        match result.value {
            Some(tau) => report.info(format!("worst-case value: {:.9}", tau)),
            None => report.warn("no worst-case value available".to_string()),
        }
        if let Some(d) = &result.diagnostics {
            report.info(format!(
                "dual value {:.9}, duality gap {:.3e} (relative {:.3e})",
                d.dual_tau, d.gap_abs, d.gap_rel
            ));
            report.info(format!(
                "primal: PSD violation {:.3e}, equality {:.3e}, inequality {:.3e}",
                d.primal_psd_violation, d.max_equality_violation, d.max_inequality_violation
            ));
            report.info(format!(
                "dual: PSD violation {:.3e}, min multiplier {:.3e}, stationarity {:.3e}, slackness {:.3e}",
                d.dual_psd_violation,
                d.min_inequality_multiplier,
                d.stationarity_residual,
                d.complementary_slackness
            ));
            report.info(format!(
                "witness of rank {}: equality {:.3e}, inequality {:.3e}",
                d.witness_rank, d.witness_equality_violation, d.witness_inequality_violation
            ));
            report.info(format!(
                "{} iterations in {:.3}s",
                d.iterations, d.solve_time
            ));
        }
        if let Some(r) = &result.reduction {
            report.info(format!(
                "dimension reduction ({}): {} solve(s), status {}, rank {} -> {}",
                r.method, r.solves, r.status, r.rank_before, r.rank_after
            ));
        }
        for w in &result.warnings {
            report.warn(w.to_string());
        }
        report
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    /// Log every line when `verbosity` is at least `Summary`.
    pub fn emit(&self, verbosity: Verbosity) {
        if verbosity < Verbosity::Summary {
            return;
        }
        for line in &self.lines {
            log::log!(line.level, "{}", line.text);
        }
    }

    fn info(&mut self, text: String) {
        self.lines.push(ReportLine {
            level: Level::Info,
            text,
        });
    }

    fn warn(&mut self, text: String) {
        self.lines.push(ReportLine {
            level: Level::Warn,
            text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::Warning;
    use crate::compile::GramIndex;
    use crate::solver::SolveStatus;

    fn empty_compiled() -> CompiledPep {
        CompiledPep {
            index: GramIndex::default(),
            constraints: Vec::new(),
            metrics: Vec::new(),
            functions: Vec::new(),
        }
    }

    #[test]
    fn test_compile_only_report() {
        let report = Report::new(&empty_compiled(), None);
        assert_eq!(report.lines().len(), 2);
        assert!(report.lines().iter().all(|l| l.level == Level::Info));
    }

    #[test]
    fn test_warnings_become_warn_lines() {
        let result = PepResult {
            status: SolveStatus::Infeasible,
            value: None,
            witness: None,
            certificate: None,
            diagnostics: None,
            reduction: None,
            warnings: vec![Warning::CertificateUnverified {
                reason: "test".into(),
            }],
        };
        let report = Report::new(&empty_compiled(), Some(&result));
        let warns = report
            .lines()
            .iter()
            .filter(|l| l.level == Level::Warn)
            .count();
        assert_eq!(warns, 2);
    }

    #[test]
    fn test_outcome_does_not_repeat_problem_lines() {
        let result = PepResult {
            status: SolveStatus::Infeasible,
            value: None,
            witness: None,
            certificate: None,
            diagnostics: None,
            reduction: None,
            warnings: Vec::new(),
        };
        let outcome = Report::outcome(&result);
        assert_eq!(outcome.lines().len(), 2);
        assert!(outcome
            .lines()
            .iter()
            .all(|l| !l.text.starts_with("Gram matrix")));

        let full = Report::new(&empty_compiled(), Some(&result));
        assert_eq!(full.lines().len(), 4);
    }
}
