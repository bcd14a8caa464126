//! Verification numbers of a solve.

use nalgebra::{DMatrix, SymmetricEigen};

use super::dual::DualCertificate;
use super::witness::Witness;
use crate::compile::CompiledPep;
use crate::constraints::ConstraintKind;
use crate::solver::{smat, RawSolution, StuffedProblem};

/// Primal, dual and witness residuals.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Primal objective `τ`.
    pub tau: f64,
    /// Dual objective `bᵀz`.
    pub dual_tau: f64,
    pub gap_abs: f64,
    /// `gap_abs / max(1, |τ|)`.
    pub gap_rel: f64,
    /// `max(0, −λ_min(G*))`.
    pub primal_psd_violation: f64,
    pub max_equality_violation: f64,
    pub max_inequality_violation: f64,
    /// Same as above, evaluated on the factored witness `U Uᵀ`.
    pub witness_equality_violation: f64,
    pub witness_inequality_violation: f64,
    /// `max(0, −λ_min(S))`.
    pub dual_psd_violation: f64,
    pub min_inequality_multiplier: f64,
    /// Largest residual of `Aᵀz = −q` over the Gram, scalar and `τ` blocks.
    pub stationarity_residual: f64,
    /// `|Σ z_r s_r + ⟨S, G*⟩|`.
    pub complementary_slackness: f64,
    pub witness_rank: usize,
    pub solve_time: f64,
    pub iterations: u32,
}

impl Diagnostics {
    pub(crate) fn compute(
        compiled: &CompiledPep,
        stuffed: &StuffedProblem,
        raw: &RawSolution,
        witness: &Witness,
        certificate: &DualCertificate,
    ) -> Self {
        let var_map = &stuffed.var_map;
        let gram = var_map.unpack_gram(&raw.x);
        let scalars = var_map.unpack_scalars(&raw.x);
        let tau = var_map.unpack_tau(&raw.x);

        let mut d = Diagnostics {
            tau,
            dual_tau: certificate.dual_bound,
            primal_psd_violation: psd_violation(&gram),
            dual_psd_violation: psd_violation(&certificate.dual_matrix),
            min_inequality_multiplier: certificate.min_inequality_multiplier(),
            witness_rank: witness.rank(),
            solve_time: raw.solve_time,
            iterations: raw.iterations,
            ..Default::default()
        };
        d.gap_abs = (d.tau - d.dual_tau).abs();
        d.gap_rel = d.gap_abs / d.tau.abs().max(1.0);

        let mut slackness = 0.0;
        let mut scalar_residual = vec![0.0; var_map.scalars];
        let mut tau_residual = -1.0;
        for (c, m) in compiled.constraints.iter().zip(&certificate.multipliers) {
            let at_solver = c.form.evaluate(&gram, scalars, tau);
            match c.kind {
                ConstraintKind::Equality => {
                    d.max_equality_violation = d.max_equality_violation.max(at_solver.abs());
                }
                ConstraintKind::Inequality => {
                    d.max_inequality_violation = d.max_inequality_violation.max(at_solver);
                    slackness -= m.value * at_solver;
                }
            }
            for (&k, &coef) in &c.form.scalars {
                scalar_residual[k] += m.value * coef;
            }
            tau_residual += m.value * c.form.tau;
        }
        slackness += certificate.dual_matrix.dot(&gram);
        d.complementary_slackness = slackness.abs();

        let psd_dual = smat(&raw.z[stuffed.psd_rows()], var_map.dim);
        let gram_residual = if var_map.dim > 0 {
            (&certificate.dual_matrix - psd_dual).abs().max()
        } else {
            0.0
        };
        d.stationarity_residual = scalar_residual
            .iter()
            .fold(tau_residual.abs().max(gram_residual), |acc, r| acc.max(r.abs()));
        d.check_witness(compiled, witness);
        d
    }

    /// Re-evaluate every compiled row on `witness` and record its rank.
    pub(crate) fn check_witness(&mut self, compiled: &CompiledPep, witness: &Witness) {
        let realized = witness.gram();
        self.witness_equality_violation = 0.0;
        self.witness_inequality_violation = 0.0;
        for c in &compiled.constraints {
            let value = c.form.evaluate(&realized, witness.scalars(), witness.tau());
            match c.kind {
                ConstraintKind::Equality => {
                    self.witness_equality_violation = self.witness_equality_violation.max(value.abs());
                }
                ConstraintKind::Inequality => {
                    self.witness_inequality_violation = self.witness_inequality_violation.max(value);
                }
            }
        }
        self.witness_rank = witness.rank();
    }
}

fn psd_violation(m: &DMatrix<f64>) -> f64 {
    if m.nrows() == 0 {
        return 0.0;
    }
    let eig = SymmetricEigen::new(m.clone());
    (-eig.eigenvalues.min()).max(0.0)
}
