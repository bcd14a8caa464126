//! Dual certificate assembled from the solver multipliers.

use nalgebra::DMatrix;

use crate::compile::CompiledPep;
use crate::constraints::{ConstraintKind, Provenance};
use crate::solver::StuffedProblem;

/// Multiplier of one compiled constraint.
#[derive(Debug, Clone)]
pub struct Multiplier {
    pub name: String,
    pub provenance: Provenance,
    pub kind: ConstraintKind,
    pub value: f64,
}

/// Dual multipliers of every compiled constraint.
///
/// Summing the constraints with these weights proves
/// `min_i m_i ≤ dual_bound` for every instance, provided `dual_matrix` is
/// positive semidefinite and every inequality multiplier is non-negative.
#[derive(Debug, Clone)]
pub struct DualCertificate {
    /// In compiled order.
    pub multipliers: Vec<Multiplier>,
    /// Weights λ_i of the metrics (they sum to one).
    pub metric_weights: Vec<f64>,
    /// `S = Σ_r z_r C_r` over the Gram parts of the rows.
    pub dual_matrix: DMatrix<f64>,
    /// `bᵀz`.
    pub dual_bound: f64,
}

impl DualCertificate {
    pub(crate) fn assemble(compiled: &CompiledPep, stuffed: &StuffedProblem, z: &[f64]) -> Self {
        let mut values = vec![0.0; compiled.constraints.len()];
        for (row, &k) in stuffed.row_map.iter().enumerate() {
            values[k] = z[row];
        }

        let dim = compiled.dim();
        let mut dual_matrix = DMatrix::zeros(dim, dim);
        let mut dual_bound = 0.0;
        for (c, &y) in compiled.constraints.iter().zip(&values) {
            dual_matrix += c.form.gram_matrix(dim) * y;
            dual_bound -= y * c.form.constant;
        }

        let multipliers = compiled
            .constraints
            .iter()
            .zip(&values)
            .map(|(c, &value)| Multiplier {
                name: c.name.clone(),
                provenance: c.provenance,
                kind: c.kind,
                value,
            })
            .collect::<Vec<_>>();
        let metric_weights = multipliers
            .iter()
            .filter(|m| m.provenance == Provenance::PerformanceMetric)
            .map(|m| m.value)
            .collect();

        DualCertificate {
            multipliers,
            metric_weights,
            dual_matrix,
            dual_bound,
        }
    }

    /// Multiplier of the constraint called `name`.
    pub fn multiplier(&self, name: &str) -> Option<f64> {
        self.multipliers
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value)
    }

    /// Most negative multiplier of an inequality (0 if none is negative).
    pub fn min_inequality_multiplier(&self) -> f64 {
        self.multipliers
            .iter()
            .filter(|m| m.kind == ConstraintKind::Inequality)
            .map(|m| m.value)
            .fold(0.0, f64::min)
    }
}
