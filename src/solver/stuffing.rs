//! Matrix stuffing: converts a compiled problem to Clarabel's standard form.
//!
//! The decision vector is `x = [svec(G); F; τ]` and the problem is
//!
//! ```text
//! minimize  −τ
//! s.t.      A x + s = b,   s ∈ Zero × Nonnegative × PSDTriangle(n)
//! ```
//!
//! Dimension reduction reuses the same rows with the objective `⟨W, G⟩` and
//! one extra nonnegative row `τ ≥ floor`.
//!
//! `svec` stacks the upper triangle column by column with off-diagonal entries
//! scaled by √2, which is the layout of Clarabel's PSD triangle cone.

use std::f64::consts::SQRT_2;

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use crate::compile::{CompiledPep, LinearForm};
use crate::constraints::ConstraintKind;
use crate::sparse::csc_from_triplets;

/// Cone dimensions for Clarabel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConeDims {
    /// Number of zero cone (equality) rows.
    pub zero: usize,
    /// Number of nonnegative cone rows.
    pub nonneg: usize,
    /// Side of the PSD matrix (the cone has `n(n+1)/2` rows).
    pub psd: usize,
}

impl ConeDims {
    /// Total number of constraint rows.
    pub fn total(&self) -> usize {
        self.zero + self.nonneg + svec_len(self.psd)
    }
}

/// Length of `svec` of an `n × n` symmetric matrix.
pub fn svec_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Position of entry `(i, j)` in `svec`.
pub fn svec_index(i: usize, j: usize) -> usize {
    let (i, j) = (i.min(j), i.max(j));
    j * (j + 1) / 2 + i
}

/// Column layout of `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableMap {
    pub dim: usize,
    pub scalars: usize,
}

impl VariableMap {
    pub fn gram_col(&self, i: usize, j: usize) -> usize {
        svec_index(i, j)
    }

    pub fn scalar_col(&self, k: usize) -> usize {
        svec_len(self.dim) + k
    }

    pub fn tau_col(&self) -> usize {
        svec_len(self.dim) + self.scalars
    }

    pub fn total_vars(&self) -> usize {
        self.tau_col() + 1
    }

    /// Symmetric `G` from the `svec` block of `x`.
    pub fn unpack_gram(&self, x: &[f64]) -> DMatrix<f64> {
        smat(&x[..svec_len(self.dim)], self.dim)
    }

    pub fn unpack_scalars<'a>(&self, x: &'a [f64]) -> &'a [f64] {
        &x[svec_len(self.dim)..self.tau_col()]
    }

    pub fn unpack_tau(&self, x: &[f64]) -> f64 {
        x[self.tau_col()]
    }
}

/// Inverse of `svec`.
pub fn smat(v: &[f64], n: usize) -> DMatrix<f64> {
    let mut m = DMatrix::zeros(n, n);
    for j in 0..n {
        for i in 0..=j {
            let value = v[svec_index(i, j)];
            if i == j {
                m[(i, i)] = value;
            } else {
                m[(i, j)] = value / SQRT_2;
                m[(j, i)] = value / SQRT_2;
            }
        }
    }
    m
}

/// Stuffed problem ready for Clarabel.
#[derive(Debug)]
pub struct StuffedProblem {
    /// Quadratic cost matrix P (always zero).
    pub p: CscMatrix<f64>,
    /// Linear cost vector q.
    pub q: Vec<f64>,
    /// Constraint matrix A.
    pub a: CscMatrix<f64>,
    /// Constraint vector b.
    pub b: Vec<f64>,
    pub cone_dims: ConeDims,
    pub var_map: VariableMap,
    /// For each zero/nonnegative row, the index of its compiled constraint.
    /// A reduction problem's `τ` floor row follows these rows and is not
    /// listed.
    pub row_map: Vec<usize>,
}

impl StuffedProblem {
    /// Rows of the PSD block.
    pub fn psd_rows(&self) -> std::ops::Range<usize> {
        let start = self.cone_dims.zero + self.cone_dims.nonneg;
        start..start + svec_len(self.cone_dims.psd)
    }
}

/// Build the worst-case problem: maximize `τ` over the compiled rows.
pub fn stuff_problem(compiled: &CompiledPep) -> StuffedProblem {
    stuff_with(compiled, None)
}

/// Build a dimension-reduction problem: minimize `⟨W, G⟩` over the compiled
/// rows plus `τ ≥ floor`.
///
/// `weights` must be symmetric with the side of the Gram matrix.
pub fn stuff_reduction(compiled: &CompiledPep, weights: &DMatrix<f64>, floor: f64) -> StuffedProblem {
    stuff_with(compiled, Some((weights, floor)))
}

fn stuff_with(compiled: &CompiledPep, reduction: Option<(&DMatrix<f64>, f64)>) -> StuffedProblem {
    let var_map = VariableMap {
        dim: compiled.index.dim(),
        scalars: compiled.index.scalar_count(),
    };
    let n = var_map.total_vars();

    let mut q = vec![0.0; n];
    match reduction {
        None => q[var_map.tau_col()] = -1.0,
        // ⟨W, G⟩ = Σ W_ii G_ii + √2 Σ_{i<j} W_ij svec(G)_ij
        Some((weights, _)) => {
            for j in 0..var_map.dim {
                for i in 0..=j {
                    let scale = if i == j { 1.0 } else { SQRT_2 };
                    q[var_map.gram_col(i, j)] = weights[(i, j)] * scale;
                }
            }
        }
    }

    // Zero rows first, then nonnegative rows
    let mut row_map = Vec::with_capacity(compiled.constraints.len());
    for kind in [ConstraintKind::Equality, ConstraintKind::Inequality] {
        row_map.extend(
            compiled
                .constraints
                .iter()
                .enumerate()
                .filter(|(_, c)| c.kind == kind)
                .map(|(k, _)| k),
        );
    }
    let extra = usize::from(reduction.is_some());
    let cone_dims = ConeDims {
        zero: compiled.equalities().count(),
        nonneg: compiled.inequalities().count() + extra,
        psd: var_map.dim,
    };

    let mut a_rows = Vec::new();
    let mut a_cols = Vec::new();
    let mut a_vals = Vec::new();
    let mut b = vec![0.0; cone_dims.total()];

    // Both cones read `form ≤ 0` / `form = 0` as A x + s = −constant.
    for (row, &k) in row_map.iter().enumerate() {
        b[row] = stuff_linear_form(
            &compiled.constraints[k].form,
            &var_map,
            row,
            &mut a_rows,
            &mut a_cols,
            &mut a_vals,
        );
    }

    // −τ + s = −floor
    if let Some((_, floor)) = reduction {
        a_rows.push(row_map.len());
        a_cols.push(var_map.tau_col());
        a_vals.push(-1.0);
        b[row_map.len()] = -floor;
    }

    // PSD block: s = svec(G), i.e. −I x_svec + s = 0
    let offset = row_map.len() + extra;
    for col in 0..svec_len(var_map.dim) {
        a_rows.push(offset + col);
        a_cols.push(col);
        a_vals.push(-1.0);
    }

    let a = csc_from_triplets(cone_dims.total(), n, a_rows, a_cols, a_vals);
    let p = CscMatrix::zeros(n, n);

    StuffedProblem {
        p,
        q,
        a,
        b,
        cone_dims,
        var_map,
        row_map,
    }
}

/// Stuff one linear form into row `row` of A and return its `b` entry.
fn stuff_linear_form(
    form: &LinearForm,
    var_map: &VariableMap,
    row: usize,
    a_rows: &mut Vec<usize>,
    a_cols: &mut Vec<usize>,
    a_vals: &mut Vec<f64>,
) -> f64 {
    for (&(i, j), &c) in &form.gram {
        let scale = if i == j { 1.0 } else { 1.0 / SQRT_2 };
        a_rows.push(row);
        a_cols.push(var_map.gram_col(i, j));
        a_vals.push(c * scale);
    }
    for (&k, &d) in &form.scalars {
        a_rows.push(row);
        a_cols.push(var_map.scalar_col(k));
        a_vals.push(d);
    }
    if form.tau != 0.0 {
        a_rows.push(row);
        a_cols.push(var_map.tau_col());
        a_vals.push(form.tau);
    }
    -form.constant
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svec_layout() {
        assert_eq!(svec_len(3), 6);
        assert_eq!(svec_index(0, 0), 0);
        assert_eq!(svec_index(0, 1), 1);
        assert_eq!(svec_index(1, 1), 2);
        assert_eq!(svec_index(2, 0), 3);
        assert_eq!(svec_index(2, 2), 5);
    }

    #[test]
    fn test_smat_inverts_scaling() {
        let v = [1.0, SQRT_2 * 0.5, 2.0];
        let m = smat(&v, 2);
        assert!((m[(0, 1)] - 0.5).abs() < 1e-12);
        assert!((m[(1, 0)] - 0.5).abs() < 1e-12);
        assert_eq!(m[(1, 1)], 2.0);
    }

    #[test]
    fn test_cone_dims() {
        let dims = ConeDims {
            zero: 2,
            nonneg: 3,
            psd: 3,
        };
        assert_eq!(dims.total(), 11);
    }

    #[test]
    fn test_variable_map() {
        let map = VariableMap { dim: 2, scalars: 3 };
        assert_eq!(map.scalar_col(0), 3);
        assert_eq!(map.tau_col(), 6);
        assert_eq!(map.total_vars(), 7);
    }

    #[test]
    fn test_reduction_objective_and_floor_row() {
        use crate::compile::{CompiledConstraint, GramIndex};
        use crate::constraints::Provenance;

        let form = LinearForm {
            constant: -1.0,
            ..Default::default()
        };
        let compiled = CompiledPep {
            index: GramIndex::default(),
            constraints: vec![CompiledConstraint {
                form,
                kind: ConstraintKind::Inequality,
                provenance: Provenance::InitialCondition,
                name: "initial".to_string(),
            }],
            metrics: Vec::new(),
            functions: Vec::new(),
        };
        let weights = DMatrix::<f64>::zeros(0, 0);
        let stuffed = stuff_reduction(&compiled, &weights, 0.5);
        assert_eq!(stuffed.cone_dims.nonneg, 2);
        assert_eq!(stuffed.row_map, vec![0]);
        assert_eq!(stuffed.b[1], -0.5);
        assert_eq!(stuffed.q[stuffed.var_map.tau_col()], 0.0);

        let worst = stuff_problem(&compiled);
        assert_eq!(worst.cone_dims.nonneg, 1);
        assert_eq!(worst.q[worst.var_map.tau_col()], -1.0);
    }

    #[test]
    fn test_off_diagonal_scaling() {
        let mut form = LinearForm::default();
        form.gram.insert((0, 1), 2.0);
        form.constant = 3.0;
        let map = VariableMap { dim: 2, scalars: 0 };
        let (mut r, mut c, mut v) = (Vec::new(), Vec::new(), Vec::new());
        let b = stuff_linear_form(&form, &map, 0, &mut r, &mut c, &mut v);
        assert_eq!(b, -3.0);
        assert_eq!(c, vec![1]);
        assert!((v[0] - SQRT_2).abs() < 1e-12);
    }
}
