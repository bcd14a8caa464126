//! Primal witness: a concrete realization of the worst case.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::compile::GramIndex;
use crate::error::{PepError, Result};
use crate::expr::{Atom, Expression, Point, ProblemId};

/// Coordinates `U` with `U Uᵀ ≈ G*`, plus the optimal scalars.
///
/// Atoms that no compiled constraint references are unconstrained; the witness
/// realizes them as zero.
#[derive(Debug, Clone)]
pub struct Witness {
    problem: ProblemId,
    index: GramIndex,
    solver_gram: DMatrix<f64>,
    coordinates: DMatrix<f64>,
    scalars: Vec<f64>,
    tau: f64,
}

impl Witness {
    /// Factor `gram` keeping eigenvalues above `rank_tol · λ_max`.
    pub(crate) fn reconstruct(
        problem: ProblemId,
        index: GramIndex,
        gram: DMatrix<f64>,
        scalars: Vec<f64>,
        tau: f64,
        rank_tol: f64,
    ) -> Self {
        let n = gram.nrows();
        let coordinates = if n == 0 {
            DMatrix::zeros(0, 0)
        } else {
            let eig = SymmetricEigen::new(gram.clone());
            let lambda_max = eig.eigenvalues.max().max(0.0);
            let threshold = rank_tol * lambda_max;
            let kept: Vec<usize> = (0..n)
                .filter(|&k| eig.eigenvalues[k] > threshold && eig.eigenvalues[k] > 0.0)
                .collect();
            let mut u = DMatrix::zeros(n, kept.len());
            for (c, &k) in kept.iter().enumerate() {
                let scale = eig.eigenvalues[k].sqrt();
                u.set_column(c, &(eig.eigenvectors.column(k) * scale));
            }
            u
        };
        Witness {
            problem,
            index,
            solver_gram: gram,
            coordinates,
            scalars,
            tau,
        }
    }

    /// Number of retained directions (dimension of the worst-case instance).
    pub fn rank(&self) -> usize {
        self.coordinates.ncols()
    }

    /// Objective value `τ` at the solver's iterate.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// `G*` as returned by the solver.
    pub fn solver_gram(&self) -> &DMatrix<f64> {
        &self.solver_gram
    }

    /// `U Uᵀ`, the Gram matrix of the realized points.
    pub fn gram(&self) -> DMatrix<f64> {
        &self.coordinates * self.coordinates.transpose()
    }

    /// One row per Gram atom, one column per retained direction.
    pub fn coordinates(&self) -> &DMatrix<f64> {
        &self.coordinates
    }

    /// Optimal scalar vector `F*`.
    pub fn scalars(&self) -> &[f64] {
        &self.scalars
    }

    pub fn index(&self) -> &GramIndex {
        &self.index
    }

    /// Concrete coordinates of a registered point.
    pub fn point(&self, point: &Point) -> Result<DVector<f64>> {
        let mut v = DVector::zeros(self.rank());
        for (atom, c) in point.terms() {
            self.check(atom)?;
            if let Some(i) = self.index.point_index(atom) {
                v += self.coordinates.row(i).transpose() * c;
            }
        }
        Ok(v)
    }

    /// Concrete value of a registered expression.
    pub fn expression(&self, expr: &Expression) -> Result<f64> {
        let mut value = expr.constant_term();
        for (atom, c) in expr.linear_terms() {
            self.check(atom)?;
            if let Some(k) = self.index.scalar_index(atom) {
                value += c * self.scalars[k];
            }
        }
        for (a, b, c) in expr.bilinear_terms() {
            self.check(a)?;
            self.check(b)?;
            if let (Some(i), Some(j)) = (self.index.point_index(a), self.index.point_index(b)) {
                value += c * self.coordinates.row(i).dot(&self.coordinates.row(j));
            }
        }
        Ok(value)
    }

    fn check(&self, atom: Atom) -> Result<()> {
        if atom.problem() != self.problem {
            return Err(PepError::InvalidReference(format!(
                "atom of problem {} evaluated on a witness of problem {}",
                atom.problem().raw(),
                self.problem.raw()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Context;

    #[test]
    fn test_rank_one_factorization() {
        let ctx = Context::new();
        let x = ctx.new_point().unwrap();
        let y = ctx.new_point().unwrap();
        let e = x.inner(&y);
        let index = GramIndex::collect([&e]);
        // G = v vᵀ with v = (1, 2)
        let g = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let w = Witness::reconstruct(ctx.id(), index, g.clone(), vec![], 0.0, 1e-9);
        assert_eq!(w.rank(), 1);
        assert!((w.gram() - g).abs().max() < 1e-10);
        assert!((w.expression(&e).unwrap() - 2.0).abs() < 1e-10);
        let p = w.point(&x.add(&y)).unwrap();
        assert!((p.norm_squared() - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_foreign_atoms_rejected() {
        let ctx = Context::new();
        let other = Context::new();
        let w = Witness::reconstruct(
            ctx.id(),
            GramIndex::default(),
            DMatrix::zeros(0, 0),
            vec![],
            0.0,
            1e-9,
        );
        let z = other.new_point().unwrap();
        assert!(matches!(w.point(&z), Err(PepError::InvalidReference(_))));
    }

    #[test]
    fn test_unreferenced_atoms_are_zero() {
        let ctx = Context::new();
        let x = ctx.new_point().unwrap();
        let f = ctx.new_scalar().unwrap();
        let w = Witness::reconstruct(
            ctx.id(),
            GramIndex::default(),
            DMatrix::zeros(0, 0),
            vec![],
            0.0,
            1e-9,
        );
        assert_eq!(w.point(&x).unwrap().len(), 0);
        assert_eq!(w.expression(&f.add_constant(1.5)).unwrap(), 1.5);
    }
}
