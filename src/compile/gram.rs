//! Gram layout and linear forms.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::error::{PepError, Result};
use crate::expr::{Atom, Expression};

/// Row/column layout of the Gram matrix and of the scalar vector.
///
/// Atoms are sorted by allocation index, so the layout only depends on which
/// atoms are reachable, never on the order they were encountered in.
#[derive(Debug, Clone, Default)]
pub struct GramIndex {
    points: Vec<Atom>,
    point_pos: BTreeMap<Atom, usize>,
    scalars: Vec<Atom>,
    scalar_pos: BTreeMap<Atom, usize>,
}

impl GramIndex {
    /// Collect every atom referenced by `exprs`.
    pub fn collect<'a>(exprs: impl IntoIterator<Item = &'a Expression>) -> Self {
        let mut points = std::collections::BTreeSet::new();
        let mut scalars = std::collections::BTreeSet::new();
        for e in exprs {
            points.extend(e.point_atoms());
            scalars.extend(e.scalar_atoms());
        }
        let points: Vec<Atom> = points.into_iter().collect();
        let scalars: Vec<Atom> = scalars.into_iter().collect();
        let point_pos = points.iter().enumerate().map(|(i, a)| (*a, i)).collect();
        let scalar_pos = scalars.iter().enumerate().map(|(i, a)| (*a, i)).collect();
        GramIndex {
            points,
            point_pos,
            scalars,
            scalar_pos,
        }
    }

    /// Dimension of the Gram matrix.
    pub fn dim(&self) -> usize {
        self.points.len()
    }

    /// Length of the scalar vector.
    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }

    pub fn point_index(&self, atom: Atom) -> Option<usize> {
        self.point_pos.get(&atom).copied()
    }

    pub fn scalar_index(&self, atom: Atom) -> Option<usize> {
        self.scalar_pos.get(&atom).copied()
    }

    pub fn point_atoms(&self) -> &[Atom] {
        &self.points
    }

    pub fn scalar_atoms(&self) -> &[Atom] {
        &self.scalars
    }
}

/// `Σ c_ij G_ij + Σ d_k F_k + t τ + constant`, with `i ≤ j`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearForm {
    pub gram: BTreeMap<(usize, usize), f64>,
    pub scalars: BTreeMap<usize, f64>,
    pub tau: f64,
    pub constant: f64,
}

impl LinearForm {
    /// Rewrite `expr` over the entries laid out by `index`.
    pub fn from_expression(expr: &Expression, index: &GramIndex) -> Result<Self> {
        let mut form = LinearForm {
            constant: expr.constant_term(),
            ..Default::default()
        };
        for (atom, c) in expr.linear_terms() {
            let k = index.scalar_index(atom).ok_or_else(|| missing(atom))?;
            *form.scalars.entry(k).or_insert(0.0) += c;
        }
        for (a, b, c) in expr.bilinear_terms() {
            let i = index.point_index(a).ok_or_else(|| missing(a))?;
            let j = index.point_index(b).ok_or_else(|| missing(b))?;
            *form.gram.entry((i.min(j), i.max(j))).or_insert(0.0) += c;
        }
        Ok(form)
    }

    /// `τ − self`.
    pub(crate) fn epigraph_of(metric: &LinearForm) -> Self {
        LinearForm {
            gram: metric.gram.iter().map(|(k, v)| (*k, -v)).collect(),
            scalars: metric.scalars.iter().map(|(k, v)| (*k, -v)).collect(),
            tau: 1.0 - metric.tau,
            constant: -metric.constant,
        }
    }

    /// Value at a symmetric `gram`, scalar vector `scalars` and `tau`.
    pub fn evaluate(&self, gram: &DMatrix<f64>, scalars: &[f64], tau: f64) -> f64 {
        let g: f64 = self.gram.iter().map(|(&(i, j), c)| c * gram[(i, j)]).sum();
        let f: f64 = self.scalars.iter().map(|(&k, d)| d * scalars[k]).sum();
        g + f + self.tau * tau + self.constant
    }

    /// Symmetric matrix `C` with `⟨C, G⟩ = Σ c_ij G_ij`.
    pub fn gram_matrix(&self, dim: usize) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(dim, dim);
        for (&(i, j), &c) in &self.gram {
            if i == j {
                m[(i, i)] += c;
            } else {
                m[(i, j)] += 0.5 * c;
                m[(j, i)] += 0.5 * c;
            }
        }
        m
    }
}

fn missing(atom: Atom) -> PepError {
    PepError::InvalidReference(format!(
        "atom {} of problem {} is not part of the compiled layout",
        atom.index(),
        atom.problem().raw()
    ))
}
