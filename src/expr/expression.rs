//! Symbolic scalar expressions.
//!
//! An `Expression` is kept in linear/bilinear normal form:
//!
//! ```text
//! constant + Σ c_k · scalar_k + Σ c_ab · ⟨a, b⟩
//! ```
//!
//! where `scalar_k` are scalar atoms (function values and other free scalars)
//! and `⟨a, b⟩` ranges over unordered pairs of point atoms, stored with `a ≤ b`.

use std::collections::BTreeMap;

use super::atom::Atom;
use super::point::PRUNE_TOL;

/// A scalar in linear/bilinear normal form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    constant: f64,
    linear: BTreeMap<Atom, f64>,
    bilinear: BTreeMap<(Atom, Atom), f64>,
}

impl Expression {
    /// The zero scalar.
    pub fn zero() -> Self {
        Expression::default()
    }

    /// A constant scalar.
    pub fn constant(value: f64) -> Self {
        Expression {
            constant: value,
            ..Default::default()
        }
    }

    pub(crate) fn from_atom(atom: Atom) -> Self {
        let mut linear = BTreeMap::new();
        linear.insert(atom, 1.0);
        Expression {
            constant: 0.0,
            linear,
            bilinear: BTreeMap::new(),
        }
    }

    pub(crate) fn from_bilinear(mut bilinear: BTreeMap<(Atom, Atom), f64>) -> Self {
        bilinear.retain(|_, c| c.abs() > PRUNE_TOL);
        Expression {
            constant: 0.0,
            linear: BTreeMap::new(),
            bilinear,
        }
    }

    /// Constant term.
    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Check if the expression has no atom-dependent part.
    pub fn is_constant(&self) -> bool {
        self.linear.is_empty() && self.bilinear.is_empty()
    }

    /// Iterate over `(scalar atom, coefficient)` pairs.
    pub fn linear_terms(&self) -> impl Iterator<Item = (Atom, f64)> + '_ {
        self.linear.iter().map(|(a, c)| (*a, *c))
    }

    /// Iterate over `(point atom a, point atom b, coefficient)` with `a ≤ b`.
    pub fn bilinear_terms(&self) -> impl Iterator<Item = (Atom, Atom, f64)> + '_ {
        self.bilinear.iter().map(|((a, b), c)| (*a, *b, *c))
    }

    /// Scalar atoms referenced by the linear part.
    pub fn scalar_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.linear.keys().copied()
    }

    /// Point atoms referenced by the bilinear part (may repeat).
    pub fn point_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.bilinear.keys().flat_map(|(a, b)| [*a, *b])
    }

    /// Linear combination `a·self + b·other`.
    pub fn combine(&self, a: f64, other: &Expression, b: f64) -> Expression {
        let mut linear: BTreeMap<Atom, f64> =
            self.linear.iter().map(|(k, v)| (*k, a * v)).collect();
        for (atom, c) in &other.linear {
            *linear.entry(*atom).or_insert(0.0) += b * c;
        }
        linear.retain(|_, c| c.abs() > PRUNE_TOL);

        let mut bilinear: BTreeMap<(Atom, Atom), f64> =
            self.bilinear.iter().map(|(k, v)| (*k, a * v)).collect();
        for (key, c) in &other.bilinear {
            *bilinear.entry(*key).or_insert(0.0) += b * c;
        }
        bilinear.retain(|_, c| c.abs() > PRUNE_TOL);

        Expression {
            constant: a * self.constant + b * other.constant,
            linear,
            bilinear,
        }
    }

    /// Scalar addition.
    pub fn add(&self, other: &Expression) -> Expression {
        self.combine(1.0, other, 1.0)
    }

    /// Scalar subtraction.
    pub fn sub(&self, other: &Expression) -> Expression {
        self.combine(1.0, other, -1.0)
    }

    /// Negation.
    pub fn neg(&self) -> Expression {
        self.scale(-1.0)
    }

    /// Multiplication by a scalar.
    pub fn scale(&self, scalar: f64) -> Expression {
        self.combine(scalar, &Expression::zero(), 0.0)
    }

    /// Add a constant.
    pub fn add_constant(&self, value: f64) -> Expression {
        let mut out = self.clone();
        out.constant += value;
        out
    }

    /// Equality of all coefficients up to `tol`.
    pub fn approx_eq(&self, other: &Expression, tol: f64) -> bool {
        let diff = self.sub(other);
        diff.constant.abs() <= tol
            && diff.linear.values().all(|c| c.abs() <= tol)
            && diff.bilinear.values().all(|c| c.abs() <= tol)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::constant(value)
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Expression::constant(value as f64)
    }
}

impl From<&Expression> for Expression {
    fn from(expr: &Expression) -> Self {
        expr.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::atom::Context;

    #[test]
    fn test_constant() {
        let c = Expression::constant(3.0);
        assert!(c.is_constant());
        assert_eq!(c.constant_term(), 3.0);
        assert_eq!(Expression::from(2).constant_term(), 2.0);
    }

    #[test]
    fn test_linear_part() {
        let ctx = Context::new();
        let f0 = ctx.new_scalar().unwrap();
        let f1 = ctx.new_scalar().unwrap();
        let e = f0.sub(&f1).scale(2.0).add_constant(1.0);
        let terms: Vec<_> = e.linear_terms().collect();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].1, 2.0);
        assert_eq!(terms[1].1, -2.0);
        assert_eq!(e.constant_term(), 1.0);
        assert!(f0.sub(&f0).is_constant());
    }

    #[test]
    fn test_mixed_parts_stay_separate() {
        let ctx = Context::new();
        let x = ctx.new_point().unwrap();
        let f = ctx.new_scalar().unwrap();
        let e = f.add(&x.norm_squared());
        assert_eq!(e.scalar_atoms().count(), 1);
        assert_eq!(e.point_atoms().count(), 2);
        assert!(e.neg().neg().approx_eq(&e, 0.0));
    }
}
