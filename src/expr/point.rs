//! Symbolic points: finite linear combinations of point atoms.

use std::collections::BTreeMap;

use super::atom::{Atom, ProblemId};
use super::expression::Expression;

/// Coefficients below this magnitude are dropped from normal forms.
pub(crate) const PRUNE_TOL: f64 = 1e-14;

/// A vector of the implicit Hilbert space, stored as `Σ c_i · atom_i`.
///
/// Points never hold numbers of their own: arithmetic only recombines the
/// coefficients of existing atoms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    coeffs: BTreeMap<Atom, f64>,
}

impl Point {
    /// The zero vector.
    pub fn zero() -> Self {
        Point::default()
    }

    pub(crate) fn from_atom(atom: Atom) -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(atom, 1.0);
        Point { coeffs }
    }

    /// Check if this is the zero vector.
    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Iterate over `(atom, coefficient)` pairs in atom order.
    pub fn terms(&self) -> impl Iterator<Item = (Atom, f64)> + '_ {
        self.coeffs.iter().map(|(a, c)| (*a, *c))
    }

    /// Iterate over the atoms this point depends on.
    pub fn atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.coeffs.keys().copied()
    }

    /// Coefficient of `atom` (zero if absent).
    pub fn coefficient(&self, atom: Atom) -> f64 {
        self.coeffs.get(&atom).copied().unwrap_or(0.0)
    }

    /// Problem of the first atom, if any.
    pub fn problem(&self) -> Option<ProblemId> {
        self.coeffs.keys().next().map(|a| a.problem())
    }

    /// Linear combination `a·self + b·other`.
    pub fn combine(&self, a: f64, other: &Point, b: f64) -> Point {
        let mut coeffs: BTreeMap<Atom, f64> =
            self.coeffs.iter().map(|(k, v)| (*k, a * v)).collect();
        for (atom, c) in &other.coeffs {
            *coeffs.entry(*atom).or_insert(0.0) += b * c;
        }
        coeffs.retain(|_, c| c.abs() > PRUNE_TOL);
        Point { coeffs }
    }

    /// Vector addition.
    pub fn add(&self, other: &Point) -> Point {
        self.combine(1.0, other, 1.0)
    }

    /// Vector subtraction.
    pub fn sub(&self, other: &Point) -> Point {
        self.combine(1.0, other, -1.0)
    }

    /// Negation.
    pub fn neg(&self) -> Point {
        self.scale(-1.0)
    }

    /// Multiplication by a scalar.
    pub fn scale(&self, scalar: f64) -> Point {
        let mut coeffs: BTreeMap<Atom, f64> = self
            .coeffs
            .iter()
            .map(|(k, v)| (*k, scalar * v))
            .collect();
        coeffs.retain(|_, c| c.abs() > PRUNE_TOL);
        Point { coeffs }
    }

    /// Inner product `⟨self, other⟩`.
    ///
    /// Expands bilinearly over atom pairs; the pair `(a, b)` and `(b, a)` land
    /// on the same key.
    pub fn inner(&self, other: &Point) -> Expression {
        let mut bilinear: BTreeMap<(Atom, Atom), f64> = BTreeMap::new();
        for (&a, &ca) in &self.coeffs {
            for (&b, &cb) in &other.coeffs {
                let key = if a <= b { (a, b) } else { (b, a) };
                *bilinear.entry(key).or_insert(0.0) += ca * cb;
            }
        }
        Expression::from_bilinear(bilinear)
    }

    /// Squared norm `‖self‖²`.
    pub fn norm_squared(&self) -> Expression {
        self.inner(self)
    }

    /// Equality of coefficients up to `tol`.
    pub fn approx_eq(&self, other: &Point, tol: f64) -> bool {
        self.sub(other).coeffs.values().all(|c| c.abs() <= tol)
    }
}

/// Inner product of two points.
pub fn inner_product(a: &Point, b: &Point) -> Expression {
    a.inner(b)
}
