//! The shared contract every function/operator class implements.

use std::fmt;

use crate::constraints::Constraint;
use crate::error::{PepError, Result};
use crate::expr::{Expression, Point};

/// One interpolation sample recorded by an oracle call.
#[derive(Debug, Clone)]
pub struct Triple {
    /// Location `x`.
    pub point: Point,
    /// (Sub)gradient or operator image at `x`.
    pub gradient: Point,
    /// Function value at `x` (zero for operators).
    pub value: Expression,
    /// True for the designated minimizer/zero registered by `stationary_point`.
    pub stationary: bool,
}

impl Triple {
    /// Create a non-stationary triple.
    pub fn new(point: Point, gradient: Point, value: Expression) -> Self {
        Triple {
            point,
            gradient,
            value,
            stationary: false,
        }
    }
}

/// A structural class of functions or operators.
///
/// A class only has to say which constraints make a finite set of triples
/// interpolable by a member of the class. Those constraints must be the exact
/// interpolation conditions of the class: a weaker set over-estimates the
/// worst case and a stronger one under-estimates it.
pub trait FunctionClass: fmt::Debug {
    /// Short identifier used in constraint names and reports.
    fn name(&self) -> &'static str;

    /// Whether repeated oracle calls at the same point share one gradient.
    fn reuses_gradient(&self) -> bool {
        false
    }

    /// Operators record images but no function values.
    fn is_operator(&self) -> bool {
        false
    }

    /// Whether finalization needs a triple flagged as stationary.
    fn requires_stationary_point(&self) -> bool {
        false
    }

    /// Emit the class's discretized defining constraints over `triples`.
    ///
    /// Must only combine the given points and expressions; no new atom may be
    /// introduced here.
    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint>;
}

/// All pairs `(i, j)` with `i != j`.
pub(crate) fn ordered_pairs(
    triples: &[Triple],
) -> impl Iterator<Item = (usize, &Triple, usize, &Triple)> + '_ {
    triples.iter().enumerate().flat_map(move |(i, ti)| {
        triples
            .iter()
            .enumerate()
            .filter(move |(j, _)| *j != i)
            .map(move |(j, tj)| (i, ti, j, tj))
    })
}

/// All pairs `(i, j)` with `i < j`.
pub(crate) fn unordered_pairs(
    triples: &[Triple],
) -> impl Iterator<Item = (usize, &Triple, usize, &Triple)> + '_ {
    triples.iter().enumerate().flat_map(move |(i, ti)| {
        triples
            .iter()
            .enumerate()
            .skip(i + 1)
            .map(move |(j, tj)| (i, ti, j, tj))
    })
}

/// Index of the first stationary triple.
pub(crate) fn stationary_index(triples: &[Triple]) -> Option<usize> {
    triples.iter().position(|t| t.stationary)
}

/// `f_j + ⟨g_j, x_i − x_j⟩`: the linearization of triple `j` evaluated at `x_i`.
pub(crate) fn linearization(ti: &Triple, tj: &Triple) -> Expression {
    tj.value.add(&tj.gradient.inner(&ti.point.sub(&tj.point)))
}

pub(crate) fn pair_name(class: &str, i: usize, j: usize) -> String {
    format!("{}({},{})", class, i, j)
}

pub(crate) fn require_positive(what: &str, value: f64) -> Result<()> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(PepError::InvalidArgument(format!(
            "{} must be positive and finite, got {}",
            what, value
        )));
    }
    Ok(())
}

pub(crate) fn require_nonneg(what: &str, value: f64) -> Result<()> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(PepError::InvalidArgument(format!(
            "{} must be non-negative and finite, got {}",
            what, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(n: usize) -> Vec<Triple> {
        (0..n)
            .map(|_| Triple::new(Point::zero(), Point::zero(), Expression::zero()))
            .collect()
    }

    #[test]
    fn test_pair_counts() {
        let t = dummy(4);
        assert_eq!(ordered_pairs(&t).count(), 12);
        assert_eq!(unordered_pairs(&t).count(), 6);
        assert_eq!(ordered_pairs(&dummy(1)).count(), 0);
    }

    #[test]
    fn test_unordered_pairs_are_increasing() {
        let t = dummy(3);
        let pairs: Vec<_> = unordered_pairs(&t).map(|(i, _, j, _)| (i, j)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_parameter_checks() {
        assert!(require_positive("L", 1.0).is_ok());
        assert!(require_positive("L", 0.0).is_err());
        assert!(require_positive("L", f64::NAN).is_err());
        assert!(require_nonneg("mu", 0.0).is_ok());
        assert!(require_nonneg("mu", -1.0).is_err());
    }
}
