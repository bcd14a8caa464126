//! Indicator functions of closed convex sets.
//!
//! Values are pinned to zero by equalities (points outside the set are
//! excluded rather than given an infinite value), subgradients are normal
//! vectors, and an optional diameter bounds pairwise distances (Taylor,
//! Hendrickx, Glineur 2017, SIAM J. Optim. 27(3), Theorem 3.6).

use super::class::{ordered_pairs, pair_name, require_positive, unordered_pairs};
use super::{FunctionClass, Triple};
use crate::constraints::Constraint;
use crate::error::Result;

/// Indicator of a closed convex set of diameter at most `D` (possibly infinite).
#[derive(Debug, Clone)]
pub struct ConvexIndicatorFunction {
    diameter: f64,
}

impl ConvexIndicatorFunction {
    /// Indicator of an arbitrary closed convex set.
    pub fn new() -> Self {
        ConvexIndicatorFunction {
            diameter: f64::INFINITY,
        }
    }

    /// Indicator of a closed convex set of diameter at most `diameter`.
    pub fn with_diameter(diameter: f64) -> Result<Self> {
        require_positive("diameter D", diameter)?;
        Ok(ConvexIndicatorFunction { diameter })
    }

    /// Diameter bound, infinite when unbounded.
    pub fn diameter(&self) -> f64 {
        self.diameter
    }
}

impl Default for ConvexIndicatorFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for ConvexIndicatorFunction {
    fn name(&self) -> &'static str {
        "convex_indicator"
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        let mut out: Vec<Constraint> = triples
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Constraint::eq(t.value.clone(), 0.0)
                    .named(format!("{}_feasible({})", self.name(), i))
            })
            .collect();

        // g_j is a normal vector at x_j: <g_j, x_i - x_j> <= 0
        out.extend(ordered_pairs(triples).map(|(i, ti, j, tj)| {
            Constraint::leq(tj.gradient.inner(&ti.point.sub(&tj.point)), 0.0)
                .named(pair_name(self.name(), i, j))
        }));

        if self.diameter.is_finite() {
            let d2 = self.diameter * self.diameter;
            out.extend(unordered_pairs(triples).map(|(i, ti, j, tj)| {
                Constraint::leq(ti.point.sub(&tj.point).norm_squared(), d2)
                    .named(format!("{}_diameter({},{})", self.name(), i, j))
            }));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintKind;
    use crate::expr::Context;

    fn triples(k: usize) -> Vec<Triple> {
        let ctx = Context::new();
        (0..k)
            .map(|_| {
                Triple::new(
                    ctx.new_point().unwrap(),
                    ctx.new_point().unwrap(),
                    ctx.new_scalar().unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_unbounded_set_counts() {
        let c = ConvexIndicatorFunction::new().interpolation_constraints(&triples(3));
        assert_eq!(c.len(), 3 + 6);
        assert_eq!(
            c.iter()
                .filter(|c| c.kind() == ConstraintKind::Equality)
                .count(),
            3
        );
    }

    #[test]
    fn test_bounded_set_counts() {
        let c = ConvexIndicatorFunction::with_diameter(1.0)
            .unwrap()
            .interpolation_constraints(&triples(3));
        assert_eq!(c.len(), 3 + 6 + 3);
    }
}
