//! Convex M-Lipschitz functions (bounded subgradients).
//!
//! Interpolation: convexity on every ordered pair plus `‖g_i‖² ≤ M²` on every
//! triple (Taylor, Hendrickx, Glineur 2017, SIAM J. Optim. 27(3), Theorem 3.5).

use super::class::{linearization, ordered_pairs, pair_name, require_positive};
use super::{FunctionClass, Triple};
use crate::constraints::Constraint;
use crate::error::Result;

/// Convex functions whose subgradients are bounded in norm by `M`.
#[derive(Debug, Clone)]
pub struct ConvexLipschitzFunction {
    m: f64,
}

impl ConvexLipschitzFunction {
    /// Fails unless `m > 0`.
    pub fn new(m: f64) -> Result<Self> {
        require_positive("Lipschitz constant M", m)?;
        Ok(ConvexLipschitzFunction { m })
    }

    /// Bound on subgradient norms.
    pub fn m(&self) -> f64 {
        self.m
    }
}

impl FunctionClass for ConvexLipschitzFunction {
    fn name(&self) -> &'static str {
        "convex_lipschitz"
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        let bounds = triples.iter().enumerate().map(|(i, t)| {
            Constraint::leq(t.gradient.norm_squared(), self.m * self.m)
                .named(format!("{}_bound({})", self.name(), i))
        });
        let pairs = ordered_pairs(triples).map(|(i, ti, j, tj)| {
            Constraint::geq(ti.value.clone(), linearization(ti, tj))
                .named(pair_name(self.name(), i, j))
        });
        bounds.chain(pairs).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Context;

    #[test]
    fn test_count_is_k_squared() {
        let ctx = Context::new();
        let t: Vec<_> = (0..3)
            .map(|_| {
                Triple::new(
                    ctx.new_point().unwrap(),
                    ctx.new_point().unwrap(),
                    ctx.new_scalar().unwrap(),
                )
            })
            .collect();
        let c = ConvexLipschitzFunction::new(2.0)
            .unwrap()
            .interpolation_constraints(&t);
        assert_eq!(c.len(), 9);
        assert_eq!(c[0].expression().constant_term(), -4.0);
    }
}
