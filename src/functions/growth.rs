//! Classes defined relative to a minimizer.
//!
//! Both classes need the triple registered by `Function::stationary_point`;
//! compiling a problem that uses them without one is an ill-posed problem.

use super::class::{
    linearization, ordered_pairs, pair_name, require_positive, stationary_index,
};
use super::{FunctionClass, Triple};
use crate::constraints::Constraint;
use crate::error::{PepError, Result};

/// Convex functions with a quadratic upper bound around their minimizer,
/// `f(x) − f⋆ ≤ L/2 ‖x − x⋆‖²`.
///
/// Interpolation (Goujaud, Taylor, Dieuleveut 2022, "Optimal first-order
/// methods for convex functions with a quadratic upper bound", Theorem 2.6):
/// for pairs `(⋆, j)`, `f⋆ ≥ f_j + ⟨g_j, x⋆ − x_j⟩ + 1/(2L) ‖g_j‖²`, and plain
/// convexity for every other ordered pair.
#[derive(Debug, Clone)]
pub struct ConvexQgFunction {
    l: f64,
}

impl ConvexQgFunction {
    /// Fails unless `l > 0`.
    pub fn new(l: f64) -> Result<Self> {
        require_positive("quadratic growth parameter L", l)?;
        Ok(ConvexQgFunction { l })
    }

    /// Quadratic growth constant.
    pub fn l(&self) -> f64 {
        self.l
    }
}

impl FunctionClass for ConvexQgFunction {
    fn name(&self) -> &'static str {
        "convex_qg"
    }

    fn requires_stationary_point(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        let star = stationary_index(triples);
        ordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let mut rhs = linearization(ti, tj);
                if Some(i) == star {
                    rhs = rhs.add(&tj.gradient.norm_squared().scale(1.0 / (2.0 * self.l)));
                }
                Constraint::geq(ti.value.clone(), rhs).named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// Functions satisfying a lower restricted secant inequality and an upper
/// error bound around their minimizer:
///
/// ```text
/// ⟨g_i, x_i − x⋆⟩ ≥ μ ‖x_i − x⋆‖²      ‖g_i‖² ≤ L² ‖x_i − x⋆‖²
/// ```
///
/// Interpolation follows Guille-Escuret, Goujaud, Ibrahim, Mitliagkas (2022),
/// "Gradient descent is optimal under lower restricted secant inequality and
/// upper error bound". Two constraints per non-stationary triple.
#[derive(Debug, Clone)]
pub struct RsiEbFunction {
    mu: f64,
    l: f64,
}

impl RsiEbFunction {
    /// Fails unless `0 < mu ≤ l`.
    pub fn new(mu: f64, l: f64) -> Result<Self> {
        require_positive("restricted secant parameter mu", mu)?;
        require_positive("error bound parameter L", l)?;
        if mu > l {
            return Err(PepError::InvalidArgument(format!(
                "mu ({}) must not exceed L ({})",
                mu, l
            )));
        }
        Ok(RsiEbFunction { mu, l })
    }

    /// Restricted secant parameter.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Error bound constant.
    pub fn l(&self) -> f64 {
        self.l
    }
}

impl FunctionClass for RsiEbFunction {
    fn name(&self) -> &'static str {
        "rsi_eb"
    }

    fn reuses_gradient(&self) -> bool {
        true
    }

    fn requires_stationary_point(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        let Some(star) = stationary_index(triples) else {
            return Vec::new();
        };
        let xs = &triples[star].point;
        let mut out = Vec::new();
        for (i, t) in triples.iter().enumerate() {
            if i == star {
                continue;
            }
            let dx = t.point.sub(xs);
            out.push(
                Constraint::geq(t.gradient.inner(&dx), dx.norm_squared().scale(self.mu))
                    .named(format!("rsi({})", i)),
            );
            out.push(
                Constraint::leq(t.gradient.norm_squared(), dx.norm_squared().scale(self.l * self.l))
                    .named(format!("eb({})", i)),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Context, Expression, Point};

    fn with_star(k: usize) -> Vec<Triple> {
        let ctx = Context::new();
        let mut t: Vec<_> = (0..k)
            .map(|_| {
                Triple::new(
                    ctx.new_point().unwrap(),
                    ctx.new_point().unwrap(),
                    ctx.new_scalar().unwrap(),
                )
            })
            .collect();
        t.push(Triple {
            point: ctx.new_point().unwrap(),
            gradient: Point::zero(),
            value: ctx.new_scalar().unwrap(),
            stationary: true,
        });
        t
    }

    #[test]
    fn test_qg_counts_and_star_term() {
        let t = with_star(2);
        let c = ConvexQgFunction::new(1.0)
            .unwrap()
            .interpolation_constraints(&t);
        assert_eq!(c.len(), 6);
        // pair (star, 0) carries the extra ‖g_0‖² term: 3 bilinear terms from
        // <g_0, x* - x_0> (2 terms) plus ‖g_0‖²
        let star_row = c.iter().find(|c| c.name() == Some("convex_qg(2,0)")).unwrap();
        assert_eq!(star_row.expression().bilinear_terms().count(), 3);
    }

    #[test]
    fn test_rsi_eb_counts() {
        let t = with_star(3);
        let c = RsiEbFunction::new(0.5, 1.0)
            .unwrap()
            .interpolation_constraints(&t);
        assert_eq!(c.len(), 6);
        assert!(RsiEbFunction::new(2.0, 1.0).is_err());
    }

    #[test]
    fn test_rsi_eb_without_star_is_empty() {
        let ctx = Context::new();
        let t = vec![Triple::new(
            ctx.new_point().unwrap(),
            ctx.new_point().unwrap(),
            Expression::zero(),
        )];
        let class = RsiEbFunction::new(0.5, 1.0).unwrap();
        assert!(class.requires_stationary_point());
        assert!(class.interpolation_constraints(&t).is_empty());
    }
}
