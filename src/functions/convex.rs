//! Convex, strongly convex and smooth function classes.
//!
//! Interpolation conditions follow A. Taylor, J. Hendrickx, F. Glineur (2017),
//! "Smooth strongly convex interpolation and exact worst-case performance of
//! first-order methods", Math. Programming 161(1), Theorem 4, and for the
//! non-convex smooth class the same authors' SIAM J. Optim. 27(3) paper,
//! Theorem 3.10. All conditions are asymmetric, so one constraint is emitted per
//! ordered pair of distinct triples.

use super::class::{linearization, ordered_pairs, pair_name, require_nonneg, require_positive};
use super::{FunctionClass, Triple};
use crate::constraints::Constraint;
use crate::error::{PepError, Result};

/// Closed proper convex functions.
///
/// `f_i ≥ f_j + ⟨g_j, x_i − x_j⟩`.
#[derive(Debug, Clone, Default)]
pub struct ConvexFunction;

impl ConvexFunction {
    /// The class of all closed proper convex functions.
    pub fn new() -> Self {
        ConvexFunction
    }
}

impl FunctionClass for ConvexFunction {
    fn name(&self) -> &'static str {
        "convex"
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        ordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                Constraint::geq(ti.value.clone(), linearization(ti, tj))
                    .named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// μ-strongly convex functions.
///
/// `f_i ≥ f_j + ⟨g_j, x_i − x_j⟩ + μ/2 ‖x_i − x_j‖²`.
#[derive(Debug, Clone)]
pub struct StronglyConvexFunction {
    mu: f64,
}

impl StronglyConvexFunction {
    /// Fails unless `mu > 0`.
    pub fn new(mu: f64) -> Result<Self> {
        require_positive("strong convexity parameter mu", mu)?;
        Ok(StronglyConvexFunction { mu })
    }

    /// Strong convexity parameter.
    pub fn mu(&self) -> f64 {
        self.mu
    }
}

impl FunctionClass for StronglyConvexFunction {
    fn name(&self) -> &'static str {
        "strongly_convex"
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        ordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let rhs = linearization(ti, tj)
                    .add(&ti.point.sub(&tj.point).norm_squared().scale(self.mu / 2.0));
                Constraint::geq(ti.value.clone(), rhs).named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// Convex functions with L-Lipschitz gradient.
///
/// `f_i ≥ f_j + ⟨g_j, x_i − x_j⟩ + 1/(2L) ‖g_i − g_j‖²`.
#[derive(Debug, Clone)]
pub struct SmoothConvexFunction {
    l: f64,
}

impl SmoothConvexFunction {
    /// Fails unless `l > 0`.
    pub fn new(l: f64) -> Result<Self> {
        require_positive("smoothness parameter L", l)?;
        Ok(SmoothConvexFunction { l })
    }

    /// Smoothness constant.
    pub fn l(&self) -> f64 {
        self.l
    }
}

impl FunctionClass for SmoothConvexFunction {
    fn name(&self) -> &'static str {
        "smooth_convex"
    }

    fn reuses_gradient(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        ordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let rhs = linearization(ti, tj).add(
                    &ti.gradient
                        .sub(&tj.gradient)
                        .norm_squared()
                        .scale(1.0 / (2.0 * self.l)),
                );
                Constraint::geq(ti.value.clone(), rhs).named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// μ-strongly convex functions with L-Lipschitz gradient, `0 ≤ μ < L`.
///
/// ```text
/// f_i ≥ f_j + ⟨g_j, x_i − x_j⟩ + 1/(2L) ‖g_i − g_j‖²
///           + μ/(2(1 − μ/L)) ‖x_i − x_j − (g_i − g_j)/L‖²
/// ```
#[derive(Debug, Clone)]
pub struct SmoothStronglyConvexFunction {
    mu: f64,
    l: f64,
}

impl SmoothStronglyConvexFunction {
    /// Fails unless `0 ≤ mu < l`.
    pub fn new(mu: f64, l: f64) -> Result<Self> {
        require_nonneg("strong convexity parameter mu", mu)?;
        require_positive("smoothness parameter L", l)?;
        if mu >= l {
            return Err(PepError::InvalidArgument(format!(
                "mu ({}) must be smaller than L ({})",
                mu, l
            )));
        }
        Ok(SmoothStronglyConvexFunction { mu, l })
    }

    /// Strong convexity parameter.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Smoothness constant.
    pub fn l(&self) -> f64 {
        self.l
    }
}

impl FunctionClass for SmoothStronglyConvexFunction {
    fn name(&self) -> &'static str {
        "smooth_strongly_convex"
    }

    fn reuses_gradient(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        let weight = self.mu / (2.0 * (1.0 - self.mu / self.l));
        ordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let dg = ti.gradient.sub(&tj.gradient);
                let dx = ti.point.sub(&tj.point);
                let rhs = linearization(ti, tj)
                    .add(&dg.norm_squared().scale(1.0 / (2.0 * self.l)))
                    .add(&dx.sub(&dg.scale(1.0 / self.l)).norm_squared().scale(weight));
                Constraint::geq(ti.value.clone(), rhs).named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// L-smooth, possibly non-convex functions.
///
/// ```text
/// f_i − f_j ≥ −L/4 ‖x_i − x_j‖² + ½⟨g_i + g_j, x_i − x_j⟩ + 1/(4L) ‖g_i − g_j‖²
/// ```
#[derive(Debug, Clone)]
pub struct SmoothFunction {
    l: f64,
}

impl SmoothFunction {
    /// Fails unless `l > 0`.
    pub fn new(l: f64) -> Result<Self> {
        require_positive("smoothness parameter L", l)?;
        Ok(SmoothFunction { l })
    }

    /// Smoothness constant.
    pub fn l(&self) -> f64 {
        self.l
    }
}

impl FunctionClass for SmoothFunction {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn reuses_gradient(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        ordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let dx = ti.point.sub(&tj.point);
                let dg = ti.gradient.sub(&tj.gradient);
                let rhs = dx
                    .norm_squared()
                    .scale(-self.l / 4.0)
                    .add(&ti.gradient.add(&tj.gradient).inner(&dx).scale(0.5))
                    .add(&dg.norm_squared().scale(1.0 / (4.0 * self.l)));
                Constraint::geq(ti.value.sub(&tj.value), rhs).named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintKind;
    use crate::expr::Context;

    fn triples(ctx: &Context, k: usize) -> Vec<Triple> {
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
    fn test_parameter_validation() {
        assert!(SmoothConvexFunction::new(0.0).is_err());
        assert!(StronglyConvexFunction::new(-1.0).is_err());
        assert!(SmoothStronglyConvexFunction::new(1.0, 1.0).is_err());
        assert!(SmoothStronglyConvexFunction::new(0.0, 1.0).is_ok());
        assert!(SmoothFunction::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_ordered_counts() {
        let ctx = Context::new();
        let t = triples(&ctx, 3);
        assert_eq!(ConvexFunction::new().interpolation_constraints(&t).len(), 6);
        let c = SmoothConvexFunction::new(1.0)
            .unwrap()
            .interpolation_constraints(&t);
        assert_eq!(c.len(), 6);
        assert!(c.iter().all(|c| c.kind() == ConstraintKind::Inequality));
        assert_eq!(c[0].name(), Some("smooth_convex(0,1)"));
    }

    #[test]
    fn test_mu_zero_matches_smooth_convex() {
        let ctx = Context::new();
        let t = triples(&ctx, 2);
        let a = SmoothConvexFunction::new(2.0)
            .unwrap()
            .interpolation_constraints(&t);
        let b = SmoothStronglyConvexFunction::new(0.0, 2.0)
            .unwrap()
            .interpolation_constraints(&t);
        for (ca, cb) in a.iter().zip(&b) {
            assert!(ca.expression().approx_eq(cb.expression(), 1e-12));
        }
    }

    #[test]
    fn test_convex_constraint_shape() {
        let ctx = Context::new();
        let t = triples(&ctx, 2);
        let c = &ConvexFunction::new().interpolation_constraints(&t)[0];
        // f_1 - f_0 + <g_1, x_0 - x_1> <= 0
        let lin: Vec<_> = c.expression().linear_terms().collect();
        assert_eq!(lin.len(), 2);
        assert_eq!(lin[0].1, -1.0);
        assert_eq!(lin[1].1, 1.0);
        assert_eq!(c.expression().bilinear_terms().count(), 2);
    }
}
