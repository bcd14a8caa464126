//! Operator classes.
//!
//! Operators record images `g_i = A x_i` and no function values. All
//! conditions below are symmetric in `(i, j)`, so one constraint is emitted per
//! unordered pair. Maximal monotone, strongly monotone, cocoercive and
//! Lipschitz interpolation are exact in Hilbert space (Ryu, Taylor, Bergeling,
//! Giselsson 2020, "Operator splitting performance estimation: tight
//! contraction factors and optimal parameter selection", SIAM J. Optim. 30(3),
//! Section 2).

use super::class::{pair_name, require_nonneg, require_positive, unordered_pairs};
use super::{FunctionClass, Triple};
use crate::constraints::Constraint;
use crate::error::{PepError, Result};
use crate::expr::Expression;

fn monotonicity(ti: &Triple, tj: &Triple) -> Expression {
    ti.gradient
        .sub(&tj.gradient)
        .inner(&ti.point.sub(&tj.point))
}

/// Maximal monotone operators: `⟨g_i − g_j, x_i − x_j⟩ ≥ 0`.
#[derive(Debug, Clone, Default)]
pub struct MonotoneOperator;

impl MonotoneOperator {
    /// The class of all maximal monotone operators.
    pub fn new() -> Self {
        MonotoneOperator
    }
}

impl FunctionClass for MonotoneOperator {
    fn name(&self) -> &'static str {
        "monotone"
    }

    fn is_operator(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        unordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                Constraint::geq(monotonicity(ti, tj), 0.0).named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// μ-strongly monotone operators: `⟨g_i − g_j, x_i − x_j⟩ ≥ μ ‖x_i − x_j‖²`.
#[derive(Debug, Clone)]
pub struct StronglyMonotoneOperator {
    mu: f64,
}

impl StronglyMonotoneOperator {
    /// Fails unless `mu > 0`.
    pub fn new(mu: f64) -> Result<Self> {
        require_positive("strong monotonicity parameter mu", mu)?;
        Ok(StronglyMonotoneOperator { mu })
    }

    /// Strong monotonicity parameter.
    pub fn mu(&self) -> f64 {
        self.mu
    }
}

impl FunctionClass for StronglyMonotoneOperator {
    fn name(&self) -> &'static str {
        "strongly_monotone"
    }

    fn is_operator(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        unordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let dx = ti.point.sub(&tj.point);
                Constraint::geq(monotonicity(ti, tj), dx.norm_squared().scale(self.mu))
                    .named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// β-cocoercive operators: `⟨g_i − g_j, x_i − x_j⟩ ≥ β ‖g_i − g_j‖²`.
#[derive(Debug, Clone)]
pub struct CocoerciveOperator {
    beta: f64,
}

impl CocoerciveOperator {
    /// Fails unless `beta > 0`.
    pub fn new(beta: f64) -> Result<Self> {
        require_positive("cocoercivity parameter beta", beta)?;
        Ok(CocoerciveOperator { beta })
    }

    /// Cocoercivity parameter.
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl FunctionClass for CocoerciveOperator {
    fn name(&self) -> &'static str {
        "cocoercive"
    }

    fn reuses_gradient(&self) -> bool {
        true
    }

    fn is_operator(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        unordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let dg = ti.gradient.sub(&tj.gradient);
                Constraint::geq(monotonicity(ti, tj), dg.norm_squared().scale(self.beta))
                    .named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// L-Lipschitz operators: `‖g_i − g_j‖² ≤ L² ‖x_i − x_j‖²`.
#[derive(Debug, Clone)]
pub struct LipschitzOperator {
    l: f64,
}

impl LipschitzOperator {
    /// Fails unless `l > 0`.
    pub fn new(l: f64) -> Result<Self> {
        require_positive("Lipschitz constant L", l)?;
        Ok(LipschitzOperator { l })
    }

    /// Lipschitz constant.
    pub fn l(&self) -> f64 {
        self.l
    }
}

impl FunctionClass for LipschitzOperator {
    fn name(&self) -> &'static str {
        "lipschitz"
    }

    fn reuses_gradient(&self) -> bool {
        true
    }

    fn is_operator(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        unordered_pairs(triples)
            .map(|(i, ti, j, tj)| {
                let dg = ti.gradient.sub(&tj.gradient);
                let dx = ti.point.sub(&tj.point);
                Constraint::leq(dg.norm_squared(), dx.norm_squared().scale(self.l * self.l))
                    .named(pair_name(self.name(), i, j))
            })
            .collect()
    }
}

/// Operators that are both μ-strongly monotone and L-Lipschitz.
///
/// The two conditions are necessary but not sufficient for interpolation in
/// this intersection class, so the computed bound is an upper bound that may
/// not be attained.
#[derive(Debug, Clone)]
pub struct LipschitzStronglyMonotoneOperator {
    mu: f64,
    l: f64,
}

impl LipschitzStronglyMonotoneOperator {
    /// Fails unless `0 ≤ mu ≤ l` and `l > 0`.
    pub fn new(mu: f64, l: f64) -> Result<Self> {
        require_nonneg("strong monotonicity parameter mu", mu)?;
        require_positive("Lipschitz constant L", l)?;
        if mu > l {
            return Err(PepError::InvalidArgument(format!(
                "mu ({}) must not exceed L ({})",
                mu, l
            )));
        }
        Ok(LipschitzStronglyMonotoneOperator { mu, l })
    }
}

impl FunctionClass for LipschitzStronglyMonotoneOperator {
    fn name(&self) -> &'static str {
        "lipschitz_strongly_monotone"
    }

    fn reuses_gradient(&self) -> bool {
        true
    }

    fn is_operator(&self) -> bool {
        true
    }

    fn interpolation_constraints(&self, triples: &[Triple]) -> Vec<Constraint> {
        let mut out = Vec::new();
        for (i, ti, j, tj) in unordered_pairs(triples) {
            let dg = ti.gradient.sub(&tj.gradient);
            let dx = ti.point.sub(&tj.point);
            out.push(
                Constraint::geq(monotonicity(ti, tj), dx.norm_squared().scale(self.mu))
                    .named(format!("strongly_monotone({},{})", i, j)),
            );
            out.push(
                Constraint::leq(dg.norm_squared(), dx.norm_squared().scale(self.l * self.l))
                    .named(format!("lipschitz({},{})", i, j)),
            );
        }
        out
    }
}
