use std::fmt;
use std::str::FromStr;

use crate::constraints::Constraint;
use crate::error::{PepError, Result};
use crate::expr::{Expression, Point};
use crate::functions::Function;

/// How the gradient error of an inexact step is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InexactNotion {
    /// `‖d − ∇f(x0)‖ ≤ ε ‖∇f(x0)‖`.
    Relative,
    /// `‖d − ∇f(x0)‖ ≤ ε`.
    Absolute,
}

impl fmt::Display for InexactNotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InexactNotion::Relative => write!(f, "relative"),
            InexactNotion::Absolute => write!(f, "absolute"),
        }
    }
}

impl FromStr for InexactNotion {
    type Err = PepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "relative" => Ok(InexactNotion::Relative),
            "absolute" => Ok(InexactNotion::Absolute),
            other => Err(PepError::InvalidArgument(format!(
                "unknown inexactness notion '{}'",
                other
            ))),
        }
    }
}

/// `x = x0 − γ d` where `d` approximates `∇f(x0)` up to `epsilon`.
///
/// Returns `(x, d, f(x0))`. The accuracy requirement is attached to `f`.
pub fn inexact_gradient_step(
    x0: &Point,
    f: &Function,
    gamma: f64,
    epsilon: f64,
    notion: InexactNotion,
) -> Result<(Point, Point, Expression)> {
    if !(epsilon >= 0.0) || !epsilon.is_finite() {
        return Err(PepError::InvalidArgument(format!(
            "accuracy epsilon must be non-negative and finite, got {}",
            epsilon
        )));
    }
    let (gx0, fx0) = f.oracle(x0)?;
    let d = f.context().new_point()?;
    let error = d.sub(&gx0).norm_squared();
    let bound = match notion {
        InexactNotion::Relative => gx0.norm_squared().scale(epsilon * epsilon),
        InexactNotion::Absolute => Expression::constant(epsilon * epsilon),
    };
    f.add_constraint(Constraint::leq(error, bound).named(format!("inexact_gradient({})", notion)))?;
    let x = x0.sub(&d.scale(gamma));
    Ok((x, d, fx0))
}

/// Exact line search along `directions` from `x0`.
///
/// The new iterate `x` is free, its gradient is orthogonal to `x − x0` and to
/// every direction. Returns `(x, ∇f(x), f(x))`.
pub fn exact_linesearch_step(
    x0: &Point,
    f: &Function,
    directions: &[Point],
) -> Result<(Point, Point, Expression)> {
    let ctx = f.context();
    ctx.check_point(x0, "line search start")?;
    for d in directions {
        ctx.check_point(d, "line search direction")?;
    }
    let x = ctx.new_point()?;
    let gx = ctx.new_point()?;
    let fx = super::fresh_value(f)?;
    f.add_point(&x, &gx, &fx)?;
    f.add_constraint(Constraint::eq(x.sub(x0).inner(&gx), 0.0).named("linesearch_step"))?;
    for (k, d) in directions.iter().enumerate() {
        f.add_constraint(
            Constraint::eq(d.inner(&gx), 0.0).named(format!("linesearch_direction({})", k)),
        )?;
    }
    Ok((x, gx, fx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ConstraintKind, Provenance};
    use crate::functions::SmoothConvexFunction;
    use crate::problem::Pep;

    #[test]
    fn test_inexact_step_adds_accuracy_constraint() {
        let mut pep = Pep::new();
        let f = pep
            .declare_function(SmoothConvexFunction::new(1.0).unwrap())
            .unwrap();
        let x0 = pep.set_initial_point().unwrap();
        let (x, d, _) = inexact_gradient_step(&x0, &f, 0.5, 0.1, InexactNotion::Relative).unwrap();
        assert!(x.approx_eq(&x0.sub(&d.scale(0.5)), 1e-12));

        let constraints = f.interpolation_constraints().unwrap();
        let extra: Vec<_> = constraints
            .iter()
            .filter(|c| c.provenance() == Provenance::FunctionSpecific)
            .collect();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].kind(), ConstraintKind::Inequality);
    }

    #[test]
    fn test_notion_from_str() {
        assert_eq!("Absolute".parse::<InexactNotion>().unwrap(), InexactNotion::Absolute);
        assert!("fuzzy".parse::<InexactNotion>().is_err());
    }

    #[test]
    fn test_linesearch_orthogonality_constraints() {
        let mut pep = Pep::new();
        let f = pep
            .declare_function(SmoothConvexFunction::new(1.0).unwrap())
            .unwrap();
        let x0 = pep.set_initial_point().unwrap();
        let g0 = f.gradient(&x0).unwrap();
        exact_linesearch_step(&x0, &f, &[g0]).unwrap();
        let equalities = f
            .interpolation_constraints()
            .unwrap()
            .into_iter()
            .filter(|c| c.kind() == ConstraintKind::Equality)
            .count();
        assert_eq!(equalities, 2);
        assert_eq!(f.triple_count(), 2);
    }
}
