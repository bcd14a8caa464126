use crate::error::{PepError, Result};
use crate::expr::{Expression, Point};
use crate::functions::Function;

/// `x = prox_{γf}(x0)`, or the resolvent `(I + γA)⁻¹ x0` for an operator.
///
/// Registers `(x, (x0 − x)/γ, f(x))` on `f` and returns `(x, g, f(x))`.
pub fn proximal_step(x0: &Point, f: &Function, gamma: f64) -> Result<(Point, Point, Expression)> {
    if !(gamma > 0.0) || !gamma.is_finite() {
        return Err(PepError::InvalidArgument(format!(
            "step size gamma must be positive and finite, got {}",
            gamma
        )));
    }
    let ctx = f.context();
    ctx.check_point(x0, "proximal step start")?;
    let x = ctx.new_point()?;
    let gx = x0.sub(&x).scale(1.0 / gamma);
    let fx = super::fresh_value(f)?;
    f.add_point(&x, &gx, &fx)?;
    Ok((x, gx, fx))
}
