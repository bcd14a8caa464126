//! Bregman-structured function pairs.

use super::{ConvexFunction, Function};
use crate::error::Result;
use crate::expr::{Expression, Point};
use crate::problem::Pep;

/// Declare `(f, h)` where `f` is L-smooth relative to the mirror map `h`,
/// meaning both `Lh − f` and `Lh + f` are convex.
///
/// Built from two convex leaves `d1, d2` with `f = (d2 − d1)/2` and
/// `h = (d1 + d2)/(2L)`, so that `Lh − f = d1` and `Lh + f = d2`. Both leaves
/// reuse gradients, making `f` and `h` differentiable.
pub fn declare_relatively_smooth(pep: &mut Pep, l: f64) -> Result<(Function, Function)> {
    super::class::require_positive("relative smoothness constant L", l)?;
    let d1 = pep
        .declare_function(ConvexFunction::new())?
        .with_gradient_reuse(true)
        .with_name("relative_lower");
    let d2 = pep
        .declare_function(ConvexFunction::new())?
        .with_gradient_reuse(true)
        .with_name("relative_upper");
    let f = d2.combine(0.5, &d1, -0.5)?;
    let h = d1.combine(0.5 / l, &d2, 0.5 / l)?;
    Ok((f, h))
}

/// `D_h(x, y) = h(x) − h(y) − ⟨∇h(y), x − y⟩`.
pub fn bregman_divergence(h: &Function, x: &Point, y: &Point) -> Result<Expression> {
    let (_, hx) = h.oracle(x)?;
    let (gy, hy) = h.oracle(y)?;
    Ok(hx.sub(&hy).sub(&gy.inner(&x.sub(y))))
}
