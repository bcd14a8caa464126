use crate::error::Result;
use crate::expr::{Expression, Point};
use crate::functions::Function;

/// Mirror descent step `∇h(x) = ∇h(x0) − γ g0`.
///
/// `gx0` is the gradient used for the step and `sx0 = ∇h(x0)`. Registers
/// `(x, ∇h(x), h(x))` on `h` and returns it.
pub fn bregman_gradient_step(
    gx0: &Point,
    sx0: &Point,
    h: &Function,
    gamma: f64,
) -> Result<(Point, Point, Expression)> {
    let ctx = h.context();
    ctx.check_point(gx0, "Bregman step gradient")?;
    ctx.check_point(sx0, "Bregman step mirror point")?;
    let sx = sx0.sub(&gx0.scale(gamma));
    let x = ctx.new_point()?;
    let hx = super::fresh_value(h)?;
    h.add_point(&x, &sx, &hx)?;
    Ok((x, sx, hx))
}

/// Bregman proximal step `x = argmin_u { γ f(u) + D_h(u, x0) }`.
///
/// Optimality reads `∇h(x) = ∇h(x0) − γ g` with `g ∈ ∂f(x)`. Returns
/// `(x, ∇h(x), h(x), g, f(x))`.
pub fn bregman_proximal_step(
    sx0: &Point,
    h: &Function,
    f: &Function,
    gamma: f64,
) -> Result<(Point, Point, Expression, Point, Expression)> {
    let ctx = h.context();
    ctx.check_point(sx0, "Bregman step mirror point")?;
    let x = ctx.new_point()?;
    let gx = ctx.new_point()?;
    let fx = super::fresh_value(f)?;
    f.add_point(&x, &gx, &fx)?;
    let sx = sx0.sub(&gx.scale(gamma));
    let hx = super::fresh_value(h)?;
    h.add_point(&x, &sx, &hx)?;
    Ok((x, sx, hx, gx, fx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{declare_relatively_smooth, ConvexFunction};
    use crate::problem::Pep;

    #[test]
    fn test_bregman_gradient_step_moves_mirror_point() {
        let mut pep = Pep::new();
        let (f, h) = declare_relatively_smooth(&mut pep, 1.0).unwrap();
        let x0 = pep.set_initial_point().unwrap();
        let (g0, _) = f.oracle(&x0).unwrap();
        let (s0, _) = h.oracle(&x0).unwrap();
        let (_, s1, _) = bregman_gradient_step(&g0, &s0, &h, 0.5).unwrap();
        assert!(s1.approx_eq(&s0.sub(&g0.scale(0.5)), 1e-12));
    }

    #[test]
    fn test_bregman_proximal_step_registers_on_both() {
        let mut pep = Pep::new();
        let f = pep.declare_function(ConvexFunction::new()).unwrap();
        let h = pep.declare_function(ConvexFunction::new()).unwrap();
        let x0 = pep.set_initial_point().unwrap();
        let (s0, _) = h.oracle(&x0).unwrap();
        bregman_proximal_step(&s0, &h, &f, 1.0).unwrap();
        assert_eq!(f.triple_count(), 1);
        assert_eq!(h.triple_count(), 2);
    }
}
