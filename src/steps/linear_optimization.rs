use crate::error::Result;
use crate::expr::{Expression, Point};
use crate::functions::Function;

/// Linear minimization oracle `x ∈ argmin_{u ∈ C} ⟨dir, u⟩` over the set whose
/// indicator is `ind`.
///
/// `−dir` is a normal vector of `C` at `x`, so `(x, −dir, 0)` is registered on
/// `ind`. Returns `(x, −dir, ind(x))`.
pub fn linear_optimization_step(dir: &Point, ind: &Function) -> Result<(Point, Point, Expression)> {
    let ctx = ind.context();
    ctx.check_point(dir, "linear optimization direction")?;
    let x = ctx.new_point()?;
    let gx = dir.neg();
    let fx = super::fresh_value(ind)?;
    ind.add_point(&x, &gx, &fx)?;
    Ok((x, gx, fx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::ConvexIndicatorFunction;
    use crate::problem::Pep;

    #[test]
    fn test_lmo_registers_normal_vector() {
        let mut pep = Pep::new();
        let ind = pep
            .declare_function(ConvexIndicatorFunction::with_diameter(1.0).unwrap())
            .unwrap();
        let d = pep.set_initial_point().unwrap();
        let (_, g, _) = linear_optimization_step(&d, &ind).unwrap();
        assert_eq!(g, d.neg());
        assert_eq!(ind.triple_count(), 1);
    }
}
