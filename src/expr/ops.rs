//! Operator overloading for `Point` and `Expression`.
//!
//! Every operator delegates to the explicit builder methods
//! (`add`, `sub`, `neg`, `scale`, `inner`), so both spellings produce the
//! same normal form.

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::expression::Expression;
use super::point::Point;

macro_rules! impl_binary {
    ($ty:ty, $trait:ident, $method:ident) => {
        impl $trait for $ty {
            type Output = $ty;

            fn $method(self, rhs: $ty) -> $ty {
                <$ty>::$method(&self, &rhs)
            }
        }

        impl $trait for &$ty {
            type Output = $ty;

            fn $method(self, rhs: &$ty) -> $ty {
                <$ty>::$method(self, rhs)
            }
        }

        impl $trait<&$ty> for $ty {
            type Output = $ty;

            fn $method(self, rhs: &$ty) -> $ty {
                <$ty>::$method(&self, rhs)
            }
        }

        impl $trait<$ty> for &$ty {
            type Output = $ty;

            fn $method(self, rhs: $ty) -> $ty {
                <$ty>::$method(self, &rhs)
            }
        }
    };
}

macro_rules! impl_scalar {
    ($ty:ty) => {
        impl Neg for $ty {
            type Output = $ty;

            fn neg(self) -> $ty {
                <$ty>::neg(&self)
            }
        }

        impl Neg for &$ty {
            type Output = $ty;

            fn neg(self) -> $ty {
                <$ty>::neg(self)
            }
        }

        impl Mul<f64> for $ty {
            type Output = $ty;

            fn mul(self, rhs: f64) -> $ty {
                self.scale(rhs)
            }
        }

        impl Mul<f64> for &$ty {
            type Output = $ty;

            fn mul(self, rhs: f64) -> $ty {
                self.scale(rhs)
            }
        }

        impl Mul<$ty> for f64 {
            type Output = $ty;

            fn mul(self, rhs: $ty) -> $ty {
                rhs.scale(self)
            }
        }

        impl Mul<&$ty> for f64 {
            type Output = $ty;

            fn mul(self, rhs: &$ty) -> $ty {
                rhs.scale(self)
            }
        }

        impl Div<f64> for $ty {
            type Output = $ty;

            fn div(self, rhs: f64) -> $ty {
                self.scale(1.0 / rhs)
            }
        }

        impl Div<f64> for &$ty {
            type Output = $ty;

            fn div(self, rhs: f64) -> $ty {
                self.scale(1.0 / rhs)
            }
        }
    };
}

impl_binary!(Point, Add, add);
impl_binary!(Point, Sub, sub);
impl_scalar!(Point);

impl_binary!(Expression, Add, add);
impl_binary!(Expression, Sub, sub);
impl_scalar!(Expression);

// Inner product: `&x * &y` is `⟨x, y⟩`.
impl Mul for &Point {
    type Output = Expression;

    fn mul(self, rhs: &Point) -> Expression {
        self.inner(rhs)
    }
}

impl Mul for Point {
    type Output = Expression;

    fn mul(self, rhs: Point) -> Expression {
        self.inner(&rhs)
    }
}

impl Add<f64> for Expression {
    type Output = Expression;

    fn add(self, rhs: f64) -> Expression {
        self.add_constant(rhs)
    }
}

impl Add<f64> for &Expression {
    type Output = Expression;

    fn add(self, rhs: f64) -> Expression {
        self.add_constant(rhs)
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;

    fn sub(self, rhs: f64) -> Expression {
        self.add_constant(-rhs)
    }
}

impl Sub<f64> for &Expression {
    type Output = Expression;

    fn sub(self, rhs: f64) -> Expression {
        self.add_constant(-rhs)
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::atom::Context;

    #[test]
    fn test_operators_match_builders() {
        let ctx = Context::new();
        let x = ctx.new_point().unwrap();
        let g = ctx.new_point().unwrap();
        let via_ops = &x - &(&g * 0.5);
        let via_builders = x.sub(&g.scale(0.5));
        assert_eq!(via_ops, via_builders);
        assert_eq!(&x * &g, x.inner(&g));
        assert_eq!(-&x, x.neg());
        assert_eq!(&x / 2.0, x.scale(0.5));
    }

    #[test]
    fn test_expression_operators() {
        let ctx = Context::new();
        let f0 = ctx.new_scalar().unwrap();
        let f1 = ctx.new_scalar().unwrap();
        let e = (&f0 - &f1) * 2.0 + 1.0;
        assert_eq!(e, f0.sub(&f1).scale(2.0).add_constant(1.0));
        assert_eq!(2.0 * &f0, f0.scale(2.0));
    }
}
