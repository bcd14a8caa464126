//! Function handles and oracle calls.
//!
//! A `Function` is a cheap clonable handle. Leaves are declared through
//! `Pep::declare_function` and own their recorded triples; combinations are
//! weighted sums of leaves of the same problem and forward every oracle call
//! to their leaves.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::class::{FunctionClass, Triple};
use crate::constraints::{Constraint, Provenance};
use crate::error::{PepError, Result};
use crate::expr::{Context, Expression, Point};

/// Points closer than this share an oracle answer.
const REUSE_TOL: f64 = 1e-10;

/// State of one declared function.
#[derive(Debug)]
pub(crate) struct LeafFunction {
    pub(crate) id: usize,
    pub(crate) name: String,
    pub(crate) class: Box<dyn FunctionClass>,
    pub(crate) triples: Vec<Triple>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) reuse_gradient: bool,
}

impl LeafFunction {
    pub(crate) fn new(id: usize, class: Box<dyn FunctionClass>) -> Self {
        let reuse_gradient = class.reuses_gradient();
        LeafFunction {
            id,
            name: format!("Function_{}", id + 1),
            class,
            triples: Vec::new(),
            constraints: Vec::new(),
            reuse_gradient,
        }
    }

    /// Interpolation constraints followed by function-specific constraints.
    pub(crate) fn finalize(&self) -> Result<Vec<Constraint>> {
        if self.class.requires_stationary_point() && !self.triples.iter().any(|t| t.stationary) {
            return Err(PepError::IllPosed(format!(
                "{} ({}) needs a stationary point of its own; call stationary_point() on it \
                 directly, since a stationary point of a sum containing it does not count",
                self.name,
                self.class.name()
            )));
        }
        let mut out: Vec<Constraint> = self
            .class
            .interpolation_constraints(&self.triples)
            .into_iter()
            .map(|c| {
                let name = format!("{}:{}", self.name, c.name().unwrap_or(self.class.name()));
                c.named(name).with_provenance(Provenance::Interpolation)
            })
            .collect();
        out.extend(self.constraints.iter().cloned());
        Ok(out)
    }
}

pub(crate) type LeafRef = Rc<RefCell<LeafFunction>>;

#[derive(Debug, Clone)]
enum Kind {
    Leaf(LeafRef),
    Combination(Vec<(LeafRef, f64)>),
}

/// Handle to a function or operator of a performance estimation problem.
#[derive(Debug, Clone)]
pub struct Function {
    ctx: Rc<Context>,
    kind: Kind,
}

impl Function {
    pub(crate) fn leaf(ctx: Rc<Context>, leaf: LeafRef) -> Self {
        Function {
            ctx,
            kind: Kind::Leaf(leaf),
        }
    }

    pub(crate) fn context(&self) -> &Rc<Context> {
        &self.ctx
    }

    /// True for functions declared directly on a problem.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, Kind::Leaf(_))
    }

    /// Name of a leaf, or a description of the combination.
    pub fn name(&self) -> String {
        match &self.kind {
            Kind::Leaf(leaf) => leaf.borrow().name.clone(),
            Kind::Combination(terms) => terms
                .iter()
                .map(|(leaf, w)| format!("{}*{}", w, leaf.borrow().name))
                .collect::<Vec<_>>()
                .join(" + "),
        }
    }

    /// Rename a leaf (no effect on combinations).
    pub fn with_name(self, name: impl Into<String>) -> Self {
        if let Kind::Leaf(leaf) = &self.kind {
            leaf.borrow_mut().name = name.into();
        }
        self
    }

    /// Override the class's gradient reuse policy (leaves only).
    pub fn with_gradient_reuse(self, reuse: bool) -> Self {
        if let Kind::Leaf(leaf) = &self.kind {
            leaf.borrow_mut().reuse_gradient = reuse;
        }
        self
    }

    /// Class name of a leaf.
    pub fn class_name(&self) -> Option<&'static str> {
        match &self.kind {
            Kind::Leaf(leaf) => Some(leaf.borrow().class.name()),
            Kind::Combination(_) => None,
        }
    }

    /// True when every leaf is an operator (no function values).
    pub fn is_operator(&self) -> bool {
        self.decomposition()
            .iter()
            .all(|(leaf, _)| leaf.borrow().class.is_operator())
    }

    /// Number of triples recorded on a leaf (sum over leaves for combinations).
    pub fn triple_count(&self) -> usize {
        self.decomposition()
            .iter()
            .map(|(leaf, _)| leaf.borrow().triples.len())
            .sum()
    }

    /// Snapshot of the triples recorded on a leaf.
    pub fn triples(&self) -> Vec<Triple> {
        match &self.kind {
            Kind::Leaf(leaf) => leaf.borrow().triples.clone(),
            Kind::Combination(_) => Vec::new(),
        }
    }

    /// Constraints this function contributes at compile time.
    ///
    /// Errors for classes that need a stationary point when none was registered.
    pub fn interpolation_constraints(&self) -> Result<Vec<Constraint>> {
        let mut out = Vec::new();
        for (leaf, _) in self.decomposition() {
            out.extend(leaf.borrow().finalize()?);
        }
        Ok(out)
    }

    fn decomposition(&self) -> Vec<(LeafRef, f64)> {
        match &self.kind {
            Kind::Leaf(leaf) => vec![(leaf.clone(), 1.0)],
            Kind::Combination(terms) => terms.clone(),
        }
    }

    // ========== Combinations ==========

    /// Linear combination `a·self + b·other`.
    pub fn combine(&self, a: f64, other: &Function, b: f64) -> Result<Function> {
        if !Rc::ptr_eq(&self.ctx, &other.ctx) {
            return Err(PepError::InvalidReference(
                "cannot combine functions declared in different problems".into(),
            ));
        }
        let mut weights: BTreeMap<usize, (LeafRef, f64)> = BTreeMap::new();
        for (scale, f) in [(a, self), (b, other)] {
            for (leaf, w) in f.decomposition() {
                let id = leaf.borrow().id;
                weights.entry(id).or_insert_with(|| (leaf.clone(), 0.0)).1 += scale * w;
            }
        }
        let terms: Vec<(LeafRef, f64)> = weights
            .into_values()
            .filter(|(_, w)| *w != 0.0)
            .collect();
        Ok(self.with_terms(terms))
    }

    /// Sum of two functions.
    pub fn add(&self, other: &Function) -> Result<Function> {
        self.combine(1.0, other, 1.0)
    }

    /// Difference of two functions.
    pub fn sub(&self, other: &Function) -> Result<Function> {
        self.combine(1.0, other, -1.0)
    }

    /// Multiplication by a scalar.
    pub fn scale(&self, scalar: f64) -> Function {
        let terms: Vec<(LeafRef, f64)> = self
            .decomposition()
            .into_iter()
            .map(|(leaf, w)| (leaf, w * scalar))
            .filter(|(_, w)| *w != 0.0)
            .collect();
        self.with_terms(terms)
    }

    fn with_terms(&self, terms: Vec<(LeafRef, f64)>) -> Function {
        let kind = if terms.len() == 1 && terms[0].1 == 1.0 {
            Kind::Leaf(terms[0].0.clone())
        } else {
            Kind::Combination(terms)
        };
        Function {
            ctx: self.ctx.clone(),
            kind,
        }
    }

    // ========== Oracles ==========

    /// Gradient (or subgradient, or operator image) and value at `x`.
    pub fn oracle(&self, x: &Point) -> Result<(Point, Expression)> {
        self.ctx.ensure_open()?;
        self.ctx.check_point(x, "oracle point")?;
        let mut gradient = Point::zero();
        let mut value = Expression::zero();
        for (leaf, w) in self.decomposition() {
            let (g, f) = self.leaf_oracle(&leaf, x)?;
            gradient = gradient.combine(1.0, &g, w);
            value = value.combine(1.0, &f, w);
        }
        Ok((gradient, value))
    }

    /// Gradient at `x`.
    pub fn gradient(&self, x: &Point) -> Result<Point> {
        Ok(self.oracle(x)?.0)
    }

    /// Subgradient at `x`.
    pub fn subgradient(&self, x: &Point) -> Result<Point> {
        self.gradient(x)
    }

    /// Function value at `x`.
    pub fn value(&self, x: &Point) -> Result<Expression> {
        Ok(self.oracle(x)?.1)
    }

    fn leaf_oracle(&self, leaf: &LeafRef, x: &Point) -> Result<(Point, Expression)> {
        let mut leaf = leaf.borrow_mut();
        let seen = leaf
            .triples
            .iter()
            .find(|t| t.point.approx_eq(x, REUSE_TOL))
            .cloned();
        if let Some(t) = seen {
            if leaf.reuse_gradient {
                return Ok((t.gradient, t.value));
            }
            let g = self.ctx.new_point()?;
            leaf.triples.push(Triple::new(x.clone(), g.clone(), t.value.clone()));
            return Ok((g, t.value));
        }
        let g = self.ctx.new_point()?;
        let f = if leaf.class.is_operator() {
            Expression::zero()
        } else {
            self.ctx.new_scalar()?
        };
        leaf.triples.push(Triple::new(x.clone(), g.clone(), f.clone()));
        Ok((g, f))
    }

    /// Register a minimizer (or zero of an operator): fresh point, zero
    /// gradient, fresh value.
    pub fn stationary_point(&self) -> Result<Point> {
        self.ctx.ensure_open()?;
        let x = self.ctx.new_point()?;
        match &self.kind {
            Kind::Leaf(leaf) => {
                let mut leaf = leaf.borrow_mut();
                let value = if leaf.class.is_operator() {
                    Expression::zero()
                } else {
                    self.ctx.new_scalar()?
                };
                leaf.triples.push(Triple {
                    point: x.clone(),
                    gradient: Point::zero(),
                    value,
                    stationary: true,
                });
            }
            // Split through add_point: no leaf gets a zero gradient, so no
            // leaf triple is flagged stationary.
            Kind::Combination(_) => {
                let value = if self.is_operator() {
                    Expression::zero()
                } else {
                    self.ctx.new_scalar()?
                };
                self.add_point(&x, &Point::zero(), &value)?;
            }
        }
        Ok(x)
    }

    /// Register an externally built triple `(x, g, f)`.
    ///
    /// On a combination `Σ w_i f_i`, every leaf but the last receives a fresh
    /// gradient and value and the last leaf receives the remainder, so that the
    /// weighted sums equal `g` and `f`.
    pub fn add_point(&self, x: &Point, g: &Point, f: &Expression) -> Result<()> {
        self.ctx.ensure_open()?;
        self.ctx.check_point(x, "triple point")?;
        self.ctx.check_point(g, "triple gradient")?;
        self.ctx.check_expression(f, "triple value")?;
        match &self.kind {
            Kind::Leaf(leaf) => {
                let mut leaf = leaf.borrow_mut();
                let value = if leaf.class.is_operator() {
                    Expression::zero()
                } else {
                    f.clone()
                };
                leaf.triples.push(Triple::new(x.clone(), g.clone(), value));
                Ok(())
            }
            Kind::Combination(terms) => {
                let Some(((last, w_last), rest)) = terms.split_last() else {
                    return Err(PepError::InvalidArgument(
                        "cannot register a point on the zero function".into(),
                    ));
                };
                let mut g_rest = g.clone();
                let mut f_rest = f.clone();
                for (leaf, w) in rest {
                    let gi = self.ctx.new_point()?;
                    let fi = if leaf.borrow().class.is_operator() {
                        Expression::zero()
                    } else {
                        self.ctx.new_scalar()?
                    };
                    g_rest = g_rest.combine(1.0, &gi, -w);
                    f_rest = f_rest.combine(1.0, &fi, -w);
                    leaf.borrow_mut()
                        .triples
                        .push(Triple::new(x.clone(), gi, fi));
                }
                let value = if last.borrow().class.is_operator() {
                    Expression::zero()
                } else {
                    f_rest.scale(1.0 / w_last)
                };
                last.borrow_mut().triples.push(Triple::new(
                    x.clone(),
                    g_rest.scale(1.0 / w_last),
                    value,
                ));
                Ok(())
            }
        }
    }

    /// Attach a constraint compiled together with this function.
    ///
    /// On a combination the constraint is stored on its first leaf.
    pub fn add_constraint(&self, constraint: Constraint) -> Result<()> {
        self.ctx.ensure_open()?;
        self.ctx
            .check_expression(constraint.expression(), "function constraint")?;
        let Some((leaf, _)) = self.decomposition().into_iter().next() else {
            return Err(PepError::InvalidArgument(
                "cannot attach a constraint to the zero function".into(),
            ));
        };
        leaf.borrow_mut()
            .constraints
            .push(constraint.with_provenance(Provenance::FunctionSpecific));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{ConvexFunction, MonotoneOperator, SmoothConvexFunction};

    fn leaf(ctx: &Rc<Context>, id: usize, class: Box<dyn FunctionClass>) -> Function {
        Function::leaf(
            ctx.clone(),
            Rc::new(RefCell::new(LeafFunction::new(id, class))),
        )
    }

    #[test]
    fn test_oracle_records_triple() {
        let ctx = Rc::new(Context::new());
        let f = leaf(&ctx, 0, Box::new(ConvexFunction::new()));
        let x = ctx.new_point().unwrap();
        let (g, v) = f.oracle(&x).unwrap();
        assert!(!g.is_zero());
        assert!(!v.is_constant());
        assert_eq!(f.triple_count(), 1);
    }

    #[test]
    fn test_gradient_reuse() {
        let ctx = Rc::new(Context::new());
        let smooth = leaf(&ctx, 0, Box::new(SmoothConvexFunction::new(1.0).unwrap()));
        let convex = leaf(&ctx, 1, Box::new(ConvexFunction::new()));
        let x = ctx.new_point().unwrap();
        let same_x = x.scale(2.0).sub(&x);

        let (g1, f1) = smooth.oracle(&x).unwrap();
        let (g2, f2) = smooth.oracle(&same_x).unwrap();
        assert_eq!(g1, g2);
        assert_eq!(f1, f2);
        assert_eq!(smooth.triple_count(), 1);

        let (h1, v1) = convex.oracle(&x).unwrap();
        let (h2, v2) = convex.oracle(&x).unwrap();
        assert_ne!(h1, h2);
        assert_eq!(v1, v2);
        assert_eq!(convex.triple_count(), 2);
    }

    #[test]
    fn test_operator_has_zero_value() {
        let ctx = Rc::new(Context::new());
        let a = leaf(&ctx, 0, Box::new(MonotoneOperator::new()));
        let x = ctx.new_point().unwrap();
        let (_, v) = a.oracle(&x).unwrap();
        assert!(v.is_constant());
        assert_eq!(ctx.scalar_count(), 0);
    }

    #[test]
    fn test_combination_oracle_sums_leaves() {
        let ctx = Rc::new(Context::new());
        let f = leaf(&ctx, 0, Box::new(ConvexFunction::new()));
        let h = leaf(&ctx, 1, Box::new(ConvexFunction::new()));
        let sum = f.add(&h.scale(2.0)).unwrap();
        assert!(!sum.is_leaf());
        let x = ctx.new_point().unwrap();
        let (g, _) = sum.oracle(&x).unwrap();
        let gf = &f.triples()[0].gradient;
        let gh = &h.triples()[0].gradient;
        assert_eq!(g, gf.add(&gh.scale(2.0)));
    }

    #[test]
    fn test_combination_collapses_to_leaf() {
        let ctx = Rc::new(Context::new());
        let f = leaf(&ctx, 0, Box::new(ConvexFunction::new()));
        let h = leaf(&ctx, 1, Box::new(ConvexFunction::new()));
        let back = f.add(&h).unwrap().sub(&h).unwrap();
        assert!(back.is_leaf());
    }

    #[test]
    fn test_add_point_on_combination_splits() {
        let ctx = Rc::new(Context::new());
        let f = leaf(&ctx, 0, Box::new(ConvexFunction::new()));
        let h = leaf(&ctx, 1, Box::new(ConvexFunction::new()));
        let sum = f.combine(0.5, &h, 2.0).unwrap();
        let x = ctx.new_point().unwrap();
        let g = ctx.new_point().unwrap();
        let v = ctx.new_scalar().unwrap();
        sum.add_point(&x, &g, &v).unwrap();

        let tf = &f.triples()[0];
        let th = &h.triples()[0];
        let recombined = tf.gradient.combine(0.5, &th.gradient, 2.0);
        assert!(recombined.approx_eq(&g, 1e-12));
        let value = tf.value.combine(0.5, &th.value, 2.0);
        assert!(value.approx_eq(&v, 1e-12));
    }

    #[test]
    fn test_cross_problem_combination_rejected() {
        let a = Rc::new(Context::new());
        let b = Rc::new(Context::new());
        let f = leaf(&a, 0, Box::new(ConvexFunction::new()));
        let h = leaf(&b, 0, Box::new(ConvexFunction::new()));
        assert!(matches!(f.add(&h), Err(PepError::InvalidReference(_))));
    }

    #[test]
    fn test_cross_problem_oracle_rejected() {
        let a = Rc::new(Context::new());
        let b = Rc::new(Context::new());
        let f = leaf(&a, 0, Box::new(ConvexFunction::new()));
        let x = b.new_point().unwrap();
        assert!(matches!(f.oracle(&x), Err(PepError::InvalidReference(_))));
    }

    #[test]
    fn test_stationary_point_flagged() {
        let ctx = Rc::new(Context::new());
        let f = leaf(&ctx, 0, Box::new(ConvexFunction::new()));
        let xs = f.stationary_point().unwrap();
        let t = &f.triples()[0];
        assert!(t.stationary);
        assert!(t.gradient.is_zero());
        assert_eq!(t.point, xs);
        // value is reused at x*, subgradient is not for a nonsmooth class
        let fs = f.value(&xs).unwrap();
        assert_eq!(fs, t.value);
    }
}
