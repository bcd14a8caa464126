//! Constraint types for performance estimation problems.
//!
//! Every constraint is stored as a single expression compared against zero:
//! - Equality: `expr == 0`
//! - Inequality: `expr <= 0`

use std::fmt;

use crate::expr::Expression;

/// Relation of a constraint expression to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// `expr == 0`.
    Equality,
    /// `expr <= 0`.
    Inequality,
}

/// Where a constraint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provenance {
    /// Registered through `Pep::set_initial_condition`.
    InitialCondition,
    /// Emitted by a function class at finalization.
    Interpolation,
    /// Attached to a function by a primitive step or by the user.
    FunctionSpecific,
    /// Registered through `Pep::add_constraint`.
    User,
    /// Epigraph row `τ <= metric`.
    PerformanceMetric,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provenance::InitialCondition => "initial condition",
            Provenance::Interpolation => "interpolation",
            Provenance::FunctionSpecific => "function constraint",
            Provenance::User => "user constraint",
            Provenance::PerformanceMetric => "performance metric",
        };
        f.write_str(s)
    }
}

/// A constraint in a performance estimation problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    expr: Expression,
    kind: ConstraintKind,
    provenance: Provenance,
    name: Option<String>,
}

impl Constraint {
    fn new(expr: Expression, kind: ConstraintKind) -> Self {
        Constraint {
            expr,
            kind,
            provenance: Provenance::User,
            name: None,
        }
    }

    /// Create an equality constraint: lhs == rhs.
    pub fn eq(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Constraint::new(lhs.into().sub(&rhs.into()), ConstraintKind::Equality)
    }

    /// Create an inequality constraint: lhs <= rhs.
    pub fn leq(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        // lhs <= rhs  <=>  lhs - rhs <= 0
        Constraint::new(lhs.into().sub(&rhs.into()), ConstraintKind::Inequality)
    }

    /// Create an inequality constraint: lhs >= rhs.
    pub fn geq(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        // lhs >= rhs  <=>  rhs - lhs <= 0
        Constraint::new(rhs.into().sub(&lhs.into()), ConstraintKind::Inequality)
    }

    /// Attach a name, used in certificates and reports.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Return a copy with a different provenance.
    pub(crate) fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// The expression compared against zero.
    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    /// Equality or inequality.
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Where the constraint came from.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Optional name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Build `lhs <= rhs`.
pub fn less_equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Constraint {
    Constraint::leq(lhs, rhs)
}

/// Build `lhs >= rhs`.
pub fn greater_equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Constraint {
    Constraint::geq(lhs, rhs)
}

/// Build `lhs == rhs`.
pub fn equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Constraint {
    Constraint::eq(lhs, rhs)
}

/// Extension trait for creating constraints from expressions.
pub trait ConstraintExt {
    /// Create equality constraint: self == rhs.
    fn equals(&self, rhs: impl Into<Expression>) -> Constraint;

    /// Create inequality constraint: self <= rhs.
    fn le(&self, rhs: impl Into<Expression>) -> Constraint;

    /// Create inequality constraint: self >= rhs.
    fn ge(&self, rhs: impl Into<Expression>) -> Constraint;
}

impl ConstraintExt for Expression {
    fn equals(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::eq(self.clone(), rhs)
    }

    fn le(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::leq(self.clone(), rhs)
    }

    fn ge(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::geq(self.clone(), rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Context;

    #[test]
    fn test_equality_constraint() {
        let ctx = Context::new();
        let f = ctx.new_scalar().unwrap();
        let c = Constraint::eq(f.clone(), 1.0);
        assert_eq!(c.kind(), ConstraintKind::Equality);
        assert_eq!(c.expression().constant_term(), -1.0);
        assert_eq!(c.provenance(), Provenance::User);
    }

    #[test]
    fn test_geq_is_flipped_leq() {
        let ctx = Context::new();
        let x = ctx.new_point().unwrap();
        let a = x.norm_squared().ge(1.0);
        let b = less_equal(1.0, x.norm_squared());
        assert_eq!(a, b);
        assert_eq!(a.kind(), ConstraintKind::Inequality);
        assert_eq!(a.expression().constant_term(), 1.0);
    }

    #[test]
    fn test_named_and_provenance() {
        let c = equal(0.0, 0.0)
            .named("trivial")
            .with_provenance(Provenance::InitialCondition);
        assert_eq!(c.name(), Some("trivial"));
        assert_eq!(c.provenance(), Provenance::InitialCondition);
        assert_eq!(c.provenance().to_string(), "initial condition");
    }
}
