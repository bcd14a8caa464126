//! Basis atoms and the per-problem arena that allocates them.
//!
//! An atom is either one independent direction of the implicit Hilbert space
//! (a *point atom*) or one free scalar such as a function value (a *scalar atom*).
//! Atoms are only ever created by the [`Context`] owned by a problem, so two
//! problems never share numbering.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use super::expression::Expression;
use super::point::Point;
use crate::error::{PepError, Result};

/// Identity of a performance estimation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProblemId(u64);

impl ProblemId {
    /// Generate a new unique ID.
    pub(crate) fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ProblemId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Handle of a basis atom.
///
/// Ordering is (problem, allocation index), which is the order the compiler
/// uses to lay out Gram matrix rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom {
    problem: ProblemId,
    index: usize,
}

impl Atom {
    /// Problem that allocated this atom.
    pub fn problem(&self) -> ProblemId {
        self.problem
    }

    /// Allocation index within its problem.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Atom arena owned by a single problem.
#[derive(Debug)]
pub(crate) struct Context {
    id: ProblemId,
    points: Cell<usize>,
    scalars: Cell<usize>,
    sealed: Cell<bool>,
}

impl Context {
    pub(crate) fn new() -> Self {
        Context {
            id: ProblemId::new(),
            points: Cell::new(0),
            scalars: Cell::new(0),
            sealed: Cell::new(false),
        }
    }

    pub(crate) fn id(&self) -> ProblemId {
        self.id
    }

    /// Allocate a fresh independent point.
    pub(crate) fn new_point(&self) -> Result<Point> {
        self.ensure_open()?;
        let index = self.points.get();
        self.points.set(index + 1);
        Ok(Point::from_atom(Atom {
            problem: self.id,
            index,
        }))
    }

    /// Allocate a fresh free scalar.
    pub(crate) fn new_scalar(&self) -> Result<Expression> {
        self.ensure_open()?;
        let index = self.scalars.get();
        self.scalars.set(index + 1);
        Ok(Expression::from_atom(Atom {
            problem: self.id,
            index,
        }))
    }

    pub(crate) fn point_count(&self) -> usize {
        self.points.get()
    }

    pub(crate) fn scalar_count(&self) -> usize {
        self.scalars.get()
    }

    pub(crate) fn seal(&self) {
        self.sealed.set(true);
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.sealed.get() {
            return Err(PepError::AlreadyCompiled(
                "no new points, triples or constraints can be registered".into(),
            ));
        }
        Ok(())
    }

    /// Check that every atom of `point` belongs to this problem.
    pub(crate) fn check_point(&self, point: &Point, what: &str) -> Result<()> {
        for atom in point.atoms() {
            self.check_atom(atom, self.points.get(), what)?;
        }
        Ok(())
    }

    /// Check that every atom of `expr` belongs to this problem.
    pub(crate) fn check_expression(&self, expr: &Expression, what: &str) -> Result<()> {
        for atom in expr.scalar_atoms() {
            self.check_atom(atom, self.scalars.get(), what)?;
        }
        for atom in expr.point_atoms() {
            self.check_atom(atom, self.points.get(), what)?;
        }
        Ok(())
    }

    fn check_atom(&self, atom: Atom, allocated: usize, what: &str) -> Result<()> {
        if atom.problem != self.id {
            return Err(PepError::InvalidReference(format!(
                "{} refers to an atom of problem {} but is used in problem {}",
                what,
                atom.problem.raw(),
                self.id.raw()
            )));
        }
        if atom.index >= allocated {
            return Err(PepError::InvalidArgument(format!(
                "{} refers to atom {} which was never declared",
                what, atom.index
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_id() {
        let id1 = ProblemId::new();
        let id2 = ProblemId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_counters_are_per_context() {
        let a = Context::new();
        let b = Context::new();
        let pa = a.new_point().unwrap();
        let pb = b.new_point().unwrap();
        let ia = pa.atoms().next().unwrap();
        let ib = pb.atoms().next().unwrap();
        assert_eq!(ia.index(), 0);
        assert_eq!(ib.index(), 0);
        assert_ne!(ia, ib);
        assert_eq!(a.new_point().unwrap().atoms().next().unwrap().index(), 1);
        assert_eq!(b.point_count(), 1);
    }

    #[test]
    fn test_scalar_and_point_counters_are_independent() {
        let ctx = Context::new();
        ctx.new_point().unwrap();
        ctx.new_point().unwrap();
        let f = ctx.new_scalar().unwrap();
        assert_eq!(f.scalar_atoms().next().unwrap().index(), 0);
        assert_eq!(ctx.point_count(), 2);
        assert_eq!(ctx.scalar_count(), 1);
    }

    #[test]
    fn test_cross_context_check() {
        let a = Context::new();
        let b = Context::new();
        let p = b.new_point().unwrap();
        assert!(matches!(
            a.check_point(&p, "x"),
            Err(PepError::InvalidReference(_))
        ));
        assert!(b.check_point(&p, "x").is_ok());
    }

    #[test]
    fn test_sealed_context_rejects_allocation() {
        let ctx = Context::new();
        ctx.seal();
        assert!(ctx.is_sealed());
        assert!(matches!(
            ctx.new_point(),
            Err(PepError::AlreadyCompiled(_))
        ));
    }
}
