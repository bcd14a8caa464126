//! Problem definition and solving API.
//!
//! A `Pep` owns the atom arena, the declared functions, the initial
//! conditions, the user constraints and the performance metrics. Describe an
//! algorithm by calling oracles on the functions it returns, then solve:
//! ```ignore
//! let mut pep = Pep::new();
//! let f = pep.declare_function(SmoothConvexFunction::new(1.0)?)?;
//! let xs = f.stationary_point()?;
//! let x0 = pep.set_initial_point()?;
//! pep.set_initial_condition((&x0 - &xs).norm_squared().le(1.0))?;
//! let x1 = &x0 - f.gradient(&x0)? * 1.0;
//! pep.set_performance_metric(f.value(&x1)? - f.value(&xs)?)?;
//! let result = pep.solve()?;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::certificate::{analyze, attach_reduction, PepResult};
use crate::compile::{compile, CompiledPep, Sources};
use crate::constraints::{Constraint, Provenance};
use crate::error::Result;
use crate::expr::{Context, Expression, Point, ProblemId};
use crate::functions::{Function, FunctionClass, LeafFunction};
use crate::report::Report;
use crate::solver::{reduce, solve, stuff_problem, Settings};

/// A performance estimation problem.
#[derive(Debug)]
pub struct Pep {
    ctx: Rc<Context>,
    functions: Vec<Function>,
    initial_points: Vec<Point>,
    initial_conditions: Vec<Constraint>,
    constraints: Vec<Constraint>,
    metrics: Vec<Expression>,
    compiled: Option<CompiledPep>,
}

impl Default for Pep {
    fn default() -> Self {
        Self::new()
    }
}

impl Pep {
    pub fn new() -> Self {
        Pep {
            ctx: Rc::new(Context::new()),
            functions: Vec::new(),
            initial_points: Vec::new(),
            initial_conditions: Vec::new(),
            constraints: Vec::new(),
            metrics: Vec::new(),
            compiled: None,
        }
    }

    pub fn id(&self) -> ProblemId {
        self.ctx.id()
    }

    /// Declare a function or operator of the given class.
    pub fn declare_function<C: FunctionClass + 'static>(&mut self, class: C) -> Result<Function> {
        self.ctx.ensure_open()?;
        let leaf = LeafFunction::new(self.functions.len(), Box::new(class));
        let f = Function::leaf(self.ctx.clone(), Rc::new(RefCell::new(leaf)));
        self.functions.push(f.clone());
        Ok(f)
    }

    /// Declare a new free point.
    pub fn set_initial_point(&mut self) -> Result<Point> {
        let x = self.ctx.new_point()?;
        self.initial_points.push(x.clone());
        Ok(x)
    }

    /// Register a constraint bounding the starting configuration.
    pub fn set_initial_condition(&mut self, constraint: Constraint) -> Result<()> {
        self.ctx.ensure_open()?;
        self.ctx
            .check_expression(constraint.expression(), "initial condition")?;
        self.initial_conditions
            .push(constraint.with_provenance(Provenance::InitialCondition));
        Ok(())
    }

    /// Register an additional constraint on the trajectory.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<()> {
        self.ctx.ensure_open()?;
        self.ctx.check_expression(constraint.expression(), "constraint")?;
        self.constraints
            .push(constraint.with_provenance(Provenance::User));
        Ok(())
    }

    /// Register a performance metric. With several metrics the worst case of
    /// their minimum is computed.
    pub fn set_performance_metric(&mut self, metric: impl Into<Expression>) -> Result<()> {
        self.ctx.ensure_open()?;
        let metric = metric.into();
        self.ctx.check_expression(&metric, "performance metric")?;
        self.metrics.push(metric);
        Ok(())
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn initial_points(&self) -> &[Point] {
        &self.initial_points
    }

    pub fn is_compiled(&self) -> bool {
        self.ctx.is_sealed()
    }

    /// Compile the problem, sealing it against further growth.
    ///
    /// The first successful compilation is cached and reused by every later
    /// call and solve.
    pub fn compile(&mut self) -> Result<&CompiledPep> {
        let compiled = match self.compiled.take() {
            Some(compiled) => compiled,
            None => {
                let compiled = compile(Sources {
                    functions: &self.functions,
                    initial_conditions: &self.initial_conditions,
                    constraints: &self.constraints,
                    metrics: &self.metrics,
                })?;
                self.ctx.seal();
                debug!(
                    "problem {} sealed after allocating {} point atoms and {} scalar atoms",
                    self.ctx.id().raw(),
                    self.ctx.point_count(),
                    self.ctx.scalar_count()
                );
                compiled
            }
        };
        let compiled: &CompiledPep = self.compiled.insert(compiled);
        Ok(compiled)
    }

    /// Solve with default settings.
    pub fn solve(&mut self) -> Result<PepResult> {
        self.solve_with(&Settings::default())
    }

    /// Solve with custom settings.
    pub fn solve_with(&mut self, settings: &Settings) -> Result<PepResult> {
        let problem = self.ctx.id();
        let compiled = self.compile()?;
        Report::problem(compiled).emit(settings.verbosity);

        let stuffed = stuff_problem(compiled);
        debug!(
            "stuffed {} rows over {} variables",
            stuffed.cone_dims.total(),
            stuffed.var_map.total_vars()
        );
        let raw = solve(&stuffed, settings)?;
        let mut result = analyze(problem, compiled, &stuffed, &raw, settings);

        if let (Some(method), Some(value)) = (settings.dimension_reduction, result.value) {
            let reduced = reduce(compiled, value - settings.reduction_tol, method, settings)?;
            attach_reduction(
                &mut result,
                problem,
                compiled,
                &stuffed.var_map,
                &reduced,
                method,
                settings,
            );
        }

        for w in &result.warnings {
            debug!("{}", w);
        }
        Report::outcome(&result).emit(settings.verbosity);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintExt;
    use crate::error::PepError;
    use crate::functions::{ConvexFunction, RsiEbFunction, SmoothConvexFunction};

    fn gradient_step_problem() -> (Pep, Function) {
        let mut pep = Pep::new();
        let f = pep
            .declare_function(SmoothConvexFunction::new(1.0).unwrap())
            .unwrap();
        let xs = f.stationary_point().unwrap();
        let x0 = pep.set_initial_point().unwrap();
        pep.set_initial_condition(x0.sub(&xs).norm_squared().le(1.0))
            .unwrap();
        let x1 = x0.sub(&f.gradient(&x0).unwrap());
        pep.set_performance_metric(f.value(&x1).unwrap().sub(&f.value(&xs).unwrap()))
            .unwrap();
        (pep, f)
    }

    #[test]
    fn test_compile_seals_problem() {
        let (mut pep, f) = gradient_step_problem();
        pep.compile().unwrap();
        assert!(pep.is_compiled());
        let x = pep.initial_points()[0].clone();
        assert!(matches!(f.gradient(&x), Err(PepError::AlreadyCompiled(_))));
        assert!(matches!(
            pep.set_initial_point(),
            Err(PepError::AlreadyCompiled(_))
        ));
        assert!(matches!(
            pep.declare_function(ConvexFunction::new()),
            Err(PepError::AlreadyCompiled(_))
        ));
    }

    #[test]
    fn test_compile_is_cached() {
        let (mut pep, _) = gradient_step_problem();
        let first = pep.compile().unwrap().constraints.len();
        let second = pep.compile().unwrap().constraints.len();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_bound_is_ill_posed() {
        let mut pep = Pep::new();
        let f = pep.declare_function(ConvexFunction::new()).unwrap();
        let x0 = pep.set_initial_point().unwrap();
        pep.set_performance_metric(f.value(&x0).unwrap()).unwrap();
        assert!(matches!(pep.compile(), Err(PepError::IllPosed(_))));
        // a failed compile leaves the problem open
        assert!(pep.set_initial_point().is_ok());
    }

    #[test]
    fn test_missing_stationary_point_is_ill_posed() {
        let mut pep = Pep::new();
        let f = pep
            .declare_function(RsiEbFunction::new(0.5, 1.0).unwrap())
            .unwrap();
        let x0 = pep.set_initial_point().unwrap();
        let g0 = f.gradient(&x0).unwrap();
        pep.set_initial_condition(x0.norm_squared().le(1.0)).unwrap();
        pep.set_performance_metric(g0.norm_squared()).unwrap();
        assert!(matches!(pep.compile(), Err(PepError::IllPosed(_))));
    }

    #[test]
    fn test_foreign_metric_rejected() {
        let mut a = Pep::new();
        let mut b = Pep::new();
        let x = a.set_initial_point().unwrap();
        b.set_initial_point().unwrap();
        assert!(matches!(
            b.set_performance_metric(x.norm_squared()),
            Err(PepError::InvalidReference(_))
        ));
    }
}
