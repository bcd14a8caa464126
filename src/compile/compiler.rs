//! The constraint compiler.
//!
//! Compilation walks every function, initial condition, user constraint and
//! performance metric of a problem, lays out the reachable atoms and rewrites
//! each constraint as a `LinearForm`. The worst case of the smallest metric is
//! computed through an epigraph variable `τ`: maximize `τ` subject to
//! `τ − m_i ≤ 0` for every metric `m_i`.

use log::debug;

use super::gram::{GramIndex, LinearForm};
use crate::constraints::{Constraint, ConstraintKind, Provenance};
use crate::error::{PepError, Result};
use crate::expr::Expression;
use crate::functions::Function;

/// A compiled row: `form = 0` or `form ≤ 0`.
#[derive(Debug, Clone)]
pub struct CompiledConstraint {
    pub form: LinearForm,
    pub kind: ConstraintKind,
    pub provenance: Provenance,
    pub name: String,
}

/// Constraint count contributed by one declared function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub class: &'static str,
    pub triples: usize,
    pub constraints: usize,
}

/// The finite system `maximize τ` over `G ⪰ 0`, `F`, `τ`.
#[derive(Debug, Clone)]
pub struct CompiledPep {
    pub index: GramIndex,
    /// Every row, in compilation order: functions, initial conditions, user
    /// constraints, then one epigraph row per metric.
    pub constraints: Vec<CompiledConstraint>,
    /// The metrics themselves.
    pub metrics: Vec<LinearForm>,
    pub functions: Vec<FunctionSummary>,
}

impl CompiledPep {
    pub fn dim(&self) -> usize {
        self.index.dim()
    }

    pub fn equalities(&self) -> impl Iterator<Item = &CompiledConstraint> + '_ {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Equality)
    }

    pub fn inequalities(&self) -> impl Iterator<Item = &CompiledConstraint> + '_ {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Inequality)
    }

    /// Number of rows with the given provenance.
    pub fn count(&self, provenance: Provenance) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.provenance == provenance)
            .count()
    }
}

/// Everything a problem hands to the compiler.
pub(crate) struct Sources<'a> {
    pub functions: &'a [Function],
    pub initial_conditions: &'a [Constraint],
    pub constraints: &'a [Constraint],
    pub metrics: &'a [Expression],
}

pub(crate) fn compile(src: Sources<'_>) -> Result<CompiledPep> {
    if src.metrics.is_empty() {
        return Err(PepError::IllPosed(
            "no performance metric; call set_performance_metric() before solving".into(),
        ));
    }
    if src.initial_conditions.is_empty() && src.constraints.is_empty() {
        return Err(PepError::IllPosed(
            "no initial condition or constraint bounds the trajectory".into(),
        ));
    }

    let mut rows: Vec<Constraint> = Vec::new();
    let mut functions = Vec::with_capacity(src.functions.len());
    for f in src.functions {
        let emitted = f.interpolation_constraints()?;
        debug!(
            "{} ({}): {} triples, {} constraints",
            f.name(),
            f.class_name().unwrap_or("combination"),
            f.triple_count(),
            emitted.len()
        );
        functions.push(FunctionSummary {
            name: f.name(),
            class: f.class_name().unwrap_or("combination"),
            triples: f.triple_count(),
            constraints: emitted.len(),
        });
        rows.extend(emitted);
    }
    rows.extend(src.initial_conditions.iter().cloned());
    rows.extend(src.constraints.iter().cloned());

    let index = GramIndex::collect(
        rows.iter()
            .map(|c| c.expression())
            .chain(src.metrics.iter()),
    );
    debug!(
        "Gram layout: {} point atoms, {} scalar atoms",
        index.dim(),
        index.scalar_count()
    );

    let mut constraints = Vec::with_capacity(rows.len() + src.metrics.len());
    for (k, c) in rows.iter().enumerate() {
        constraints.push(CompiledConstraint {
            form: LinearForm::from_expression(c.expression(), &index)?,
            kind: c.kind(),
            provenance: c.provenance(),
            name: c
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:?}_{}", c.provenance(), k)),
        });
    }

    let mut metrics = Vec::with_capacity(src.metrics.len());
    for (k, m) in src.metrics.iter().enumerate() {
        let form = LinearForm::from_expression(m, &index)?;
        constraints.push(CompiledConstraint {
            form: LinearForm::epigraph_of(&form),
            kind: ConstraintKind::Inequality,
            provenance: Provenance::PerformanceMetric,
            name: format!("performance_metric_{}", k),
        });
        metrics.push(form);
    }

    debug!(
        "compiled {} equalities and {} inequalities",
        constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Equality)
            .count(),
        constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Inequality)
            .count()
    );

    Ok(CompiledPep {
        index,
        constraints,
        metrics,
        functions,
    })
}
