// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PlanFile, RawPlanFile, TaskSpec};
use crate::errors::{FibdagError, Result};

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = FibdagError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_plan(&raw)?;
        Ok(PlanFile::new_unchecked(raw.executor, raw.task))
    }
}

fn validate_raw_plan(plan: &RawPlanFile) -> Result<()> {
    ensure_has_tasks(plan)?;
    validate_executor_section(plan)?;
    validate_task_dependencies(plan)?;
    topological_order(&plan.task)?;
    Ok(())
}

fn ensure_has_tasks(plan: &RawPlanFile) -> Result<()> {
    if plan.task.is_empty() {
        return Err(FibdagError::ConfigError(
            "plan must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_executor_section(plan: &RawPlanFile) -> Result<()> {
    if plan.executor.concurrency == 0 {
        return Err(FibdagError::ConfigError(
            "[executor].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_dependencies(plan: &RawPlanFile) -> Result<()> {
    for (id, task) in &plan.task {
        if task.kind.trim().is_empty() {
            return Err(FibdagError::ConfigError(format!(
                "task '{id}' has an empty `kind`"
            )));
        }
        for dep in &task.after {
            if dep == id {
                return Err(FibdagError::ConfigError(format!(
                    "task '{id}' cannot depend on itself in `after`"
                )));
            }
            if !plan.task.contains_key(dep) {
                return Err(FibdagError::ConfigError(format!(
                    "task '{id}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

/// Task ids in an order where every task comes after its dependencies.
///
/// Edge direction is dependency -> dependent.
fn topological_order(tasks: &BTreeMap<String, TaskSpec>) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in tasks.keys() {
        graph.add_node(id.as_str());
    }
    for (id, task) in tasks {
        for dep in &task.after {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(FibdagError::DagCycle(format!(
            "cycle detected in task plan involving task '{}'",
            cycle.node_id()
        ))),
    }
}

impl PlanFile {
    /// Task ids in dependency order, as printed by `--dry-run`.
    pub fn execution_order(&self) -> Vec<String> {
        // Validated plans are acyclic.
        topological_order(self.tasks()).unwrap_or_default()
    }
}

/// Validate an already-parsed plan.
pub fn validate_plan(plan: RawPlanFile) -> Result<PlanFile> {
    PlanFile::try_from(plan)
}
