// src/engine/summary.rs

use std::fmt;

use crate::dag::{TaskGraph, TaskStatus};
use crate::errors::TaskError;
use crate::types::TaskId;

/// Final state of an executor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary<E> {
    /// Completed tasks, in the order they completed.
    pub completed: Vec<TaskId>,
    /// Failed tasks with their cause, in registration order.
    pub failed: Vec<(TaskId, TaskError<E>)>,
    pub canceled: Vec<TaskId>,
    /// Tasks that never became runnable, usually because a dependency failed
    /// or was never submitted.
    pub still_pending: Vec<TaskId>,
}

impl<E: Clone> RunSummary<E> {
    pub fn from_graph<P, R>(graph: &TaskGraph<P, R, E>) -> Self {
        let mut failed = Vec::new();
        let mut canceled = Vec::new();
        let mut still_pending = Vec::new();

        for task in graph.all() {
            match task.status {
                TaskStatus::Failed => {
                    let Some(cause) = task.error.clone() else {
                        panic!("task '{}' is Failed but has no recorded cause", task.id);
                    };
                    failed.push((task.id.clone(), cause));
                }
                TaskStatus::Canceled => canceled.push(task.id.clone()),
                TaskStatus::Pending | TaskStatus::Ready => still_pending.push(task.id.clone()),
                TaskStatus::Running | TaskStatus::Completed => {}
            }
        }

        Self {
            completed: graph.completion_order().to_vec(),
            failed,
            canceled,
            still_pending,
        }
    }
}

impl<E> RunSummary<E> {
    /// True when every task completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.canceled.is_empty() && self.still_pending.is_empty()
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.failed.iter().map(|(id, _)| id)
    }
}

impl<E: fmt::Display> fmt::Display for RunSummary<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "completed: {}", self.completed.len())?;
        for id in &self.completed {
            writeln!(f, "  {id}")?;
        }
        writeln!(f, "failed: {}", self.failed.len())?;
        for (id, err) in &self.failed {
            writeln!(f, "  {id}: {err}")?;
        }
        writeln!(f, "canceled: {}", self.canceled.len())?;
        for id in &self.canceled {
            writeln!(f, "  {id}")?;
        }
        write!(f, "blocked: {}", self.still_pending.len())?;
        for id in &self.still_pending {
            write!(f, "\n  {id}")?;
        }
        Ok(())
    }
}
