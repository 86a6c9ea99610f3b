// src/dag/task.rs

//! Task records, drafts and lifecycle states.

use std::collections::BTreeSet;
use std::fmt;

use crate::errors::TaskError;
use crate::types::{Priority, TaskId};

/// Lifecycle state of a task.
///
/// ```text
/// Pending -> Ready -> Running -> Completed
///    |         |         \-----> Failed
///    \---------+-> Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Waiting on at least one dependency that has not completed.
    Pending,
    /// All dependencies completed; sitting in the ready queue.
    Ready,
    /// Extracted from the ready queue and handed to a handler.
    Running,
    Completed,
    Failed,
    Canceled,
}

impl TaskStatus {
    /// `Completed`, `Failed` and `Canceled` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Result of running a task's handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<R, E> {
    Completed(R),
    Failed(TaskError<E>),
}

/// A registered task.
///
/// `dependencies` only ever holds ids that have not completed yet; an id is
/// removed as soon as that dependency completes. `dependents` mirrors it: if
/// `A.dependencies` contains `B` then `B.dependents` contains `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task<P, R, E> {
    pub id: TaskId,
    /// Selects the handler.
    pub kind: String,
    pub payload: P,
    pub priority: Priority,
    pub status: TaskStatus,
    pub dependencies: BTreeSet<TaskId>,
    pub dependents: BTreeSet<TaskId>,
    pub result: Option<R>,
    pub error: Option<TaskError<E>>,
}

/// Everything the caller provides when submitting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft<P> {
    /// Explicit id; when `None` the scheduler generates one.
    pub id: Option<TaskId>,
    pub kind: String,
    pub payload: P,
    pub priority: Priority,
    pub dependencies: Vec<TaskId>,
}

impl<P> TaskDraft<P> {
    pub fn new(kind: impl Into<String>, payload: P) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            payload,
            priority: 0,
            dependencies: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn after(mut self, dep: impl Into<TaskId>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    pub fn after_all<I, D>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<TaskId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }
}
