// src/errors.rs

//! Crate-wide error types.
//!
//! Task-level failures ([`TaskError`]) are recorded on the task and never
//! abort a run. Scheduling errors ([`GraphError`], [`ReprioritizeError`]) are
//! returned to the caller that asked for the mutation. [`FibdagError`] covers
//! the plan-file / CLI surface.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum FibdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cycle detected in task plan: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task submission rejected: {0}")]
    Submit(#[from] GraphError),

    #[error("Reprioritize rejected: {0}")]
    Reprioritize(#[from] ReprioritizeError),

    #[error("Executor is no longer running")]
    ExecutorGone,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Adding a dependency edge would close a cycle in the task graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{task}' cannot depend on '{via}': '{via}' already depends on '{task}'")]
pub struct CycleError {
    /// The task whose submission was rejected.
    pub task: TaskId,
    /// The requested dependency from which `task` is reachable.
    pub via: TaskId,
}

/// Errors raised by [`crate::dag::TaskGraph`] mutations.
///
/// Every variant is raised before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("task '{0}' is already registered")]
    DuplicateTask(TaskId),

    #[error("unknown task '{0}'")]
    UnknownTask(TaskId),

    #[error("task '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        id: TaskId,
        from: crate::dag::TaskStatus,
        to: crate::dag::TaskStatus,
    },
}

/// Errors raised by [`crate::heap::FibHeap`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The handle's node has already been extracted or deleted.
    #[error("heap handle no longer refers to a live node")]
    StaleHandle,

    /// `decrease_key` was asked to raise a key.
    #[error("decrease_key called with a key larger than the current one")]
    KeyIncrease,
}

/// Errors raised by [`crate::dag::Scheduler::reprioritize`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReprioritizeError {
    #[error("unknown task '{0}'")]
    NotFound(TaskId),

    #[error("task '{0}' is not waiting in the ready queue")]
    NotReady(TaskId),

    #[error("task '{id}' priority can only decrease in place (current {current}, requested {requested})")]
    PriorityIncrease {
        id: TaskId,
        current: i64,
        requested: i64,
    },
}

/// Why a task ended up `Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError<E> {
    /// The handler returned an error; recorded verbatim.
    #[error("handler error: {0}")]
    Handler(E),

    /// No handler is registered for the task's kind.
    #[error("no handler registered for kind '{0}'")]
    UnknownHandler(String),

    /// The handler panicked (or its worker was aborted).
    #[error("handler panicked: {0}")]
    Panicked(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FibdagError>;
