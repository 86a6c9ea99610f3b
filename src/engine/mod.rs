// src/engine/mod.rs

//! Async execution engine.
//!
//! [`Executor`] owns a [`crate::dag::Scheduler`] and drives it: it pulls
//! ready tasks off the queue, hands them to workers (see
//! [`crate::exec::task_runner`]), and feeds outcomes back into the graph.
//! [`ExecutorHandle`] lets other tasks submit, cancel, inspect and
//! reprioritize while a run is in progress. [`RunSummary`] is what a run
//! returns.

use crate::types::FailurePolicy;

pub mod executor;
pub mod handle;
pub mod summary;

pub use executor::Executor;
pub use handle::ExecutorHandle;
pub use summary::RunSummary;

/// Default number of tasks allowed to run at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Options for an [`Executor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Maximum number of tasks running at once. Zero is treated as one.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::LeaveBlocked,
        }
    }
}

impl ExecutorOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
