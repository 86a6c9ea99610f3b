// src/dag/mod.rs

//! Task dependency graph and scheduling.
//!
//! - [`task`] defines task records, drafts, statuses and outcomes.
//! - [`graph`] holds the dependency DAG and owns task lifecycle state.
//! - [`scheduler`] couples the graph with the Fibonacci-heap ready queue.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod task;

pub use graph::TaskGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task::{Task, TaskDraft, TaskOutcome, TaskStatus};
