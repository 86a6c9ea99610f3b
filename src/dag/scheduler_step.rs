// src/dag/scheduler_step.rs

//! Result type for a single scheduler step.

use crate::types::TaskId;

/// What changed when a finished task was reported to the scheduler.
///
/// Useful for tests that step the scheduler by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Dependents that became ready and were pushed onto the ready queue.
    pub newly_ready: Vec<TaskId>,
    /// Whether the reported task ended up `Failed`.
    pub failed: bool,
}
