use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Task priority. Lower values are more urgent.
pub type Priority = i64;

/// Unique identifier of a task within one scheduler.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hands out `task-1`, `task-2`, ... for drafts submitted without an id.
///
/// Owned by the scheduler; there is no process-wide counter.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next candidate id. The caller is responsible for skipping ids that are
    /// already taken.
    pub fn next_id(&mut self) -> TaskId {
        self.next += 1;
        TaskId(format!("task-{}", self.next))
    }
}

/// What happens to the dependents of a task that fails.
///
/// - `LeaveBlocked`: dependents stay `Pending` forever and are reported as
///   blocked in the run summary (default).
/// - `CancelDependents`: every transitively dependent `Pending` task is
///   canceled as soon as the failure is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    LeaveBlocked,
    CancelDependents,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::LeaveBlocked
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "leave_blocked" => Ok(FailurePolicy::LeaveBlocked),
            "cancel_dependents" => Ok(FailurePolicy::CancelDependents),
            other => Err(format!(
                "invalid failure_policy: {other} (expected \"leave_blocked\" or \"cancel_dependents\")"
            )),
        }
    }
}
