// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::TaskDraft;
use crate::engine::{DEFAULT_CONCURRENCY, ExecutorOptions};
use crate::types::{FailurePolicy, Priority};

/// Plan file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [executor]
/// concurrency = 2
/// failure_policy = "cancel_dependents"
///
/// [task.fetch]
/// kind = "shell"
/// payload = "curl -sO https://example.com/data.csv"
///
/// [task.build]
/// kind = "shell"
/// payload = "make"
/// priority = -5
/// after = ["fetch"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlanFile {
    #[serde(default)]
    pub executor: ExecutorSection,

    /// Keys are task ids.
    #[serde(default)]
    pub task: BTreeMap<String, TaskSpec>,
}

/// `[executor]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExecutorSection {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskSpec {
    /// Handler kind, e.g. `"shell"`.
    pub kind: String,

    #[serde(default)]
    pub payload: String,

    /// Lower runs first.
    #[serde(default)]
    pub priority: Priority,

    /// Ids of tasks that must complete before this one becomes ready.
    #[serde(default)]
    pub after: Vec<String>,
}

/// A validated plan. Construct through `TryFrom<RawPlanFile>` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct PlanFile {
    executor: ExecutorSection,
    task: BTreeMap<String, TaskSpec>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(executor: ExecutorSection, task: BTreeMap<String, TaskSpec>) -> Self {
        Self { executor, task }
    }

    pub fn executor(&self) -> &ExecutorSection {
        &self.executor
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskSpec> {
        &self.task
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            concurrency: self.executor.concurrency,
            failure_policy: self.executor.failure_policy,
        }
    }

    /// One draft per task, in id order.
    ///
    /// Dependencies may point at tasks later in the list; the scheduler
    /// resolves them when those tasks are submitted.
    pub fn drafts(&self) -> Vec<TaskDraft<String>> {
        self.task
            .iter()
            .map(|(id, spec)| {
                TaskDraft::new(spec.kind.clone(), spec.payload.clone())
                    .with_id(id.as_str())
                    .priority(spec.priority)
                    .after_all(spec.after.iter().map(String::as_str))
            })
            .collect()
    }
}
