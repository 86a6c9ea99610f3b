#![allow(dead_code)]

use std::collections::BTreeMap;

use fibdag::config::{ExecutorSection, PlanFile, RawPlanFile, TaskSpec};
use fibdag::types::{FailurePolicy, Priority};

/// Builder for `PlanFile` to simplify test setup.
pub struct PlanFileBuilder {
    plan: RawPlanFile,
}

impl PlanFileBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawPlanFile {
                executor: ExecutorSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, id: &str, task: TaskSpec) -> Self {
        self.plan.task.insert(id.to_string(), task);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.plan.executor.concurrency = concurrency;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.plan.executor.failure_policy = policy;
        self
    }

    /// The unvalidated plan, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawPlanFile {
        self.plan
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }
}

impl Default for PlanFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskSpec`.
pub struct TaskSpecBuilder {
    task: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(kind: &str, payload: &str) -> Self {
        Self {
            task: TaskSpec {
                kind: kind.to_string(),
                payload: payload.to_string(),
                priority: 0,
                after: vec![],
            },
        }
    }

    pub fn shell(cmd: &str) -> Self {
        Self::new("shell", cmd)
    }

    pub fn echo(message: &str) -> Self {
        Self::new("echo", message)
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskSpec {
        self.task
    }
}
