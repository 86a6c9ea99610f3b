// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::dag::task::{Task, TaskStatus};
use crate::errors::{CycleError, GraphError, TaskError};
use crate::types::{Priority, TaskId};

/// In-memory dependency graph of task records.
///
/// Owns every task's lifecycle state. Edges are stored in both directions
/// (`dependencies` / `dependents`); a dependency on an id that has not been
/// registered yet is parked in `awaiting` until that id arrives.
///
/// Acyclicity is enforced on insertion: a submission whose dependencies could
/// reach the new task is rejected before any state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGraph<P, R, E> {
    tasks: HashMap<TaskId, Task<P, R, E>>,
    /// Registration order, for stable snapshots.
    order: Vec<TaskId>,
    /// Unregistered dependency id -> registered tasks waiting on it.
    awaiting: BTreeMap<TaskId, BTreeSet<TaskId>>,
    completion_order: Vec<TaskId>,
}

impl<P, R, E> Default for TaskGraph<P, R, E> {
    fn default() -> Self {
        Self {
            tasks: HashMap::new(),
            order: Vec::new(),
            awaiting: BTreeMap::new(),
            completion_order: Vec::new(),
        }
    }
}

impl<P, R, E> TaskGraph<P, R, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task<P, R, E>> {
        self.tasks.get(id)
    }

    /// All tasks in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Task<P, R, E>> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    pub fn ids_with_status(&self, status: TaskStatus) -> Vec<TaskId> {
        self.all()
            .filter(|t| t.status == status)
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status == status).count()
    }

    /// Ids in the order they reached `Completed`.
    pub fn completion_order(&self) -> &[TaskId] {
        &self.completion_order
    }

    /// Ids that registered tasks depend on but that were never submitted.
    pub fn awaited_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.awaiting.keys()
    }

    /// Whether `id` is registered or referenced as a not-yet-submitted dependency.
    pub fn is_known(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id) || self.awaiting.contains_key(id)
    }

    /// Register a task.
    ///
    /// Dependencies that already completed are dropped; the rest are
    /// recorded in both directions. Returns `Ready` when nothing is left to
    /// wait on, `Pending` otherwise. Rejects duplicates, self-dependencies
    /// and any edge that would close a cycle, without mutating the graph.
    pub fn add_task(
        &mut self,
        id: TaskId,
        kind: impl Into<String>,
        payload: P,
        priority: Priority,
        dependencies: impl IntoIterator<Item = TaskId>,
    ) -> Result<TaskStatus, GraphError> {
        if self.tasks.contains_key(&id) {
            return Err(GraphError::DuplicateTask(id));
        }

        let requested: BTreeSet<TaskId> = dependencies.into_iter().collect();
        for dep in &requested {
            if self.reaches(dep, &id) {
                return Err(CycleError {
                    task: id.clone(),
                    via: dep.clone(),
                }
                .into());
            }
        }

        let mut remaining = BTreeSet::new();
        for dep in requested {
            match self.tasks.get_mut(&dep) {
                Some(task) if task.status == TaskStatus::Completed => continue,
                Some(task) => {
                    task.dependents.insert(id.clone());
                }
                None => {
                    self.awaiting
                        .entry(dep.clone())
                        .or_default()
                        .insert(id.clone());
                }
            }
            remaining.insert(dep);
        }

        let dependents = self.awaiting.remove(&id).unwrap_or_default();
        let status = if remaining.is_empty() {
            TaskStatus::Ready
        } else {
            TaskStatus::Pending
        };
        let kind = kind.into();

        debug!(
            task = %id,
            kind = %kind,
            priority,
            waiting_on = remaining.len(),
            waited_on_by = dependents.len(),
            %status,
            "task registered"
        );

        self.order.push(id.clone());
        self.tasks.insert(
            id.clone(),
            Task {
                id,
                kind,
                payload,
                priority,
                status,
                dependencies: remaining,
                dependents,
                result: None,
                error: None,
            },
        );

        self.debug_check();
        Ok(status)
    }

    /// `Ready` -> `Running`.
    pub fn mark_running(&mut self, id: &TaskId) -> Result<(), GraphError> {
        let task = self.task_mut(id)?;
        transition(task, &[TaskStatus::Ready], TaskStatus::Running)?;
        debug!(task = %id, "task running");
        Ok(())
    }

    /// `Running` -> `Completed`.
    ///
    /// Removes this task from every dependent's dependency set and returns
    /// the dependents that became `Ready` as a result.
    pub fn mark_completed(&mut self, id: &TaskId, result: R) -> Result<Vec<TaskId>, GraphError> {
        let task = self.task_mut(id)?;
        transition(task, &[TaskStatus::Running], TaskStatus::Completed)?;
        task.result = Some(result);
        let dependents = std::mem::take(&mut task.dependents);

        let mut newly_ready = Vec::new();
        for dependent_id in dependents {
            let Some(dependent) = self.tasks.get_mut(&dependent_id) else {
                panic!("task '{id}' lists unregistered dependent '{dependent_id}'");
            };
            dependent.dependencies.remove(id);
            if dependent.dependencies.is_empty() && dependent.status == TaskStatus::Pending {
                dependent.status = TaskStatus::Ready;
                debug!(task = %dependent_id, unblocked_by = %id, "dependencies satisfied; task ready");
                newly_ready.push(dependent_id);
            }
        }

        self.completion_order.push(id.clone());
        self.debug_check();
        Ok(newly_ready)
    }

    /// `Running` -> `Failed`. Dependents are left untouched.
    pub fn mark_failed(&mut self, id: &TaskId, error: TaskError<E>) -> Result<(), GraphError> {
        let task = self.task_mut(id)?;
        transition(task, &[TaskStatus::Running], TaskStatus::Failed)?;
        task.error = Some(error);
        debug!(task = %id, blocked_dependents = task.dependents.len(), "task failed");
        self.debug_check();
        Ok(())
    }

    /// `Pending`/`Ready` -> `Canceled`.
    ///
    /// The task stops waiting on its own dependencies; tasks that depend on
    /// it stay blocked. Returns `false` for unknown ids and for tasks that
    /// are running or already terminal.
    pub fn cancel(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.tasks.get_mut(id) else {
            return false;
        };
        if task.status.is_terminal() || task.status == TaskStatus::Running {
            return false;
        }

        task.status = TaskStatus::Canceled;
        let dependencies = std::mem::take(&mut task.dependencies);
        for dep in &dependencies {
            self.detach_dependent(dep, id);
        }

        debug!(task = %id, "task canceled");
        self.debug_check();
        true
    }

    /// Cancel every `Pending` task that transitively depends on `id`.
    pub fn cancel_dependents(&mut self, id: &TaskId) -> Vec<TaskId> {
        let mut stack: Vec<TaskId> = self
            .tasks
            .get(id)
            .map(|t| t.dependents.iter().cloned().collect())
            .unwrap_or_default();
        let mut canceled = Vec::new();

        while let Some(next) = stack.pop() {
            let downstream: Vec<TaskId> = match self.tasks.get(&next) {
                Some(t) if t.status == TaskStatus::Pending => t.dependents.iter().cloned().collect(),
                _ => continue,
            };
            if self.cancel(&next) {
                canceled.push(next);
                stack.extend(downstream);
            }
        }

        canceled
    }

    pub(crate) fn set_priority(&mut self, id: &TaskId, priority: Priority) {
        if let Some(task) = self.tasks.get_mut(id) {
            task.priority = priority;
        }
    }

    /// Panic unless both edge directions agree and statuses match their
    /// dependency sets.
    pub fn assert_consistent(&self) {
        for task in self.tasks.values() {
            let id = &task.id;
            assert!(
                !task.dependencies.contains(id) && !task.dependents.contains(id),
                "task '{id}' has a self-loop"
            );

            for dep in &task.dependencies {
                match self.tasks.get(dep) {
                    Some(d) => {
                        assert!(
                            d.dependents.contains(id),
                            "'{id}' depends on '{dep}' but '{dep}' does not list it as a dependent"
                        );
                        assert_ne!(
                            d.status,
                            TaskStatus::Completed,
                            "'{id}' still waits on completed task '{dep}'"
                        );
                    }
                    None => assert!(
                        self.awaiting.get(dep).is_some_and(|w| w.contains(id)),
                        "'{id}' waits on unregistered '{dep}' without an awaiting entry"
                    ),
                }
            }

            for dependent in &task.dependents {
                let waiting = self
                    .tasks
                    .get(dependent)
                    .is_some_and(|d| d.dependencies.contains(id));
                assert!(
                    waiting,
                    "'{id}' lists '{dependent}' as a dependent but it does not wait on '{id}'"
                );
            }

            match task.status {
                TaskStatus::Ready => assert!(
                    task.dependencies.is_empty(),
                    "ready task '{id}' still has dependencies"
                ),
                TaskStatus::Pending => assert!(
                    !task.dependencies.is_empty(),
                    "pending task '{id}' has nothing to wait on"
                ),
                _ => {}
            }
        }

        for (dep, waiters) in &self.awaiting {
            assert!(!self.tasks.contains_key(dep), "awaited id '{dep}' is registered");
            for waiter in waiters {
                assert!(
                    self.tasks
                        .get(waiter)
                        .is_some_and(|t| t.dependencies.contains(dep)),
                    "'{waiter}' is parked on '{dep}' but does not depend on it"
                );
            }
        }
    }

    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            self.assert_consistent();
        }
    }

    fn task_mut(&mut self, id: &TaskId) -> Result<&mut Task<P, R, E>, GraphError> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownTask(id.clone()))
    }

    /// Whether `target` is reachable from `from` along dependency edges.
    fn reaches(&self, from: &TaskId, target: &TaskId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(task) = self.tasks.get(current) {
                stack.extend(task.dependencies.iter());
            }
        }

        false
    }

    fn detach_dependent(&mut self, dep: &TaskId, dependent: &TaskId) {
        if let Some(task) = self.tasks.get_mut(dep) {
            task.dependents.remove(dependent);
        } else if let Some(waiters) = self.awaiting.get_mut(dep) {
            waiters.remove(dependent);
            if waiters.is_empty() {
                self.awaiting.remove(dep);
            }
        }
    }
}

fn transition<P, R, E>(
    task: &mut Task<P, R, E>,
    allowed_from: &[TaskStatus],
    to: TaskStatus,
) -> Result<(), GraphError> {
    if !allowed_from.contains(&task.status) {
        return Err(GraphError::InvalidTransition {
            id: task.id.clone(),
            from: task.status,
            to,
        });
    }
    task.status = to;
    Ok(())
}
