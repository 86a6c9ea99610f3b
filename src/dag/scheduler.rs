// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task::{Task, TaskDraft, TaskOutcome, TaskStatus};
use crate::errors::{GraphError, ReprioritizeError};
use crate::heap::{FibHeap, NodeHandle};
use crate::types::{IdGenerator, Priority, TaskId};

/// Couples the task graph with the ready queue.
///
/// Invariant: every `Ready` task sits in the ready queue exactly once, keyed
/// by its priority, and `handles` maps it to its heap node. Nothing else is
/// in the queue.
///
/// The scheduler is a single-writer structure. Share it across threads only
/// behind a lock, or funnel all mutations through one owning task (which is
/// what [`crate::engine::Executor`] does).
#[derive(Debug)]
pub struct Scheduler<P, R, E> {
    graph: TaskGraph<P, R, E>,
    ready: FibHeap<Priority, TaskId>,
    handles: HashMap<TaskId, NodeHandle>,
    ids: IdGenerator,
}

impl<P, R, E> Default for Scheduler<P, R, E> {
    fn default() -> Self {
        Self {
            graph: TaskGraph::new(),
            ready: FibHeap::new(),
            handles: HashMap::new(),
            ids: IdGenerator::new(),
        }
    }
}

impl<P, R, E> Scheduler<P, R, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and queue it if it is immediately ready.
    pub fn submit(&mut self, draft: TaskDraft<P>) -> Result<TaskId, GraphError> {
        let TaskDraft {
            id,
            kind,
            payload,
            priority,
            dependencies,
        } = draft;
        let id = match id {
            Some(id) => id,
            None => self.fresh_id(),
        };

        let status = self
            .graph
            .add_task(id.clone(), kind, payload, priority, dependencies)?;
        if status == TaskStatus::Ready {
            self.enqueue(&id, priority);
        }
        Ok(id)
    }

    /// Lower the priority of a task waiting in the ready queue.
    ///
    /// Raising a priority in place is not supported; use [`Scheduler::requeue`].
    pub fn reprioritize(&mut self, id: &TaskId, priority: Priority) -> Result<(), ReprioritizeError> {
        let task = self
            .graph
            .get(id)
            .ok_or_else(|| ReprioritizeError::NotFound(id.clone()))?;
        let handle = *self
            .handles
            .get(id)
            .ok_or_else(|| ReprioritizeError::NotReady(id.clone()))?;

        if priority > task.priority {
            return Err(ReprioritizeError::PriorityIncrease {
                id: id.clone(),
                current: task.priority,
                requested: priority,
            });
        }

        if let Err(e) = self.ready.decrease_key(handle, priority) {
            panic!("ready queue out of sync for task '{id}': {e}");
        }
        debug!(task = %id, priority, "task reprioritized in place");
        self.graph.set_priority(id, priority);
        Ok(())
    }

    /// Change the priority of a ready task in either direction by deleting
    /// and reinserting it.
    pub fn requeue(&mut self, id: &TaskId, priority: Priority) -> Result<(), ReprioritizeError> {
        if !self.graph.contains(id) {
            return Err(ReprioritizeError::NotFound(id.clone()));
        }
        let handle = self
            .handles
            .remove(id)
            .ok_or_else(|| ReprioritizeError::NotReady(id.clone()))?;

        if let Err(e) = self.ready.delete(handle) {
            panic!("ready queue out of sync for task '{id}': {e}");
        }
        self.graph.set_priority(id, priority);
        self.enqueue(id, priority);
        Ok(())
    }

    /// Pop the most urgent ready task.
    ///
    /// The task is still `Ready` in the graph; the caller moves it to
    /// `Running` with [`Scheduler::mark_running`].
    pub fn next_ready(&mut self) -> Option<TaskId> {
        let (priority, id) = self.ready.pop()?;
        self.handles.remove(&id);
        debug!(task = %id, priority, "task extracted from ready queue");
        Some(id)
    }

    /// Move a ready task to `Running`, dropping it from the queue if it is
    /// still there.
    pub fn mark_running(&mut self, id: &TaskId) -> Result<(), GraphError> {
        self.graph.mark_running(id)?;
        if let Some(handle) = self.handles.remove(id) {
            if let Err(e) = self.ready.delete(handle) {
                panic!("ready queue out of sync for task '{id}': {e}");
            }
        }
        Ok(())
    }

    /// Record a handler outcome and queue any dependents it unblocked.
    pub fn on_task_finished(
        &mut self,
        id: &TaskId,
        outcome: TaskOutcome<R, E>,
    ) -> Result<SchedulerStep, GraphError> {
        match outcome {
            TaskOutcome::Completed(result) => {
                let newly_ready = self.graph.mark_completed(id, result)?;
                for ready_id in &newly_ready {
                    let priority = self.graph.get(ready_id).map_or(0, |t| t.priority);
                    self.enqueue(ready_id, priority);
                }
                Ok(SchedulerStep {
                    newly_ready,
                    failed: false,
                })
            }
            TaskOutcome::Failed(error) => {
                self.graph.mark_failed(id, error)?;
                Ok(SchedulerStep {
                    newly_ready: Vec::new(),
                    failed: true,
                })
            }
        }
    }

    /// Cancel a `Pending` or `Ready` task, removing it from the queue.
    pub fn cancel(&mut self, id: &TaskId) -> bool {
        if !self.graph.cancel(id) {
            return false;
        }
        self.dequeue(id);
        true
    }

    /// Cancel everything downstream of `id` that has not started.
    pub fn cancel_dependents(&mut self, id: &TaskId) -> Vec<TaskId> {
        let canceled = self.graph.cancel_dependents(id);
        for c in &canceled {
            self.dequeue(c);
        }
        canceled
    }

    /// Cancel every task that has not started yet.
    pub fn cancel_all_pending(&mut self) -> Vec<TaskId> {
        let mut targets = self.graph.ids_with_status(TaskStatus::Ready);
        targets.extend(self.graph.ids_with_status(TaskStatus::Pending));
        targets.retain(|id| self.cancel(id));
        if !targets.is_empty() {
            warn!(canceled = targets.len(), "canceled all tasks that had not started");
        }
        targets
    }

    /// Tasks still waiting on dependencies.
    pub fn pending_count(&self) -> usize {
        self.graph.count_with_status(TaskStatus::Pending)
    }

    /// Tasks in the ready queue.
    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn running_count(&self) -> usize {
        self.graph.count_with_status(TaskStatus::Running)
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task<P, R, E>> {
        self.graph.get(id)
    }

    pub fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.graph.get(id).map(|t| t.status)
    }

    pub fn graph(&self) -> &TaskGraph<P, R, E> {
        &self.graph
    }

    /// Panic unless the graph is consistent and the ready queue holds exactly
    /// the `Ready` tasks at their current priorities.
    pub fn assert_consistent(&self) {
        self.graph.assert_consistent();
        self.ready.assert_invariants();
        assert_eq!(
            self.handles.len(),
            self.ready.len(),
            "handle table and ready queue sizes differ"
        );

        for (id, handle) in &self.handles {
            let entry = self.ready.get(*handle);
            assert!(
                entry.is_some_and(|(_, queued)| queued == id),
                "handle for '{id}' does not point at its queue entry"
            );
            let task = self.graph.get(id);
            assert!(
                task.is_some_and(|t| t.status == TaskStatus::Ready
                    && entry.is_some_and(|(key, _)| *key == t.priority)),
                "queued task '{id}' is not ready at its recorded priority"
            );
        }

        for task in self.graph.all() {
            if task.status == TaskStatus::Ready {
                assert!(
                    self.handles.contains_key(&task.id),
                    "ready task '{}' is missing from the queue",
                    task.id
                );
            }
        }
    }

    fn enqueue(&mut self, id: &TaskId, priority: Priority) {
        let handle = self.ready.insert(priority, id.clone());
        if self.handles.insert(id.clone(), handle).is_some() {
            panic!("task '{id}' queued twice");
        }
        debug!(task = %id, priority, queued = self.ready.len(), "task queued as ready");
    }

    fn dequeue(&mut self, id: &TaskId) {
        if let Some(handle) = self.handles.remove(id) {
            if let Err(e) = self.ready.delete(handle) {
                panic!("ready queue out of sync for task '{id}': {e}");
            }
        }
    }

    fn fresh_id(&mut self) -> TaskId {
        loop {
            let id = self.ids.next_id();
            if !self.graph.is_known(&id) {
                return id;
            }
        }
    }
}
