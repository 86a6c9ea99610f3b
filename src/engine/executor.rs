// src/engine/executor.rs

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{Scheduler, Task, TaskDraft, TaskOutcome};
use crate::errors::{GraphError, ReprioritizeError, TaskError};
use crate::exec::HandlerRegistry;
use crate::exec::task_runner::{Finished, spawn_task};
use crate::types::{FailurePolicy, Priority, TaskId};

use super::ExecutorOptions;
use super::handle::{ControlRequest, ExecutorHandle};
use super::summary::RunSummary;

const CONTROL_CHANNEL_CAPACITY: usize = 64;

/// Runs scheduled tasks on tokio workers, at most `concurrency` at a time.
///
/// The executor owns its [`Scheduler`]. All scheduler mutations happen on
/// the task that drives [`Executor::run`]; workers only report outcomes
/// back over a channel, and other tasks talk to the loop through an
/// [`ExecutorHandle`].
pub struct Executor<P, R, E> {
    scheduler: Scheduler<P, R, E>,
    registry: Arc<HandlerRegistry<P, R, E>>,
    options: ExecutorOptions,
    control_tx: mpsc::Sender<ControlRequest<P, R, E>>,
    control_rx: mpsc::Receiver<ControlRequest<P, R, E>>,
}

impl<P, R, E> fmt::Debug for Executor<P, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("ready", &self.scheduler.ready_count())
            .field("pending", &self.scheduler.pending_count())
            .finish_non_exhaustive()
    }
}

impl<P, R, E> Executor<P, R, E>
where
    P: Clone + Send + 'static,
    R: Clone + Send + 'static,
    E: Clone + Send + fmt::Debug + 'static,
{
    pub fn new(registry: HandlerRegistry<P, R, E>, options: ExecutorOptions) -> Self {
        Self::with_scheduler(Scheduler::new(), registry, options)
    }

    /// Wrap a scheduler that already has tasks registered.
    pub fn with_scheduler(
        scheduler: Scheduler<P, R, E>,
        registry: HandlerRegistry<P, R, E>,
        options: ExecutorOptions,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        Self {
            scheduler,
            registry: Arc::new(registry),
            options,
            control_tx,
            control_rx,
        }
    }

    pub fn handle(&self) -> ExecutorHandle<P, R, E> {
        ExecutorHandle::new(self.control_tx.clone())
    }

    pub fn submit(&mut self, draft: TaskDraft<P>) -> Result<TaskId, GraphError> {
        self.scheduler.submit(draft)
    }

    /// Cancel a task that has not started yet.
    pub fn cancel_pending(&mut self, id: &TaskId) -> bool {
        self.scheduler.cancel(id)
    }

    pub fn reprioritize(&mut self, id: &TaskId, priority: Priority) -> Result<(), ReprioritizeError> {
        self.scheduler.reprioritize(id, priority)
    }

    pub fn status(&self, id: &TaskId) -> Option<&Task<P, R, E>> {
        self.scheduler.get(id)
    }

    pub fn scheduler(&self) -> &Scheduler<P, R, E> {
        &self.scheduler
    }

    /// Run until no task is running and the ready queue is empty.
    ///
    /// Tasks submitted through an [`ExecutorHandle`] while the run is in
    /// progress are picked up by it. Tasks still `Pending` at the end are
    /// reported in [`RunSummary::still_pending`].
    pub async fn run(&mut self) -> RunSummary<E> {
        let limit = self.options.concurrency.max(1);
        let (done_tx, mut done_rx) = mpsc::channel::<Finished<R, E>>(limit);
        let mut running: HashSet<TaskId> = HashSet::new();

        info!(
            concurrency = limit,
            ready = self.scheduler.ready_count(),
            pending = self.scheduler.pending_count(),
            "executor run started"
        );

        loop {
            self.drain_control();
            self.fill_slots(limit, &mut running, &done_tx);

            if running.is_empty() && self.scheduler.ready_count() == 0 {
                break;
            }

            tokio::select! {
                Some(finished) = done_rx.recv() => {
                    running.remove(&finished.id);
                    self.finish(finished);
                }
                Some(request) = self.control_rx.recv() => {
                    self.handle_control(request);
                }
            }
        }

        let summary = RunSummary::from_graph(self.scheduler.graph());
        info!(
            completed = summary.completed.len(),
            failed = summary.failed.len(),
            canceled = summary.canceled.len(),
            blocked = summary.still_pending.len(),
            "executor run finished"
        );
        if !summary.still_pending.is_empty() {
            warn!(blocked = ?summary.still_pending, "tasks left waiting on dependencies");
        }
        summary
    }

    /// Start ready tasks until every slot is taken or the queue is empty.
    fn fill_slots(
        &mut self,
        limit: usize,
        running: &mut HashSet<TaskId>,
        done_tx: &mpsc::Sender<Finished<R, E>>,
    ) {
        while running.len() < limit {
            let Some(id) = self.scheduler.next_ready() else {
                break;
            };
            if let Err(e) = self.scheduler.mark_running(&id) {
                panic!("task '{id}' came off the ready queue but cannot start: {e}");
            }
            let Some(task) = self.scheduler.get(&id) else {
                panic!("task '{id}' came off the ready queue but is not registered");
            };

            match self.registry.get(&task.kind) {
                Some(handler) => {
                    debug!(task = %id, kind = %task.kind, priority = task.priority, "dispatching task");
                    let payload = task.payload.clone();
                    spawn_task(id.clone(), handler, payload, done_tx.clone());
                    running.insert(id);
                }
                None => {
                    let kind = task.kind.clone();
                    warn!(task = %id, kind = %kind, "no handler registered for kind; failing task");
                    self.finish(Finished {
                        id,
                        outcome: TaskOutcome::Failed(TaskError::UnknownHandler(kind)),
                    });
                }
            }
        }
    }

    fn finish(&mut self, finished: Finished<R, E>) {
        let Finished { id, outcome } = finished;
        let step = match self.scheduler.on_task_finished(&id, outcome) {
            Ok(step) => step,
            Err(e) => panic!("executor lost track of task '{id}': {e}"),
        };

        if !step.newly_ready.is_empty() {
            debug!(task = %id, newly_ready = ?step.newly_ready, "dependents became ready");
        }

        if step.failed && self.options.failure_policy == FailurePolicy::CancelDependents {
            let canceled = self.scheduler.cancel_dependents(&id);
            if !canceled.is_empty() {
                warn!(task = %id, ?canceled, "canceled dependents of failed task");
            }
        }
    }

    fn drain_control(&mut self) {
        while let Ok(request) = self.control_rx.try_recv() {
            self.handle_control(request);
        }
    }

    fn handle_control(&mut self, request: ControlRequest<P, R, E>) {
        debug!(?request, "executor received control request");
        match request {
            ControlRequest::Submit { draft, reply } => {
                let _ = reply.send(self.scheduler.submit(draft));
            }
            ControlRequest::Cancel { id, reply } => {
                let _ = reply.send(self.scheduler.cancel(&id));
            }
            ControlRequest::Status { id, reply } => {
                let _ = reply.send(self.scheduler.get(&id).cloned());
            }
            ControlRequest::Reprioritize {
                id,
                priority,
                reply,
            } => {
                let _ = reply.send(self.scheduler.reprioritize(&id, priority));
            }
            ControlRequest::Shutdown { reply } => {
                let canceled = self.scheduler.cancel_all_pending();
                info!(canceled = canceled.len(), "shutdown requested");
                let _ = reply.send(canceled);
            }
        }
    }
}
