// src/engine/handle.rs

//! Cloneable handle for talking to a running executor.
//!
//! Requests travel over an mpsc channel to the executor loop, which applies
//! them between dispatch rounds and answers on a oneshot. This keeps every
//! scheduler mutation on the loop that owns the scheduler.

use std::fmt;

use tokio::sync::{mpsc, oneshot};

use crate::dag::{Task, TaskDraft};
use crate::errors::{FibdagError, GraphError, ReprioritizeError, Result};
use crate::types::{Priority, TaskId};

pub(crate) enum ControlRequest<P, R, E> {
    Submit {
        draft: TaskDraft<P>,
        reply: oneshot::Sender<std::result::Result<TaskId, GraphError>>,
    },
    Cancel {
        id: TaskId,
        reply: oneshot::Sender<bool>,
    },
    Status {
        id: TaskId,
        reply: oneshot::Sender<Option<Task<P, R, E>>>,
    },
    Reprioritize {
        id: TaskId,
        priority: Priority,
        reply: oneshot::Sender<std::result::Result<(), ReprioritizeError>>,
    },
    Shutdown {
        reply: oneshot::Sender<Vec<TaskId>>,
    },
}

impl<P, R, E> fmt::Debug for ControlRequest<P, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlRequest::Submit { draft, .. } => {
                write!(f, "Submit({})", draft.kind)
            }
            ControlRequest::Cancel { id, .. } => write!(f, "Cancel({id})"),
            ControlRequest::Status { id, .. } => write!(f, "Status({id})"),
            ControlRequest::Reprioritize { id, priority, .. } => {
                write!(f, "Reprioritize({id}, {priority})")
            }
            ControlRequest::Shutdown { .. } => f.write_str("Shutdown"),
        }
    }
}

/// Handle to an [`crate::engine::Executor`].
///
/// Requests are served while [`crate::engine::Executor::run`] is in
/// progress; requests sent between runs wait for the next one. Every method
/// fails with [`FibdagError::ExecutorGone`] once the executor
/// has been dropped.
pub struct ExecutorHandle<P, R, E> {
    tx: mpsc::Sender<ControlRequest<P, R, E>>,
}

impl<P, R, E> Clone for ExecutorHandle<P, R, E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P, R, E> fmt::Debug for ExecutorHandle<P, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorHandle").finish_non_exhaustive()
    }
}

impl<P, R, E> ExecutorHandle<P, R, E> {
    pub(crate) fn new(tx: mpsc::Sender<ControlRequest<P, R, E>>) -> Self {
        Self { tx }
    }

    /// Submit a task to the executor. If a run is in progress the task is
    /// picked up by that run.
    pub async fn submit(&self, draft: TaskDraft<P>) -> Result<TaskId> {
        let id = self
            .request(|reply| ControlRequest::Submit { draft, reply })
            .await??;
        Ok(id)
    }

    /// Cancel a task that has not started. Returns false if the task is
    /// unknown or already running or finished.
    pub async fn cancel(&self, id: impl Into<TaskId>) -> Result<bool> {
        let id = id.into();
        self.request(|reply| ControlRequest::Cancel { id, reply })
            .await
    }

    /// Snapshot of a task's current record.
    pub async fn status(&self, id: impl Into<TaskId>) -> Result<Option<Task<P, R, E>>> {
        let id = id.into();
        self.request(|reply| ControlRequest::Status { id, reply })
            .await
    }

    /// Lower the priority of a ready task.
    pub async fn reprioritize(&self, id: impl Into<TaskId>, priority: Priority) -> Result<()> {
        let id = id.into();
        self.request(|reply| ControlRequest::Reprioritize {
            id,
            priority,
            reply,
        })
        .await??;
        Ok(())
    }

    /// Cancel every task that has not started. Running tasks finish normally.
    pub async fn shutdown(&self) -> Result<Vec<TaskId>> {
        self.request(|reply| ControlRequest::Shutdown { reply })
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ControlRequest<P, R, E>,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| FibdagError::ExecutorGone)?;
        rx.await.map_err(|_| FibdagError::ExecutorGone)
    }
}
