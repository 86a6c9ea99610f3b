// src/exec/task_runner.rs

//! Runs one task's handler on a worker and reports the outcome.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::dag::TaskOutcome;
use crate::errors::TaskError;
use crate::exec::registry::TaskHandler;
use crate::types::TaskId;

/// Message sent back to the executor loop when a worker finishes.
#[derive(Debug)]
pub struct Finished<R, E> {
    pub id: TaskId,
    pub outcome: TaskOutcome<R, E>,
}

/// Spawn a worker for `id` and report its outcome on `done_tx`.
///
/// The handler itself runs in a nested task so that a panic is observed as a
/// [`JoinError`] and turned into [`TaskError::Panicked`] instead of taking
/// the worker down with it.
pub fn spawn_task<P, R, E>(
    id: TaskId,
    handler: Arc<dyn TaskHandler<P, R, E>>,
    payload: P,
    done_tx: mpsc::Sender<Finished<R, E>>,
) -> JoinHandle<()>
where
    P: Send + 'static,
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    tokio::spawn(async move {
        info!(task = %id, "starting task handler");
        let outcome = run_handler(handler, payload).await;

        match &outcome {
            TaskOutcome::Completed(_) => info!(task = %id, "task handler completed"),
            TaskOutcome::Failed(err) => warn!(task = %id, error = ?err, "task handler failed"),
        }

        if done_tx.send(Finished { id, outcome }).await.is_err() {
            debug!("executor loop is gone; dropping task outcome");
        }
    })
}

/// Await the handler and map its result onto a [`TaskOutcome`].
pub async fn run_handler<P, R, E>(
    handler: Arc<dyn TaskHandler<P, R, E>>,
    payload: P,
) -> TaskOutcome<R, E>
where
    P: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    let worker = tokio::spawn(async move { handler.call(payload).await });
    match worker.await {
        Ok(Ok(value)) => TaskOutcome::Completed(value),
        Ok(Err(e)) => TaskOutcome::Failed(TaskError::Handler(e)),
        Err(join) => TaskOutcome::Failed(TaskError::Panicked(panic_message(join))),
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    payload_message(err.into_panic())
}

fn payload_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
