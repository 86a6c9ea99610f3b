// tests/executor_runs.rs

mod common;
use crate::common::{
    CallLog, RecordingHandler, draft, init_tracing, recording_registry, with_timeout,
};

use std::error::Error;
use std::time::Duration;

use fibdag::dag::{TaskDraft, TaskStatus};
use fibdag::engine::{Executor, ExecutorOptions};
use fibdag::errors::TaskError;
use fibdag::exec::HandlerRegistry;
use fibdag::types::{FailurePolicy, TaskId};

type TestResult = Result<(), Box<dyn Error>>;

fn options(concurrency: usize) -> ExecutorOptions {
    ExecutorOptions::default().with_concurrency(concurrency)
}

fn ids(raw: &[&str]) -> Vec<TaskId> {
    raw.iter().map(|s| TaskId::from(*s)).collect()
}

async fn fail(payload: String) -> Result<String, String> {
    Err(format!("{payload} went wrong"))
}

async fn explode(_payload: String) -> Result<String, String> {
    panic!("handler blew up");
}

#[tokio::test]
async fn dependents_run_after_their_dependency() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let mut executor = Executor::new(recording_registry(RecordingHandler::new(log.clone())), options(2));
    executor.submit(draft("t1", 0, &[]))?;
    executor.submit(draft("t2", 0, &["t1"]))?;
    executor.submit(draft("t3", 0, &["t1"]))?;

    let summary = with_timeout(executor.run()).await;

    assert!(summary.is_success(), "{summary}");
    assert_eq!(summary.completed.len(), 3);
    assert_eq!(summary.completed[0].as_str(), "t1");
    assert_eq!(log.entries()[0], "t1");

    let t2 = executor.status(&"t2".into()).unwrap();
    assert_eq!(t2.status, TaskStatus::Completed);
    assert_eq!(t2.result.as_deref(), Some("t2"));
    Ok(())
}

#[tokio::test]
async fn single_slot_runs_in_priority_order() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let mut executor = Executor::new(recording_registry(RecordingHandler::new(log.clone())), options(1));
    for (id, priority) in [("e", 5), ("c", 3), ("h", 8), ("a", 1), ("i", 9)] {
        executor.submit(draft(id, priority, &[]))?;
    }

    let summary = with_timeout(executor.run()).await;

    assert_eq!(log.entries(), vec!["a", "c", "e", "h", "i"]);
    assert_eq!(summary.completed, ids(&["a", "c", "e", "h", "i"]));
    Ok(())
}

#[tokio::test]
async fn concurrency_limit_is_respected() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let handler = RecordingHandler::new(log.clone()).with_delay(Duration::from_millis(20));
    let mut executor = Executor::new(recording_registry(handler.clone()), options(3));
    for i in 0..10 {
        executor.submit(draft(&format!("job-{i}"), 0, &[]))?;
    }

    let summary = with_timeout(executor.run()).await;

    assert_eq!(summary.completed.len(), 10);
    assert_eq!(log.len(), 10);
    assert_eq!(handler.max_in_flight(), 3, "slots were not filled up to the limit");
    Ok(())
}

#[tokio::test]
async fn concurrency_of_one_runs_handlers_serially() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let handler = RecordingHandler::new(log.clone()).with_delay(Duration::from_millis(5));
    let mut executor = Executor::new(recording_registry(handler.clone()), options(1));
    for i in 0..5 {
        executor.submit(draft(&format!("job-{i}"), i, &[]))?;
    }

    let summary = with_timeout(executor.run()).await;

    assert_eq!(summary.completed.len(), 5);
    assert_eq!(log.entries(), vec!["job-0", "job-1", "job-2", "job-3", "job-4"]);
    assert_eq!(handler.max_in_flight(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_kind_fails_only_that_task() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let mut executor = Executor::new(recording_registry(RecordingHandler::new(log.clone())), options(2));
    executor.submit(TaskDraft::new("missing", "x".to_string()).with_id("orphan"))?;
    executor.submit(draft("child", 0, &["orphan"]))?;
    executor.submit(draft("fine", 0, &[]))?;

    let summary = with_timeout(executor.run()).await;

    assert_eq!(summary.completed, ids(&["fine"]));
    assert_eq!(
        summary.failed,
        vec![(
            TaskId::from("orphan"),
            TaskError::UnknownHandler("missing".to_string())
        )]
    );
    assert_eq!(summary.still_pending, ids(&["child"]));
    assert_eq!(log.entries(), vec!["fine"]);
    Ok(())
}

#[tokio::test]
async fn handler_error_leaves_dependents_blocked() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let mut registry = recording_registry(RecordingHandler::new(log.clone()));
    registry.register("fail", fail);

    let mut executor = Executor::new(registry, options(2));
    executor.submit(TaskDraft::new("fail", "a".to_string()).with_id("a"))?;
    executor.submit(draft("b", 0, &["a"]))?;
    executor.submit(draft("c", 0, &["b"]))?;

    let summary = with_timeout(executor.run()).await;

    assert!(!summary.is_success());
    let failed: Vec<_> = summary.failed_ids().cloned().collect();
    assert_eq!(failed, ids(&["a"]));

    let a = executor.status(&"a".into()).unwrap();
    assert_eq!(a.error, Some(TaskError::Handler("a went wrong".to_string())));
    assert_eq!(summary.still_pending, ids(&["b", "c"]));
    assert!(log.is_empty());
    Ok(())
}

#[tokio::test]
async fn handler_panic_is_recorded_and_run_continues() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let mut registry = recording_registry(RecordingHandler::new(log.clone()));
    registry.register("explode", explode);

    let mut executor = Executor::new(registry, options(1));
    executor.submit(TaskDraft::new("explode", String::new()).with_id("boom").priority(0))?;
    executor.submit(draft("after", 1, &[]))?;

    let summary = with_timeout(executor.run()).await;

    assert_eq!(summary.completed, ids(&["after"]));
    assert_eq!(
        summary.failed,
        vec![(
            TaskId::from("boom"),
            TaskError::Panicked("handler blew up".to_string())
        )]
    );
    Ok(())
}

#[tokio::test]
async fn cancel_dependents_policy_cancels_downstream() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let mut registry = recording_registry(RecordingHandler::new(log.clone()));
    registry.register("fail", fail);

    let opts = options(2).with_failure_policy(FailurePolicy::CancelDependents);
    let mut executor = Executor::new(registry, opts);
    executor.submit(TaskDraft::new("fail", "a".to_string()).with_id("a"))?;
    executor.submit(draft("b", 0, &["a"]))?;
    executor.submit(draft("c", 0, &["b"]))?;
    executor.submit(draft("d", 0, &[]))?;

    let summary = with_timeout(executor.run()).await;

    assert_eq!(summary.completed, ids(&["d"]));
    assert_eq!(summary.canceled, ids(&["b", "c"]));
    assert!(summary.still_pending.is_empty());
    assert_eq!(executor.status(&"c".into()).unwrap().status, TaskStatus::Canceled);
    Ok(())
}

#[tokio::test]
async fn blocking_handler_result_is_recorded() -> TestResult {
    init_tracing();

    let mut registry: HandlerRegistry<String, String, String> = HandlerRegistry::new();
    registry.register_blocking("len", |payload: String| Ok(payload.len().to_string()));

    let mut executor = Executor::new(registry, options(1));
    let id = executor.submit(TaskDraft::new("len", "hello".to_string()))?;

    let summary = with_timeout(executor.run()).await;

    assert!(summary.is_success());
    assert_eq!(executor.status(&id).unwrap().result.as_deref(), Some("5"));
    Ok(())
}

#[tokio::test]
async fn handle_submits_into_running_executor() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let handler = RecordingHandler::new(log.clone()).with_delay(Duration::from_millis(100));
    let mut executor = Executor::new(recording_registry(handler), options(2));
    executor.submit(draft("slow", 0, &[]))?;
    let handle = executor.handle();

    let (summary, submitted) = with_timeout(async {
        tokio::join!(executor.run(), async {
            handle.submit(draft("late", 0, &["slow"])).await
        })
    })
    .await;

    assert_eq!(submitted?.as_str(), "late");
    assert_eq!(summary.completed, ids(&["slow", "late"]));
    assert_eq!(log.entries(), vec!["slow", "late"]);
    Ok(())
}

#[tokio::test]
async fn handle_controls_queued_tasks() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let handler = RecordingHandler::new(log.clone()).with_delay(Duration::from_millis(100));
    let mut executor = Executor::new(recording_registry(handler), options(1));
    executor.submit(draft("blocker", 0, &[]))?;
    executor.submit(draft("x", 10, &[]))?;
    executor.submit(draft("y", 20, &[]))?;
    let handle = executor.handle();

    let (summary, control) = with_timeout(async {
        tokio::join!(executor.run(), async {
            let running = handle.status("blocker").await?.map(|t| t.status);
            handle.reprioritize("y", 1).await?;
            let canceled = handle.cancel("x").await?;
            let rejected = handle.reprioritize("y", 50).await.is_err();
            Ok::<_, fibdag::errors::FibdagError>((running, canceled, rejected))
        })
    })
    .await;

    let (running, canceled, rejected) = control?;
    assert_eq!(running, Some(TaskStatus::Running));
    assert!(canceled);
    assert!(rejected);

    assert_eq!(log.entries(), vec!["blocker", "y"]);
    assert_eq!(summary.canceled, ids(&["x"]));
    Ok(())
}

#[tokio::test]
async fn shutdown_cancels_everything_not_started() -> TestResult {
    init_tracing();

    let log = CallLog::new();
    let handler = RecordingHandler::new(log.clone()).with_delay(Duration::from_millis(100));
    let mut executor = Executor::new(recording_registry(handler), options(1));
    executor.submit(draft("a", 0, &[]))?;
    executor.submit(draft("b", 1, &[]))?;
    executor.submit(draft("c", 2, &["a"]))?;
    let handle = executor.handle();

    let (summary, canceled) = with_timeout(async {
        tokio::join!(executor.run(), handle.shutdown())
    })
    .await;

    let mut canceled = canceled?;
    canceled.sort();
    assert_eq!(canceled, ids(&["b", "c"]));
    assert_eq!(summary.completed, ids(&["a"]));
    assert_eq!(log.entries(), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn handle_fails_once_executor_is_dropped() {
    let executor: Executor<String, String, String> =
        Executor::new(recording_registry(RecordingHandler::new(CallLog::new())), options(1));
    let handle = executor.handle();
    drop(executor);

    assert!(handle.submit(draft("late", 0, &[])).await.is_err());
    assert!(handle.shutdown().await.is_err());
}

#[tokio::test]
async fn empty_executor_returns_immediately() {
    let mut executor: Executor<String, String, String> =
        Executor::new(HandlerRegistry::new(), options(4));
    let summary = with_timeout(executor.run()).await;
    assert!(summary.is_success());
    assert!(summary.completed.is_empty());
}
