// src/lib.rs

//! Dependency-aware task scheduling on a Fibonacci-heap ready queue.
//!
//! - [`heap`]: the Fibonacci heap.
//! - [`dag`]: task graph and scheduler.
//! - [`exec`] and [`engine`]: async execution with a bounded number of
//!   workers.
//! - [`config`], [`cli`], [`logging`]: the `fibdag` binary's plan files and
//!   ambient setup.

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod heap;
pub mod logging;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{PlanFile, load_and_validate};
use crate::engine::{Executor, ExecutorOptions, RunSummary};
use crate::exec::builtin_registry;

/// High-level entry point used by `main.rs`.
///
/// Loads the plan, applies CLI overrides, runs every task with the built-in
/// handlers and prints the summary. Fails if any task did not complete.
pub async fn run(args: CliArgs) -> Result<()> {
    let plan = load_and_validate(&args.plan)
        .with_context(|| format!("loading plan '{}'", args.plan.display()))?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let mut options = plan.executor_options();
    if let Some(n) = args.concurrency {
        options.concurrency = n as usize;
    }
    if let Some(policy) = args.failure_policy {
        options.failure_policy = policy;
    }

    let summary = execute_plan(&plan, options).await?;
    println!("{summary}");

    if !summary.is_success() {
        anyhow::bail!(
            "{} task(s) failed, {} canceled, {} blocked",
            summary.failed.len(),
            summary.canceled.len(),
            summary.still_pending.len()
        );
    }
    Ok(())
}

/// Submit every task in `plan` and run them to completion with the built-in
/// handlers.
///
/// Ctrl-C cancels every task that has not started; running tasks finish.
pub async fn execute_plan(
    plan: &PlanFile,
    options: ExecutorOptions,
) -> errors::Result<RunSummary<String>> {
    let mut executor = Executor::new(builtin_registry(), options);
    for draft in plan.drafts() {
        executor.submit(draft)?;
    }
    info!(tasks = plan.tasks().len(), ?options, "plan submitted");

    let handle = executor.handle();
    let ctrl_c = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        warn!("Ctrl+C received; canceling tasks that have not started");
        if let Err(e) = handle.shutdown().await {
            debug!(error = %e, "shutdown request not delivered");
        }
    });

    let summary = executor.run().await;
    ctrl_c.abort();
    Ok(summary)
}

fn print_dry_run(plan: &PlanFile) {
    println!("fibdag dry-run");
    println!("  executor.concurrency = {}", plan.executor().concurrency);
    println!("  executor.failure_policy = {:?}", plan.executor().failure_policy);
    println!();

    let order = plan.execution_order();
    println!("tasks ({}), in dependency order:", order.len());
    for id in &order {
        let Some(task) = plan.tasks().get(id) else {
            continue;
        };
        println!("  - {id}");
        println!("      kind: {}", task.kind);
        if !task.payload.is_empty() {
            println!("      payload: {}", task.payload);
        }
        if task.priority != 0 {
            println!("      priority: {}", task.priority);
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    debug!("dry-run complete (no execution)");
}
