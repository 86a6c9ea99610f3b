// tests/plan_config.rs

mod common;
use crate::common::builders::{PlanFileBuilder, TaskSpecBuilder};

use std::io::Write;

use tempfile::NamedTempFile;

use fibdag::config::{load_and_validate, validate_plan};
use fibdag::errors::FibdagError;
use fibdag::types::{FailurePolicy, TaskId};

#[test]
fn test_dag_cycle_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
kind = "echo"
after = ["B"]

[task.B]
kind = "echo"
after = ["A"]
"#
    )
    .unwrap();

    let result = load_and_validate(file.path());

    match result {
        Err(FibdagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
kind = "shell"
payload = "true"
after = ["NonExistent"]
"#
    )
    .unwrap();

    let result = load_and_validate(file.path());

    match result {
        Err(FibdagError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_plan_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[executor]\nconcurrency = 2\n").unwrap();

    match load_and_validate(file.path()) {
        Err(FibdagError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[task.A\nkind = ").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(FibdagError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(FibdagError::IoError(_))));
}

#[test]
fn test_full_plan_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = fibdag_test_utils::write_plan(
        dir.path(),
        r#"
[executor]
concurrency = 2
failure_policy = "cancel_dependents"

[task.fetch]
kind = "shell"
payload = "echo fetched"
priority = 5

[task.build]
kind = "shell"
payload = "echo built"
after = ["fetch"]
"#,
    )
    .unwrap();

    let plan = load_and_validate(&path).unwrap();
    let options = plan.executor_options();
    assert_eq!(options.concurrency, 2);
    assert_eq!(options.failure_policy, FailurePolicy::CancelDependents);

    let drafts = plan.drafts();
    assert_eq!(drafts.len(), 2);
    let build = drafts.iter().find(|d| d.kind == "shell" && d.payload == "echo built").unwrap();
    assert_eq!(build.dependencies, vec![TaskId::from("fetch")]);
    assert_eq!(plan.execution_order(), vec!["fetch", "build"]);
}

#[test]
fn test_unknown_failure_policy_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[executor]
failure_policy = "retry_forever"

[task.A]
kind = "echo"
"#
    )
    .unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(FibdagError::TomlError(_))
    ));
}

#[test]
fn test_builder_plans_validate_like_files() {
    let raw = PlanFileBuilder::new()
        .with_task("a", TaskSpecBuilder::echo("a").after("b").build())
        .with_task("b", TaskSpecBuilder::echo("b").after("a").build())
        .build_raw();
    assert!(matches!(validate_plan(raw), Err(FibdagError::DagCycle(_))));

    let plan = PlanFileBuilder::new()
        .with_concurrency(1)
        .with_task("a", TaskSpecBuilder::echo("a").priority(-1).build())
        .build();
    assert_eq!(plan.executor().concurrency, 1);
    assert_eq!(plan.tasks()["a"].priority, -1);
}
