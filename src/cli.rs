// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_plan_path;
use crate::types::FailurePolicy;

/// Command-line arguments for `fibdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fibdag",
    version,
    about = "Run a TOML plan of dependent tasks in priority order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the plan file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_plan_path())]
    pub plan: PathBuf,

    /// Maximum number of tasks running at once. Overrides `[executor].concurrency`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: Option<u32>,

    /// What happens to dependents of a failed task: `leave-blocked` or
    /// `cancel-dependents`. Overrides `[executor].failure_policy`.
    #[arg(long, value_name = "POLICY")]
    pub failure_policy: Option<FailurePolicy>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FIBDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the plan and print the execution order without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_parse() {
        let args = CliArgs::try_parse_from([
            "fibdag",
            "--plan",
            "plans/ci.toml",
            "--concurrency",
            "2",
            "--failure-policy",
            "cancel-dependents",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.plan, PathBuf::from("plans/ci.toml"));
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.failure_policy, Some(FailurePolicy::CancelDependents));
        assert!(args.dry_run);
    }

    #[test]
    fn plan_defaults_to_fibdag_toml() {
        let args = CliArgs::try_parse_from(["fibdag"]).unwrap();
        assert_eq!(args.plan, default_plan_path());
        assert_eq!(args.plan, PathBuf::from("Fibdag.toml"));
        assert!(args.concurrency.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(CliArgs::try_parse_from(["fibdag", "--concurrency", "0"]).is_err());
    }
}
