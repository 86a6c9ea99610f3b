// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Read and deserialize a plan file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let plan: RawPlanFile = toml::from_str(&contents)?;
    Ok(plan)
}

/// Load a plan file and check it:
///
/// - at least one task,
/// - `[executor].concurrency >= 1`,
/// - every `after` entry names a task in the plan and is not the task itself,
/// - no dependency cycles.
///
/// Handler kinds are not checked here; a task with an unknown kind fails
/// when it is dispatched.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let raw = load_from_path(&path)?;
    PlanFile::try_from(raw)
}

/// `Fibdag.toml` in the current directory.
pub fn default_plan_path() -> PathBuf {
    PathBuf::from("Fibdag.toml")
}
