// src/config/mod.rs

//! Task plan files for the `fibdag` binary.
//!
//! - [`model`] defines the TOML-backed data model.
//! - [`loader`] reads a plan from disk.
//! - [`validate`] checks references and acyclicity.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_plan_path, load_and_validate, load_from_path};
pub use model::{ExecutorSection, PlanFile, RawPlanFile, TaskSpec};
pub use validate::validate_plan;
