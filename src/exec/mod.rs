// src/exec/mod.rs

//! Handler execution layer.
//!
//! - [`registry`] maps task kinds to handlers.
//! - [`task_runner`] runs one handler on a worker and reports the outcome to
//!   the executor loop.
//! - [`builtin`] provides the `shell`, `echo` and `sleep` handlers used by
//!   plan files.

pub mod builtin;
pub mod registry;
pub mod task_runner;

pub use builtin::builtin_registry;
pub use registry::{HandlerFuture, HandlerRegistry, TaskHandler};
