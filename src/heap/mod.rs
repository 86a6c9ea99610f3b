// src/heap/mod.rs

//! Mergeable priority queue used by the scheduler.
//!
//! - [`fibonacci`] holds the Fibonacci heap operations (insert, extract-min,
//!   decrease-key with cascading cuts, delete, merge).
//! - [`arena`] is the generational slot arena the node graph lives in; links
//!   are indices rather than pointers.
//! - [`invariants`] provides a full structural audit used by tests.
//!
//! The heap knows nothing about tasks.

pub mod arena;
pub mod fibonacci;
pub mod invariants;
mod node;

pub use arena::NodeHandle;
pub use fibonacci::{FibHeap, MergedHandles};
