#![allow(dead_code)]

pub use fibdag_test_utils::builders;
pub use fibdag_test_utils::recording::{CallLog, RecordingHandler};
pub use fibdag_test_utils::{init_tracing, with_timeout};

use fibdag::dag::TaskDraft;
use fibdag::exec::HandlerRegistry;
use fibdag::types::Priority;

/// Kind served by the recording handler in [`recording_registry`].
pub const RECORD: &str = "record";

/// A draft whose payload is its own id, so a [`RecordingHandler`] logs ids
/// in start order.
pub fn draft(id: &str, priority: Priority, deps: &[&str]) -> TaskDraft<String> {
    TaskDraft::new(RECORD, id.to_string())
        .with_id(id)
        .priority(priority)
        .after_all(deps.iter().copied())
}

pub fn recording_registry(handler: RecordingHandler) -> HandlerRegistry<String, String, String> {
    let mut registry = HandlerRegistry::new();
    registry.register_handler(RECORD, handler);
    registry
}
