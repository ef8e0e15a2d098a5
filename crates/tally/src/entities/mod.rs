//! Core data structures for the project hierarchy.

mod hierarchy;
mod task;

pub use hierarchy::{Project, SubProject, TaskContext, WorkPackage};
pub use task::{Task, TaskStatus};

use uuid::Uuid;

/// Generate a short prefixed id, e.g. `T-9f3c21ab`.
pub(crate) fn new_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &hex[..8])
}
