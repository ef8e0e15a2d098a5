//! Read-time resolution of `blocks` dependency edges.
//!
//! Blocking is an overlay derived fresh on every call, never persisted.
//! Stored statuses stay untouched, so completing a blocker lifts the
//! block on the next resolution pass without any write.

use std::collections::{HashMap, HashSet};

use crate::entities::{Project, Task, TaskStatus};

/// Ids of tasks currently held up by another task's `blocks` list.
///
/// A task lands in the set when at least one incomplete task lists it
/// and the task itself is not complete. Resolution is a single hop:
/// edges of a task that is only blocked at runtime still count, but no
/// transitive walk happens beyond that. Self-references and ids that
/// match no task are ignored.
pub fn runtime_blocked_ids(project: &Project) -> HashSet<String> {
    let lookup: HashMap<&str, &Task> = project.tasks().map(|t| (t.id.as_str(), t)).collect();

    let mut blocked = HashSet::new();
    for task in project.tasks() {
        if task.status == TaskStatus::Complete {
            continue;
        }
        for target in &task.blocks {
            if *target == task.id {
                continue;
            }
            if let Some(hit) = lookup.get(target.as_str()) {
                if hit.status != TaskStatus::Complete {
                    blocked.insert(target.clone());
                }
            }
        }
    }
    blocked
}

/// Status a task presents to readers: `Blocked` when either the stored
/// status says so or the resolver flagged the id, otherwise the stored
/// status.
pub fn effective_status(task: &Task, blocked_ids: &HashSet<String>) -> TaskStatus {
    if task.status == TaskStatus::Blocked || blocked_ids.contains(&task.id) {
        TaskStatus::Blocked
    } else {
        task.status
    }
}
