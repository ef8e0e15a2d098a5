//! Hierarchy mutations.
//!
//! Every operation validates the ids it references before touching the
//! tree and bumps `last_updated` only when a change actually lands.
//! Updates are field-tolerant: unknown or uncoercible patch fields are
//! skipped one by one instead of failing the whole call.

use serde_json::{json, Value};

use crate::entities::{Project, SubProject, Task, TaskStatus, WorkPackage};
use crate::errors::{TallyError, TallyResult};
use crate::resolver::runtime_blocked_ids;
use crate::scoring::score_task;

impl Project {
    pub fn add_sub_project(&mut self, sub_project: SubProject) {
        self.sub_projects.push(sub_project);
        self.touch();
    }

    pub fn add_work_package(
        &mut self,
        sub_project_id: &str,
        work_package: WorkPackage,
    ) -> TallyResult<()> {
        let sub = self.sub_project_mut(sub_project_id).ok_or_else(|| {
            TallyError::SubProjectNotFound {
                sub_project_id: sub_project_id.to_string(),
            }
        })?;
        sub.work_packages.push(work_package);
        self.touch();
        Ok(())
    }

    pub fn add_task(
        &mut self,
        sub_project_id: &str,
        work_package_id: &str,
        task: Task,
    ) -> TallyResult<()> {
        let sub = self.sub_project_mut(sub_project_id).ok_or_else(|| {
            TallyError::SubProjectNotFound {
                sub_project_id: sub_project_id.to_string(),
            }
        })?;
        let wp = sub.work_package_mut(work_package_id).ok_or_else(|| {
            TallyError::WorkPackageNotFound {
                work_package_id: work_package_id.to_string(),
            }
        })?;
        wp.tasks.push(task);
        self.touch();
        Ok(())
    }

    /// Apply a partial update to a task.
    ///
    /// Accepted fields: `text`, `status`, `estimated_cost`,
    /// `actual_cost`, `importance`, `budget_priority`, and `blocks`
    /// (or its legacy spelling `blocking`). Anything else is ignored.
    pub fn update_task(&mut self, task_id: &str, patch: &Value) -> TallyResult<()> {
        let task = self
            .task_mut(task_id)
            .ok_or_else(|| TallyError::TaskNotFound {
                task_id: task_id.to_string(),
            })?;
        apply_task_patch(task, patch);
        self.touch();
        Ok(())
    }

    /// Apply a partial update to a work package (`name`, `importance`).
    pub fn update_work_package(&mut self, work_package_id: &str, patch: &Value) -> TallyResult<()> {
        let wp = self
            .sub_projects
            .iter_mut()
            .flat_map(|sp| &mut sp.work_packages)
            .find(|wp| wp.id == work_package_id)
            .ok_or_else(|| TallyError::WorkPackageNotFound {
                work_package_id: work_package_id.to_string(),
            })?;
        apply_work_package_patch(wp, patch);
        self.touch();
        Ok(())
    }

    /// Apply a partial update to a sub-project (`name`, `priority`).
    pub fn update_sub_project(&mut self, sub_project_id: &str, patch: &Value) -> TallyResult<()> {
        let sub = self.sub_project_mut(sub_project_id).ok_or_else(|| {
            TallyError::SubProjectNotFound {
                sub_project_id: sub_project_id.to_string(),
            }
        })?;
        apply_sub_project_patch(sub, patch);
        self.touch();
        Ok(())
    }

    /// Mark a task complete. Its `blocks` edges stop holding anything
    /// up on the next resolution pass.
    pub fn complete_task(&mut self, task_id: &str) -> TallyResult<()> {
        self.update_task(task_id, &json!({ "status": "complete" }))
    }

    pub fn delete_task(&mut self, task_id: &str) -> TallyResult<()> {
        let mut deleted = false;
        'outer: for sub in &mut self.sub_projects {
            for wp in &mut sub.work_packages {
                let before = wp.tasks.len();
                wp.tasks.retain(|t| t.id != task_id);
                if wp.tasks.len() < before {
                    deleted = true;
                    break 'outer;
                }
            }
        }
        if deleted {
            self.touch();
            Ok(())
        } else {
            Err(TallyError::TaskNotFound {
                task_id: task_id.to_string(),
            })
        }
    }

    /// Delete a work package and every task inside it.
    pub fn delete_work_package(&mut self, work_package_id: &str) -> TallyResult<()> {
        let mut deleted = false;
        for sub in &mut self.sub_projects {
            let before = sub.work_packages.len();
            sub.work_packages.retain(|wp| wp.id != work_package_id);
            if sub.work_packages.len() < before {
                deleted = true;
                break;
            }
        }
        if deleted {
            self.touch();
            Ok(())
        } else {
            Err(TallyError::WorkPackageNotFound {
                work_package_id: work_package_id.to_string(),
            })
        }
    }

    /// Delete a sub-project and its whole subtree.
    pub fn delete_sub_project(&mut self, sub_project_id: &str) -> TallyResult<()> {
        let before = self.sub_projects.len();
        self.sub_projects.retain(|sp| sp.id != sub_project_id);
        if self.sub_projects.len() < before {
            self.touch();
            Ok(())
        } else {
            Err(TallyError::SubProjectNotFound {
                sub_project_id: sub_project_id.to_string(),
            })
        }
    }

    /// Move a task to another work package, appending at its end.
    ///
    /// Both ends are resolved before anything is removed, so a bad id
    /// on either side leaves the tree untouched.
    pub fn move_task(&mut self, task_id: &str, new_work_package_id: &str) -> TallyResult<()> {
        let dest = self.locate_work_package(new_work_package_id).ok_or_else(|| {
            TallyError::WorkPackageNotFound {
                work_package_id: new_work_package_id.to_string(),
            }
        })?;
        let (sub_idx, wp_idx, task_idx) =
            self.locate_task(task_id)
                .ok_or_else(|| TallyError::TaskNotFound {
                    task_id: task_id.to_string(),
                })?;

        let task = self.sub_projects[sub_idx].work_packages[wp_idx]
            .tasks
            .remove(task_idx);
        self.sub_projects[dest.0].work_packages[dest.1]
            .tasks
            .push(task);
        self.touch();
        Ok(())
    }

    /// Record that `blocker_id` holds up `blocked_id`. Both tasks must
    /// exist; the edge is stored once no matter how often it is added.
    pub fn add_dependency(&mut self, blocker_id: &str, blocked_id: &str) -> TallyResult<()> {
        if self.task(blocked_id).is_none() {
            return Err(TallyError::TaskNotFound {
                task_id: blocked_id.to_string(),
            });
        }
        let blocker = self
            .task_mut(blocker_id)
            .ok_or_else(|| TallyError::TaskNotFound {
                task_id: blocker_id.to_string(),
            })?;
        if !blocker.blocks.iter().any(|id| id == blocked_id) {
            blocker.blocks.push(blocked_id.to_string());
        }
        self.touch();
        Ok(())
    }

    /// Drop the edge from `blocker_id` to `blocked_id`. The target may
    /// be long gone; only the blocker has to exist.
    pub fn remove_dependency(&mut self, blocker_id: &str, blocked_id: &str) -> TallyResult<()> {
        let blocker = self
            .task_mut(blocker_id)
            .ok_or_else(|| TallyError::TaskNotFound {
                task_id: blocker_id.to_string(),
            })?;
        blocker.blocks.retain(|id| id != blocked_id);
        self.touch();
        Ok(())
    }

    /// Reorder every work package's task list in place by combined
    /// score, highest first, using the current blocking overlay.
    pub fn sort_tasks_by_priority(&mut self) {
        let blocked_ids = runtime_blocked_ids(self);
        for sub in &mut self.sub_projects {
            let priority = sub.priority;
            for wp in &mut sub.work_packages {
                let importance = wp.importance;
                wp.tasks.sort_by(|a, b| {
                    let a_score =
                        score_task(priority, importance, a, blocked_ids.contains(&a.id)).combined;
                    let b_score =
                        score_task(priority, importance, b, blocked_ids.contains(&b.id)).combined;
                    b_score.total_cmp(&a_score)
                });
            }
        }
        self.touch();
    }

    fn locate_work_package(&self, work_package_id: &str) -> Option<(usize, usize)> {
        self.sub_projects.iter().enumerate().find_map(|(si, sub)| {
            sub.work_packages
                .iter()
                .position(|wp| wp.id == work_package_id)
                .map(|wi| (si, wi))
        })
    }

    fn locate_task(&self, task_id: &str) -> Option<(usize, usize, usize)> {
        self.sub_projects.iter().enumerate().find_map(|(si, sub)| {
            sub.work_packages.iter().enumerate().find_map(|(wi, wp)| {
                wp.tasks
                    .iter()
                    .position(|t| t.id == task_id)
                    .map(|ti| (si, wi, ti))
            })
        })
    }
}

fn apply_task_patch(task: &mut Task, patch: &Value) {
    let Some(fields) = patch.as_object() else {
        tracing::debug!("Task patch is not an object, ignoring");
        return;
    };
    for (field, value) in fields {
        match field.as_str() {
            "text" => match value.as_str() {
                Some(text) => task.text = text.to_string(),
                None => skip_field("task", field),
            },
            "status" => match status_from_value(value) {
                Some(status) => task.status = status,
                None => skip_field("task", field),
            },
            "estimated_cost" => match cost_from_value(value) {
                Some(cost) => task.estimated_cost = cost,
                None => skip_field("task", field),
            },
            "actual_cost" => match cost_from_value(value) {
                Some(cost) => task.actual_cost = cost,
                None => skip_field("task", field),
            },
            "importance" => match optional_weight_from_value(value) {
                Some(weight) => task.importance = weight,
                None => skip_field("task", field),
            },
            "budget_priority" => match optional_weight_from_value(value) {
                Some(weight) => task.budget_priority = weight,
                None => skip_field("task", field),
            },
            "blocks" | "blocking" => match blocks_from_value(value) {
                Some(blocks) => task.blocks = blocks,
                None => skip_field("task", field),
            },
            _ => skip_field("task", field),
        }
    }
}

fn apply_work_package_patch(wp: &mut WorkPackage, patch: &Value) {
    let Some(fields) = patch.as_object() else {
        tracing::debug!("Work package patch is not an object, ignoring");
        return;
    };
    for (field, value) in fields {
        match field.as_str() {
            "name" => match value.as_str() {
                Some(name) => wp.name = name.to_string(),
                None => skip_field("work package", field),
            },
            "importance" => match weight_from_value(value) {
                Some(weight) => wp.importance = weight,
                None => skip_field("work package", field),
            },
            _ => skip_field("work package", field),
        }
    }
}

fn apply_sub_project_patch(sub: &mut SubProject, patch: &Value) {
    let Some(fields) = patch.as_object() else {
        tracing::debug!("Sub-project patch is not an object, ignoring");
        return;
    };
    for (field, value) in fields {
        match field.as_str() {
            "name" => match value.as_str() {
                Some(name) => sub.name = name.to_string(),
                None => skip_field("sub-project", field),
            },
            "priority" => match weight_from_value(value) {
                Some(weight) => sub.priority = weight,
                None => skip_field("sub-project", field),
            },
            _ => skip_field("sub-project", field),
        }
    }
}

fn skip_field(entity: &str, field: &str) {
    tracing::debug!("Skipping unsupported {} patch field '{}'", entity, field);
}

/// Status strings parse through the usual aliases; anything else is
/// uncoercible.
fn status_from_value(value: &Value) -> Option<TaskStatus> {
    value.as_str().and_then(|s| s.parse::<TaskStatus>().ok())
}

fn cost_from_value(value: &Value) -> Option<f64> {
    value.as_f64().filter(|cost| *cost >= 0.0)
}

/// A 1-10 weight.
fn weight_from_value(value: &Value) -> Option<u8> {
    value
        .as_u64()
        .filter(|w| (1..=10).contains(w))
        .and_then(|w| u8::try_from(w).ok())
}

/// A 1-10 weight where JSON `null` explicitly clears the field.
/// Outer None means uncoercible, inner None means cleared.
#[allow(clippy::option_option)]
fn optional_weight_from_value(value: &Value) -> Option<Option<u8>> {
    if value.is_null() {
        return Some(None);
    }
    weight_from_value(value).map(Some)
}

fn blocks_from_value(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let mut blocks: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let id = item.as_str()?;
        if !blocks.iter().any(|b| b == id) {
            blocks.push(id.to_string());
        }
    }
    Some(blocks)
}
