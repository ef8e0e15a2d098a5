//! Velocity scoring and the priority views built from it.
//!
//! Scores are recomputed from the hierarchy on every call. Nothing in
//! this module mutates the project, and stored statuses are only read
//! through the resolver overlay.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{Project, Task, TaskStatus};
use crate::resolver::{effective_status, runtime_blocked_ids};

/// Score pinned to zero-cost tasks that unblock others or carry
/// maximum importance.
pub const QUICK_WIN_SCORE: f64 = 9999.0;

/// Baseline for zero-cost software or admin tasks with no downtime
/// weight.
pub const SOFTWARE_BASELINE_SCORE: f64 = 500.0;

/// Combined scores at or above this keep their velocity unchanged, so
/// the quick-win ceiling stays on top of every view.
const QUICK_WIN_FLOOR: f64 = 9000.0;

/// Money value treated as "free" after float noise.
const ZERO_COST_EPSILON: f64 = 0.01;

/// Factor applied to the downtime weight in the combined score.
const DOWNTIME_MULTIPLIER: f64 = 10.0;

/// Bonus per outgoing `blocks` edge.
const BLOCKER_BONUS: f64 = 50.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Velocity score for one task under its ancestors' weights.
///
/// `runtime_blocked` carries the resolver's verdict for this task;
/// blocked tasks score 0.0 and never hit the zero-cost shortcuts.
pub fn velocity_score(
    sub_project_priority: u8,
    work_package_importance: u8,
    task: &Task,
    runtime_blocked: bool,
) -> f64 {
    let blocked = runtime_blocked || task.status == TaskStatus::Blocked;

    if task.estimated_cost <= ZERO_COST_EPSILON && !blocked {
        let importance = task.importance.unwrap_or(0);
        if importance > 0 && (!task.blocks.is_empty() || importance >= 10) {
            return QUICK_WIN_SCORE;
        }
        if task.budget_priority.is_none() {
            return SOFTWARE_BASELINE_SCORE;
        }
    }

    if blocked {
        return 0.0;
    }

    let cost_factor = task.estimated_cost.max(1.0);
    let strategic = f64::from(sub_project_priority) * f64::from(work_package_importance);
    let technical = f64::from(task.importance.unwrap_or(5)) * 1.5
        + f64::from(task.budget_priority.unwrap_or(5));
    let blocker_bonus = BLOCKER_BONUS * task.blocks.len() as f64;

    round2((technical / cost_factor) * strategic + blocker_bonus)
}

/// Combined score: velocity plus the downtime tiebreaker.
///
/// Quick wins pass through untouched. Blocked tasks contribute no
/// downtime, so they stay at 0.0.
pub fn combined_score(velocity: f64, task: &Task, runtime_blocked: bool) -> f64 {
    if velocity >= QUICK_WIN_FLOOR {
        return velocity;
    }
    let blocked = runtime_blocked || task.status == TaskStatus::Blocked;
    let downtime = if blocked {
        0
    } else {
        task.budget_priority.unwrap_or(0)
    };
    round2(velocity + f64::from(downtime) * DOWNTIME_MULTIPLIER)
}

/// Velocity and combined score computed together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaskScores {
    pub velocity: f64,
    pub combined: f64,
}

pub fn score_task(
    sub_project_priority: u8,
    work_package_importance: u8,
    task: &Task,
    runtime_blocked: bool,
) -> TaskScores {
    let velocity = velocity_score(
        sub_project_priority,
        work_package_importance,
        task,
        runtime_blocked,
    );
    let combined = combined_score(velocity, task, runtime_blocked);
    TaskScores { velocity, combined }
}

/// One row of the flattened priority view.
#[derive(Debug, Clone, Serialize)]
pub struct PrioritizedTask {
    pub task_id: String,
    pub text: String,
    /// Resolver-aware status; runtime-blocked tasks report `Blocked`.
    pub status: TaskStatus,
    /// Status as persisted, before the blocking overlay.
    pub stored_status: TaskStatus,
    pub estimated_cost: f64,
    pub velocity: f64,
    pub combined: f64,
    pub downtime_weight: Option<u8>,
    pub runtime_blocked: bool,
    pub sub_project_id: String,
    pub sub_project: String,
    pub work_package_id: String,
    pub work_package: String,
}

/// Flatten every task into rows sorted by combined score, highest
/// first. Complete tasks are skipped unless `include_completed` is
/// set. The sort is stable, so equal scores keep hierarchy order.
pub fn prioritized_tasks(project: &Project, include_completed: bool) -> Vec<PrioritizedTask> {
    let blocked_ids = runtime_blocked_ids(project);

    let mut rows: Vec<PrioritizedTask> = Vec::new();
    for ctx in project.task_contexts() {
        let task = ctx.task;
        if !include_completed && task.status == TaskStatus::Complete {
            continue;
        }
        let runtime_blocked = blocked_ids.contains(&task.id);
        let scores = score_task(
            ctx.sub_project.priority,
            ctx.work_package.importance,
            task,
            runtime_blocked,
        );
        rows.push(PrioritizedTask {
            task_id: task.id.clone(),
            text: task.text.clone(),
            status: effective_status(task, &blocked_ids),
            stored_status: task.status,
            estimated_cost: task.estimated_cost,
            velocity: scores.velocity,
            combined: scores.combined,
            downtime_weight: task.budget_priority,
            runtime_blocked,
            sub_project_id: ctx.sub_project.id.clone(),
            sub_project: ctx.sub_project.name.clone(),
            work_package_id: ctx.work_package.id.clone(),
            work_package: ctx.work_package.name.clone(),
        });
    }

    rows.sort_by(|a, b| b.combined.total_cmp(&a.combined));
    rows
}

/// Task entry in a [`ProjectSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotTask {
    pub task_id: String,
    pub text: String,
    pub complete: bool,
    /// Resolver-aware status.
    pub status: TaskStatus,
    pub estimated_cost: f64,
    pub actual_cost: f64,
    pub combined: f64,
}

/// Work package entry in a [`ProjectSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotWorkPackage {
    pub work_package_id: String,
    pub name: String,
    pub importance: u8,
    pub tasks: Vec<SnapshotTask>,
}

/// Sub-project entry in a [`ProjectSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSubProject {
    pub sub_project_id: String,
    pub name: String,
    pub priority: u8,
    pub work_packages: Vec<SnapshotWorkPackage>,
}

/// Grouped, priority-ordered rendering of the whole hierarchy, the
/// shape document renderers consume.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSnapshot {
    pub name: String,
    pub last_updated: DateTime<Utc>,
    pub sub_projects: Vec<SnapshotSubProject>,
}

/// Build the grouped view: sub-projects by priority, work packages by
/// importance, tasks by combined score, each descending and stable.
/// Complete tasks stay in, flagged for checkbox rendering.
pub fn project_snapshot(project: &Project) -> ProjectSnapshot {
    let blocked_ids = runtime_blocked_ids(project);

    let mut sub_projects: Vec<SnapshotSubProject> = project
        .sub_projects
        .iter()
        .map(|sub| {
            let mut work_packages: Vec<SnapshotWorkPackage> = sub
                .work_packages
                .iter()
                .map(|wp| {
                    let mut tasks: Vec<SnapshotTask> = wp
                        .tasks
                        .iter()
                        .map(|task| {
                            let runtime_blocked = blocked_ids.contains(&task.id);
                            let scores =
                                score_task(sub.priority, wp.importance, task, runtime_blocked);
                            SnapshotTask {
                                task_id: task.id.clone(),
                                text: task.text.clone(),
                                complete: task.is_complete(),
                                status: effective_status(task, &blocked_ids),
                                estimated_cost: task.estimated_cost,
                                actual_cost: task.actual_cost,
                                combined: scores.combined,
                            }
                        })
                        .collect();
                    tasks.sort_by(|a, b| b.combined.total_cmp(&a.combined));
                    SnapshotWorkPackage {
                        work_package_id: wp.id.clone(),
                        name: wp.name.clone(),
                        importance: wp.importance,
                        tasks,
                    }
                })
                .collect();
            work_packages.sort_by(|a, b| b.importance.cmp(&a.importance));
            SnapshotSubProject {
                sub_project_id: sub.id.clone(),
                name: sub.name.clone(),
                priority: sub.priority,
                work_packages,
            }
        })
        .collect();
    sub_projects.sort_by(|a, b| b.priority.cmp(&a.priority));

    ProjectSnapshot {
        name: project.name.clone(),
        last_updated: project.last_updated,
        sub_projects,
    }
}

/// Resolver-aware status for every task keyed by id, for callers that
/// already hold the hierarchy and only need the overlay applied.
pub fn effective_statuses(project: &Project) -> Vec<(String, TaskStatus)> {
    let blocked_ids = runtime_blocked_ids(project);
    project
        .tasks()
        .map(|task| (task.id.clone(), effective_status(task, &blocked_ids)))
        .collect()
}
