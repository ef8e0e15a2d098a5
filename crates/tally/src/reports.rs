//! Budget and progress rollups.

use serde::Serialize;

use crate::entities::{Project, TaskStatus};

/// Status groups in the order the shopping report lists them. Blocked
/// purchases surface first since they are what the money unsticks.
const SHOPPING_GROUP_ORDER: [TaskStatus; 4] = [
    TaskStatus::Blocked,
    TaskStatus::InProgress,
    TaskStatus::Backlog,
    TaskStatus::Pending,
];

/// One purchasable line item.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingItem {
    pub task_id: String,
    pub text: String,
    pub estimated_cost: f64,
    pub sub_project: String,
    pub work_package: String,
}

/// Items sharing a stored status, with their cost subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingGroup {
    pub status: TaskStatus,
    pub items: Vec<ShoppingItem>,
    pub subtotal: f64,
}

/// Every incomplete task with its estimated cost, grouped by stored
/// status. Groups with no tasks are omitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShoppingReport {
    pub groups: Vec<ShoppingGroup>,
    pub grand_total: f64,
}

/// Build the shopping report from stored statuses. The blocking
/// overlay is deliberately not applied here: a runtime-blocked part
/// still needs buying, under the status the owner gave it.
pub fn shopping_report(project: &Project) -> ShoppingReport {
    let mut report = ShoppingReport::default();
    for status in SHOPPING_GROUP_ORDER {
        let mut items = Vec::new();
        let mut subtotal = 0.0;
        for ctx in project.task_contexts() {
            if ctx.task.status != status {
                continue;
            }
            subtotal += ctx.task.estimated_cost;
            items.push(ShoppingItem {
                task_id: ctx.task.id.clone(),
                text: ctx.task.text.clone(),
                estimated_cost: ctx.task.estimated_cost,
                sub_project: ctx.sub_project.name.clone(),
                work_package: ctx.work_package.name.clone(),
            });
        }
        if items.is_empty() {
            continue;
        }
        report.grand_total += subtotal;
        report.groups.push(ShoppingGroup {
            status,
            items,
            subtotal,
        });
    }
    report
}

/// Completion rollup for one sub-project.
#[derive(Debug, Clone, Serialize)]
pub struct SubProjectProgress {
    pub sub_project_id: String,
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Whole percent, truncated; 0 when the sub-project has no tasks.
    pub percent_complete: u8,
}

/// Completion rollup for the whole project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectProgress {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub percent_complete: u8,
    pub sub_projects: Vec<SubProjectProgress>,
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        u8::try_from(completed * 100 / total).unwrap_or(100)
    }
}

pub fn progress_by_sub_project(project: &Project) -> Vec<SubProjectProgress> {
    project
        .sub_projects
        .iter()
        .map(|sub| {
            let mut total = 0;
            let mut completed = 0;
            for wp in &sub.work_packages {
                total += wp.tasks.len();
                completed += wp.tasks.iter().filter(|t| t.is_complete()).count();
            }
            SubProjectProgress {
                sub_project_id: sub.id.clone(),
                name: sub.name.clone(),
                total_tasks: total,
                completed_tasks: completed,
                percent_complete: percent(completed, total),
            }
        })
        .collect()
}

pub fn project_progress(project: &Project) -> ProjectProgress {
    let sub_projects = progress_by_sub_project(project);
    let total_tasks = sub_projects.iter().map(|s| s.total_tasks).sum();
    let completed_tasks = sub_projects.iter().map(|s| s.completed_tasks).sum();
    ProjectProgress {
        total_tasks,
        completed_tasks,
        percent_complete: percent(completed_tasks, total_tasks),
        sub_projects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{SubProject, Task, WorkPackage};

    fn sample_project() -> Project {
        let mut project = Project::new("Rover");

        let mut engine = WorkPackage::new("WP-1", "Engine");
        engine.tasks.push(
            Task::new("T-1", "Head gasket set")
                .with_estimated_cost(85.0)
                .with_status(TaskStatus::Blocked),
        );
        engine.tasks.push(
            Task::new("T-2", "Oil and filter")
                .with_estimated_cost(45.0)
                .with_status(TaskStatus::Pending),
        );
        engine
            .tasks
            .push(Task::new("T-3", "Drain coolant").with_status(TaskStatus::Complete));

        let mut brakes = WorkPackage::new("WP-2", "Brakes");
        brakes.tasks.push(
            Task::new("T-4", "Brake lines")
                .with_estimated_cost(120.0)
                .with_status(TaskStatus::InProgress),
        );

        let mut drivetrain = SubProject::new("SP-1", "Drivetrain");
        drivetrain.work_packages.push(engine);
        drivetrain.work_packages.push(brakes);
        project.sub_projects.push(drivetrain);

        let mut interior = SubProject::new("SP-2", "Interior");
        let mut seats = WorkPackage::new("WP-3", "Seats");
        seats
            .tasks
            .push(Task::new("T-5", "Re-cover squabs").with_status(TaskStatus::Complete));
        interior.work_packages.push(seats);
        project.sub_projects.push(interior);

        project
    }

    #[test]
    fn test_shopping_report_groups_and_totals() {
        let report = shopping_report(&sample_project());

        let statuses: Vec<TaskStatus> = report.groups.iter().map(|g| g.status).collect();
        assert_eq!(
            statuses,
            vec![
                TaskStatus::Blocked,
                TaskStatus::InProgress,
                TaskStatus::Pending
            ]
        );

        let blocked = &report.groups[0];
        assert_eq!(blocked.items.len(), 1);
        assert_eq!(blocked.subtotal, 85.0);
        assert_eq!(blocked.items[0].work_package, "Engine");

        assert_eq!(report.grand_total, 250.0);
    }

    #[test]
    fn test_shopping_report_excludes_complete() {
        let report = shopping_report(&sample_project());
        for group in &report.groups {
            assert!(group.items.iter().all(|i| i.task_id != "T-3"));
        }
    }

    #[test]
    fn test_shopping_report_empty_project() {
        let report = shopping_report(&Project::default());
        assert!(report.groups.is_empty());
        assert_eq!(report.grand_total, 0.0);
    }

    #[test]
    fn test_progress_rollups() {
        let progress = project_progress(&sample_project());
        assert_eq!(progress.total_tasks, 5);
        assert_eq!(progress.completed_tasks, 2);
        assert_eq!(progress.percent_complete, 40);

        assert_eq!(progress.sub_projects.len(), 2);
        let drivetrain = &progress.sub_projects[0];
        assert_eq!(drivetrain.total_tasks, 4);
        assert_eq!(drivetrain.completed_tasks, 1);
        assert_eq!(drivetrain.percent_complete, 25);
        let interior = &progress.sub_projects[1];
        assert_eq!(interior.percent_complete, 100);
    }

    #[test]
    fn test_progress_empty_sub_project() {
        let mut project = Project::new("Rover");
        project
            .sub_projects
            .push(SubProject::new("SP-1", "Not started"));
        let progress = progress_by_sub_project(&project);
        assert_eq!(progress[0].total_tasks, 0);
        assert_eq!(progress[0].percent_complete, 0);
    }
}
