//! End-to-end exercises of the hierarchy, scoring, and persistence
//! working together.

use serde_json::json;
use tally::{
    prioritized_tasks, project_progress, project_snapshot, shopping_report, FileStore, Project,
    SubProject, Task, TaskStatus, WorkPackage,
};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small but realistic restoration project: two sub-projects, parts
/// on order, one dependency chain.
fn restoration_project() -> Project {
    let mut project = Project::new("1974 Rover Restoration");

    let mut drivetrain = SubProject::new("SP-drive", "Drivetrain").with_priority(9);
    let mut engine = WorkPackage::new("WP-engine", "Engine rebuild").with_importance(9);
    engine.tasks.push(
        Task::new("T-gasket", "Order head gasket set")
            .with_estimated_cost(85.0)
            .with_importance(8)
            .with_budget_priority(9)
            .with_blocks(vec!["T-head".into()]),
    );
    engine.tasks.push(
        Task::new("T-head", "Refit cylinder head")
            .with_estimated_cost(0.0)
            .with_importance(9),
    );
    engine.tasks.push(
        Task::new("T-manual", "Scan workshop manual").with_importance(3),
    );
    drivetrain.work_packages.push(engine);

    let mut interior = SubProject::new("SP-interior", "Interior").with_priority(4);
    let mut seats = WorkPackage::new("WP-seats", "Seats").with_importance(5);
    seats.tasks.push(
        Task::new("T-foam", "Replace seat foam")
            .with_estimated_cost(140.0)
            .with_importance(4),
    );
    interior.work_packages.push(seats);
    project.sub_projects.push(drivetrain);
    project.sub_projects.push(interior);

    project
}

#[test]
fn prioritized_view_reflects_dependency_chain() {
    init_tracing();
    let project = restoration_project();
    let rows = prioritized_tasks(&project, false);

    // T-head is runtime-blocked by the unordered gasket set and sinks
    // to the bottom with a zero score.
    let head = rows.iter().find(|r| r.task_id == "T-head").unwrap();
    assert!(head.runtime_blocked);
    assert_eq!(head.status, TaskStatus::Blocked);
    assert_eq!(head.combined, 0.0);
    assert_eq!(rows.last().unwrap().task_id, "T-head");

    // The free admin task (zero cost, no downtime weight, importance
    // below quick-win leverage) takes the software baseline.
    let manual = rows.iter().find(|r| r.task_id == "T-manual").unwrap();
    assert_eq!(manual.velocity, 500.0);

    // The gasket order leads: real formula score plus downtime weight.
    assert_eq!(rows[0].task_id, "T-manual");
    let gasket = rows.iter().find(|r| r.task_id == "T-gasket").unwrap();
    assert!(gasket.combined > 0.0);
    assert!(gasket.combined < 500.0);
}

#[test]
fn completing_the_blocker_releases_the_chain() {
    init_tracing();
    let mut project = restoration_project();

    project.complete_task("T-gasket").unwrap();
    let rows = prioritized_tasks(&project, false);

    // T-head now scores as a zero-cost quick win (importance 9 is not
    // enough on its own, but nothing blocks it and it has no downtime
    // weight, so it gets the software baseline).
    let head = rows.iter().find(|r| r.task_id == "T-head").unwrap();
    assert!(!head.runtime_blocked);
    assert_eq!(head.status, TaskStatus::Pending);
    assert_eq!(head.velocity, 500.0);

    // The completed blocker is out of the default view.
    assert!(rows.iter().all(|r| r.task_id != "T-gasket"));
}

#[test]
fn update_move_and_reports_flow() {
    init_tracing();
    let mut project = restoration_project();

    // Parts arrived: record actual cost, start the work.
    project
        .update_task(
            "T-gasket",
            &json!({ "status": "in_progress", "actual_cost": 79.5 }),
        )
        .unwrap();
    // Seat foam gets batched with the engine order, so it moves
    // across sub-projects.
    project.move_task("T-foam", "WP-engine").unwrap();
    assert!(project
        .sub_project("SP-interior")
        .unwrap()
        .work_package("WP-seats")
        .unwrap()
        .tasks
        .is_empty());

    let report = shopping_report(&project);
    assert_eq!(report.groups[0].status, TaskStatus::InProgress);
    assert_eq!(report.grand_total, 85.0 + 140.0);

    let progress = project_progress(&project);
    assert_eq!(progress.total_tasks, 4);
    assert_eq!(progress.completed_tasks, 0);

    project.complete_task("T-manual").unwrap();
    let progress = project_progress(&project);
    assert_eq!(progress.completed_tasks, 1);
    assert_eq!(progress.percent_complete, 25);
}

#[test]
fn snapshot_orders_groups_for_rendering() {
    init_tracing();
    let project = restoration_project();
    let snapshot = project_snapshot(&project);

    assert_eq!(snapshot.name, "1974 Rover Restoration");
    // Priority 9 before priority 4.
    assert_eq!(snapshot.sub_projects[0].sub_project_id, "SP-drive");
    assert_eq!(snapshot.sub_projects[1].sub_project_id, "SP-interior");

    // Tasks inside the engine package are ordered by combined score.
    let engine = &snapshot.sub_projects[0].work_packages[0];
    assert_eq!(engine.tasks[0].task_id, "T-manual");
    assert_eq!(engine.tasks.last().unwrap().task_id, "T-head");
}

#[tokio::test]
async fn save_load_cycle_preserves_everything() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("talus_master.json"));

    let mut project = restoration_project();
    project.sort_tasks_by_priority();
    store.save(&project).await.unwrap();

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded, project);

    // Scores derive identically from the reloaded tree.
    let before = prioritized_tasks(&project, true);
    let after = prioritized_tasks(&loaded, true);
    let ids = |rows: &[tally::PrioritizedTask]| {
        rows.iter().map(|r| r.task_id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&before), ids(&after));
}

#[tokio::test]
async fn wire_format_stays_compatible() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("talus_master.json"));

    // A payload in the legacy shape: `blocking` spelling, sparse
    // fields, snake_case statuses.
    let payload = json!({
        "name": "Imported",
        "last_updated": "2025-11-02T10:00:00Z",
        "sub_projects": [{
            "id": "SP-1",
            "name": "Electrics",
            "priority": 6,
            "work_packages": [{
                "id": "WP-1",
                "name": "Loom",
                "importance": 7,
                "tasks": [
                    {
                        "id": "T-1",
                        "text": "Order new loom",
                        "status": "in_progress",
                        "estimated_cost": 300.0,
                        "blocking": ["T-2"]
                    },
                    { "id": "T-2", "text": "Fit loom" }
                ]
            }]
        }]
    });
    tokio::fs::write(store.data_path(), payload.to_string())
        .await
        .unwrap();

    let project = store.load().await.unwrap();
    assert_eq!(project.task("T-1").unwrap().status, TaskStatus::InProgress);
    assert_eq!(project.task("T-1").unwrap().blocks, vec!["T-2".to_string()]);
    assert_eq!(project.task("T-2").unwrap().status, TaskStatus::Pending);

    // Saving writes the current spelling and keeps statuses
    // snake_case.
    store.save(&project).await.unwrap();
    let written = tokio::fs::read_to_string(store.data_path()).await.unwrap();
    assert!(written.contains("\"blocks\""));
    assert!(!written.contains("\"blocking\""));
    assert!(written.contains("\"in_progress\""));
}

#[test]
fn invalid_ids_fail_without_side_effects() {
    init_tracing();
    let mut project = restoration_project();
    let before = project.clone();

    assert!(project.update_task("T-404", &json!({})).is_err());
    assert!(project.complete_task("T-404").is_err());
    assert!(project.delete_work_package("WP-404").is_err());
    assert!(project.move_task("T-head", "WP-404").is_err());
    assert!(project
        .add_task("SP-drive", "WP-404", Task::new("T-x", "x"))
        .is_err());

    assert_eq!(project, before);
}
