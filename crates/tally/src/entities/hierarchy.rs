//! Project hierarchy containers and lookup helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;
use super::task::Task;

fn default_weight() -> u8 {
    5
}

fn default_project_name() -> String {
    "New Project".to_string()
}

/// Mid-level grouping of tasks, e.g. "Front brake overhaul"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPackage {
    pub id: String,
    pub name: String,
    /// Strategic weight 1-10 within the owning sub-project.
    #[serde(default = "default_weight")]
    pub importance: u8,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl WorkPackage {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            importance: default_weight(),
            tasks: Vec::new(),
        }
    }

    /// Create a work package with a generated `WP-` id.
    pub fn with_generated_id(name: impl Into<String>) -> Self {
        Self::new(new_id("WP"), name)
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

/// Top-level grouping, one per major subsystem of the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubProject {
    pub id: String,
    pub name: String,
    /// Strategic weight 1-10 within the whole project.
    #[serde(default = "default_weight")]
    pub priority: u8,
    #[serde(default)]
    pub work_packages: Vec<WorkPackage>,
}

impl SubProject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority: default_weight(),
            work_packages: Vec::new(),
        }
    }

    /// Create a sub-project with a generated `SP-` id.
    pub fn with_generated_id(name: impl Into<String>) -> Self {
        Self::new(new_id("SP"), name)
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn work_package(&self, wp_id: &str) -> Option<&WorkPackage> {
        self.work_packages.iter().find(|wp| wp.id == wp_id)
    }

    pub fn work_package_mut(&mut self, wp_id: &str) -> Option<&mut WorkPackage> {
        self.work_packages.iter_mut().find(|wp| wp.id == wp_id)
    }
}

/// A task joined with its ancestors, borrowed from the owning project
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    pub sub_project: &'a SubProject,
    pub work_package: &'a WorkPackage,
    pub task: &'a Task,
}

/// Root of the tracked hierarchy; the unit of persistence and sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub sub_projects: Vec<SubProject>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(default_project_name())
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_updated: Utc::now(),
            sub_projects: Vec::new(),
        }
    }

    /// Bump the last-modified timestamp.
    pub(crate) fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    pub fn sub_project(&self, sub_id: &str) -> Option<&SubProject> {
        self.sub_projects.iter().find(|sp| sp.id == sub_id)
    }

    pub fn sub_project_mut(&mut self, sub_id: &str) -> Option<&mut SubProject> {
        self.sub_projects.iter_mut().find(|sp| sp.id == sub_id)
    }

    /// Find a work package anywhere in the hierarchy.
    pub fn work_package(&self, wp_id: &str) -> Option<&WorkPackage> {
        self.sub_projects
            .iter()
            .flat_map(|sp| &sp.work_packages)
            .find(|wp| wp.id == wp_id)
    }

    /// Every task in hierarchy order: sub-projects, then their work
    /// packages, then their tasks, all in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.task_contexts().map(|ctx| ctx.task)
    }

    /// Every task paired with its ancestors, in hierarchy order.
    pub fn task_contexts(&self) -> impl Iterator<Item = TaskContext<'_>> {
        self.sub_projects.iter().flat_map(|sub_project| {
            sub_project.work_packages.iter().flat_map(move |work_package| {
                work_package.tasks.iter().map(move |task| TaskContext {
                    sub_project,
                    work_package,
                    task,
                })
            })
        })
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.sub_projects
            .iter_mut()
            .flat_map(|sp| &mut sp.work_packages)
            .flat_map(|wp| &mut wp.tasks)
            .find(|t| t.id == task_id)
    }

    /// Task with its ancestors, or None when the id is unknown.
    pub fn find_task_context(&self, task_id: &str) -> Option<TaskContext<'_>> {
        self.task_contexts().find(|ctx| ctx.task.id == task_id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks().count()
    }
}
