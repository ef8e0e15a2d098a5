//! Task entity and status values.

use serde::{Deserialize, Serialize};

use crate::errors::TallyError;

use super::new_id;

/// Lifecycle states for a task
///
/// `Blocked` here is the stored state; tasks can also be forced into a
/// blocked state at read time by another task's `blocks` list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    #[default]
    Pending,
    InProgress,
    Blocked,
    Complete,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Backlog => "backlog",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "pending" | "todo" => Ok(Self::Pending),
            "in_progress" | "in-progress" | "inprogress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "complete" | "completed" | "done" => Ok(Self::Complete),
            _ => Err(TallyError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Leaf unit of work with cost, weighting, and dependency edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub actual_cost: f64,
    /// Downtime weight 1-10; None for items with no downtime pressure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_priority: Option<u8>,
    /// Technical importance 1-10; None scores as neutral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    /// Ids of tasks held up until this one completes.
    ///
    /// Older payloads called this field `blocking`; both spellings
    /// deserialize.
    #[serde(default, alias = "blocking", skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<String>,
}

impl Task {
    /// Create a task with an explicit id.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            status: TaskStatus::default(),
            estimated_cost: 0.0,
            actual_cost: 0.0,
            budget_priority: None,
            importance: None,
            blocks: Vec::new(),
        }
    }

    /// Create a task with a generated `T-` id.
    pub fn with_generated_id(text: impl Into<String>) -> Self {
        Self::new(new_id("T"), text)
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_estimated_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_budget_priority(mut self, weight: u8) -> Self {
        self.budget_priority = Some(weight);
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<String>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }
}
