#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]

//! # Talus Tally
//!
//! Tracker for a long-running vehicle restoration: a fixed
//! Project -> SubProject -> WorkPackage -> Task hierarchy with answers
//! to "what should I work on next" built in.
//!
//! This crate provides:
//! - Velocity and combined scoring with quick-win detection
//! - Read-time dependency resolution (`blocks` edges, never persisted
//!   as status)
//! - Field-tolerant partial updates and strict id validation
//! - Crash-safe JSON persistence with rolling backups
//! - Dropbox sync with revision-based conflict detection
//!
//! ## Example
//!
//! ```rust,ignore
//! use tally::{FileStore, Project, SubProject, Task, WorkPackage};
//!
//! let mut project = Project::new("Rover Restoration");
//! project.add_sub_project(SubProject::with_generated_id("Drivetrain"));
//!
//! let rows = tally::prioritized_tasks(&project, false);
//!
//! let store = FileStore::new(tally::config::data_file_path());
//! store.save(&project).await?;
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Dependency resolution
pub mod resolver;

// Scoring engine and priority views
pub mod scoring;

// Hierarchy mutations
mod manager;

// Budget and progress rollups
pub mod reports;

// Local persistence
pub mod storage;

// Remote sync
pub mod sync;

// Default paths
pub mod config;

// Re-export key types for convenience
pub use entities::{Project, SubProject, Task, TaskContext, TaskStatus, WorkPackage};
pub use errors::{TallyError, TallyResult};
pub use resolver::{effective_status, runtime_blocked_ids};
pub use scoring::{
    combined_score, prioritized_tasks, project_snapshot, velocity_score, PrioritizedTask,
    ProjectSnapshot, TaskScores,
};
pub use reports::{progress_by_sub_project, project_progress, shopping_report, ShoppingReport};
pub use storage::FileStore;
pub use sync::{DownloadOutcome, DropboxRemote, RemoteStore, SyncCoordinator};
