//! Local persistence for the project file.

mod file;

pub use file::{FileStore, DEFAULT_MAX_BACKUPS};
