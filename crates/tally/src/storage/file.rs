//! File-backed persistence with rolling backups.
//!
//! Saves go backup, temp write, rename. A crash mid-save leaves either
//! the old file or the new one, never a torn mix, and the previous
//! contents survive in the backup directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;

use crate::entities::Project;
use crate::errors::{TallyError, TallyResult};

/// Rolling backups kept per data file.
pub const DEFAULT_MAX_BACKUPS: usize = 5;

const BACKUP_SUFFIX: &str = ".bak";
const FALLBACK_FILE_NAME: &str = "project.json";

/// Store for one project file and its backup rotation.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_path: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
}

impl FileStore {
    /// Create a store for `data_path`, keeping backups in a `backups`
    /// directory next to it.
    pub fn new(data_path: impl AsRef<Path>) -> Self {
        let data_path = data_path.as_ref().to_path_buf();
        let backup_dir = data_path
            .parent()
            .map_or_else(|| PathBuf::from("backups"), |dir| dir.join("backups"));
        Self {
            data_path,
            backup_dir,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }

    pub fn with_backup_dir(mut self, backup_dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = backup_dir.into();
        self
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Load the project from disk.
    ///
    /// A missing file yields a fresh default project; a file that
    /// exists but fails to parse is an error, so a corrupt database is
    /// never silently replaced.
    pub async fn load(&self) -> TallyResult<Project> {
        match fs::read_to_string(&self.data_path).await {
            Ok(content) => {
                let project: Project = serde_json::from_str(&content)?;
                tracing::debug!(
                    "Loaded project '{}' from {}",
                    project.name,
                    self.data_path.display()
                );
                Ok(project)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No data file at {}, starting a fresh project",
                    self.data_path.display()
                );
                Ok(Project::default())
            }
            Err(e) => Err(TallyError::FileReadError {
                path: self.data_path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Persist the project.
    ///
    /// The current file (when present) is copied into the backup
    /// rotation first; a failed backup is logged and does not stop the
    /// save. The new contents then go to a temp file that is renamed
    /// over the destination.
    pub async fn save(&self, project: &Project) -> TallyResult<()> {
        if fs::try_exists(&self.data_path).await.unwrap_or(false) {
            if let Err(e) = self.back_up_current().await {
                tracing::warn!(
                    "Backup of {} failed, saving anyway: {}",
                    self.data_path.display(),
                    e
                );
            }
        }

        if let Some(parent) = self.data_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(project)?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, &content)
            .await
            .map_err(|e| TallyError::FileWriteError {
                path: tmp_path.display().to_string(),
                reason: e.to_string(),
            })?;
        fs::rename(&tmp_path, &self.data_path)
            .await
            .map_err(|e| TallyError::FileWriteError {
                path: self.data_path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            "Saved project '{}' to {}",
            project.name,
            self.data_path.display()
        );
        Ok(())
    }

    /// Backups of this store's file, oldest first.
    pub async fn list_backups(&self) -> TallyResult<Vec<PathBuf>> {
        self.backup_paths(&self.file_name()).await
    }

    fn file_name(&self) -> String {
        self.data_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(FALLBACK_FILE_NAME)
            .to_string()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut path = self.data_path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }

    async fn back_up_current(&self) -> TallyResult<()> {
        fs::create_dir_all(&self.backup_dir).await?;
        let file_name = self.file_name();
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%f");
        let backup_path = self
            .backup_dir
            .join(format!("{file_name}.{stamp}{BACKUP_SUFFIX}"));
        fs::copy(&self.data_path, &backup_path).await?;
        self.prune_backups(&file_name).await;
        Ok(())
    }

    /// Drop the oldest backups beyond the retention count. Failures
    /// here only cost disk space, so they are logged and swallowed.
    async fn prune_backups(&self, file_name: &str) {
        let mut backups = match self.backup_paths(file_name).await {
            Ok(backups) => backups,
            Err(e) => {
                tracing::warn!("Could not scan backups for pruning: {}", e);
                return;
            }
        };
        while backups.len() > self.max_backups {
            let oldest = backups.remove(0);
            if let Err(e) = fs::remove_file(&oldest).await {
                tracing::warn!("Failed to prune backup {}: {}", oldest.display(), e);
            }
        }
    }

    /// Matching backups sorted by name; the timestamp format makes
    /// that oldest-first.
    async fn backup_paths(&self, file_name: &str) -> TallyResult<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{file_name}.");
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) && name.ends_with(BACKUP_SUFFIX) {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{SubProject, Task, WorkPackage};
    use tempfile::TempDir;

    fn setup_store(dir: &TempDir) -> FileStore {
        FileStore::new(dir.path().join("talus_master.json"))
    }

    fn project_named(name: &str) -> Project {
        let mut project = Project::new(name);
        let mut sub = SubProject::new("SP-1", "Drivetrain");
        let mut wp = WorkPackage::new("WP-1", "Gearbox");
        wp.tasks.push(Task::new("T-1", "Replace layshaft bearings"));
        sub.work_packages.push(wp);
        project.sub_projects.push(sub);
        project
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = setup_store(&dir);

        let project = project_named("Rover");
        store.save(&project).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, project);
        // No stray temp file left behind.
        assert!(!dir.path().join("talus_master.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_fresh_project() {
        let dir = TempDir::new().unwrap();
        let store = setup_store(&dir);

        let project = store.load().await.unwrap();
        assert_eq!(project.name, "New Project");
        assert!(project.sub_projects.is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_json_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = setup_store(&dir);

        tokio::fs::write(store.data_path(), "{not json")
            .await
            .unwrap();
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, TallyError::JsonParseError { .. }));
    }

    #[tokio::test]
    async fn test_first_save_creates_no_backup() {
        let dir = TempDir::new().unwrap();
        let store = setup_store(&dir);

        store.save(&project_named("Rover")).await.unwrap();
        assert!(store.list_backups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backup_rotation_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let store = setup_store(&dir).with_max_backups(2);

        for name in ["one", "two", "three", "four"] {
            store.save(&project_named(name)).await.unwrap();
        }

        let backups = store.list_backups().await.unwrap();
        assert_eq!(backups.len(), 2);

        // Saves were one..four, so the retained backups hold the two
        // states before the last: "two" then "three".
        let oldest = tokio::fs::read_to_string(&backups[0]).await.unwrap();
        let newest = tokio::fs::read_to_string(&backups[1]).await.unwrap();
        let oldest: Project = serde_json::from_str(&oldest).unwrap();
        let newest: Project = serde_json::from_str(&newest).unwrap();
        assert_eq!(oldest.name, "two");
        assert_eq!(newest.name, "three");
    }

    #[tokio::test]
    async fn test_stale_tmp_file_does_not_break_load() {
        let dir = TempDir::new().unwrap();
        let store = setup_store(&dir);

        let project = project_named("Rover");
        store.save(&project).await.unwrap();
        // Simulate a crash that left a half-written temp file behind.
        tokio::fs::write(dir.path().join("talus_master.json.tmp"), "garbage")
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, project);
    }

    #[tokio::test]
    async fn test_backup_failure_does_not_block_save() {
        let dir = TempDir::new().unwrap();
        // A file where the backup directory should be makes every
        // backup attempt fail.
        let blocker = dir.path().join("backups");
        tokio::fs::write(&blocker, "in the way").await.unwrap();

        let store = setup_store(&dir);
        store.save(&project_named("first")).await.unwrap();
        store.save(&project_named("second")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.name, "second");
    }

    #[tokio::test]
    async fn test_save_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("data").join("talus_master.json"));

        store.save(&project_named("Rover")).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.name, "Rover");
    }
}
