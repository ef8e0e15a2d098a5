//! Upload and download coordination with revision tracking.

use std::path::Path;
use std::sync::Arc;

use tokio::fs;

use crate::errors::{TallyError, TallyResult};

use super::remote::{RemoteStore, WriteMode};

/// Remote location of the master file, relative to the app folder.
pub const DEFAULT_REMOTE_PATH: &str = "/data/talus_master.json";

/// What a download attempt found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Remote content was written over the local file.
    Downloaded,
    /// Nothing exists remotely yet; the local file was left alone.
    RemoteMissing,
}

/// Coordinates one local file against one remote object.
///
/// The coordinator remembers the remote revision token from the last
/// transfer and uploads conditionally against it, so a second device
/// writing in between surfaces as
/// [`TallyError::SyncConflict`] instead of silently losing data. The
/// usual recovery is download, reconcile, upload again.
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteStore>,
    remote_path: String,
    remote_rev: Option<String>,
}

impl SyncCoordinator {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            remote_path: DEFAULT_REMOTE_PATH.to_string(),
            remote_rev: None,
        }
    }

    /// Track a different remote object path.
    pub fn with_remote_path(mut self, path: impl Into<String>) -> Self {
        self.remote_path = path.into();
        self
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Revision recorded by the last successful transfer, if any.
    pub fn tracked_rev(&self) -> Option<&str> {
        self.remote_rev.as_deref()
    }

    /// Pull the remote file down over `local_path`.
    ///
    /// A missing remote object is a normal first-run condition, not an
    /// error: the tracked revision resets and the caller keeps its
    /// local state.
    pub async fn download(&mut self, local_path: &Path) -> TallyResult<DownloadOutcome> {
        if self.remote.metadata(&self.remote_path).await?.is_none() {
            tracing::info!("No remote file at '{}' yet", self.remote_path);
            self.remote_rev = None;
            return Ok(DownloadOutcome::RemoteMissing);
        }

        let file = self.remote.download(&self.remote_path).await?;
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(local_path, &file.content)
            .await
            .map_err(|e| TallyError::FileWriteError {
                path: local_path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Downloaded '{}' at rev {} ({} bytes)",
            self.remote_path,
            file.rev,
            file.content.len()
        );
        self.remote_rev = Some(file.rev);
        Ok(DownloadOutcome::Downloaded)
    }

    /// Push the local file up.
    ///
    /// With a tracked revision the write is conditional and a changed
    /// remote fails with [`TallyError::SyncConflict`]; without one the
    /// remote is overwritten outright. On success local backups are
    /// mirrored best-effort.
    pub async fn upload(&mut self, local_path: &Path) -> TallyResult<()> {
        let content = fs::read(local_path)
            .await
            .map_err(|e| TallyError::FileReadError {
                path: local_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mode = match &self.remote_rev {
            Some(rev) => WriteMode::Update(rev.clone()),
            None => WriteMode::Overwrite,
        };
        let meta = self.remote.upload(&self.remote_path, &content, mode).await?;

        tracing::info!(
            "Uploaded '{}' at rev {} ({} bytes)",
            self.remote_path,
            meta.rev,
            content.len()
        );
        self.remote_rev = Some(meta.rev);

        self.mirror_backups(local_path).await;
        Ok(())
    }

    /// Copy local backup files into the remote `backups` folder.
    /// Purely best-effort: every failure is logged and swallowed so
    /// backup trouble never fails a data upload.
    async fn mirror_backups(&self, local_path: &Path) {
        let Some(local_dir) = local_path.parent() else {
            return;
        };
        let backups_dir = local_dir.join("backups");
        let mut entries = match fs::read_dir(&backups_dir).await {
            Ok(entries) => entries,
            // Nothing to mirror.
            Err(_) => return,
        };

        let remote_dir = self
            .remote_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Stopped scanning local backups: {}", e);
                    break;
                }
            };
            let path = entry.path();
            let is_file = entry.file_type().await.map_or(false, |t| t.is_file());
            if !is_file {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let remote_backup = format!("{remote_dir}/backups/{name}");
            match fs::read(&path).await {
                Ok(bytes) => {
                    if let Err(e) = self
                        .remote
                        .upload(&remote_backup, &bytes, WriteMode::Overwrite)
                        .await
                    {
                        tracing::warn!("Mirroring backup '{}' failed: {}", name, e);
                    }
                }
                Err(e) => {
                    tracing::warn!("Could not read backup '{}': {}", name, e);
                }
            }
        }
    }
}
