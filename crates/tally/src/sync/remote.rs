//! Remote store abstraction.

use async_trait::async_trait;

use crate::errors::TallyResult;

/// Write mode for uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Unconditional write; whatever is remote gets replaced.
    Overwrite,
    /// Conditional write keyed to a revision token. The remote rejects
    /// the write when its current revision differs.
    Update(String),
}

/// Metadata for one remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Opaque revision token identifying the remote content.
    pub rev: String,
    /// Object size in bytes, when the backend reports it.
    pub size: Option<u64>,
}

/// Downloaded content together with the revision it came from.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    pub rev: String,
}

/// A path-addressed remote file store.
///
/// Implementations translate these calls into their backend's protocol
/// and map a rejected conditional write to
/// [`TallyError::SyncConflict`](crate::errors::TallyError::SyncConflict).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Metadata for `path`, or `None` when no object exists there.
    async fn metadata(&self, path: &str) -> TallyResult<Option<RemoteMetadata>>;

    /// Download the object at `path`.
    async fn download(&self, path: &str) -> TallyResult<RemoteFile>;

    /// Upload `content` to `path` under the given write mode and
    /// return the new metadata.
    async fn upload(
        &self,
        path: &str,
        content: &[u8],
        mode: WriteMode,
    ) -> TallyResult<RemoteMetadata>;
}
