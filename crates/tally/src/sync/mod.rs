//! Remote synchronization.
//!
//! The local file is always authoritative for edits; sync only moves
//! whole files. [`SyncCoordinator`] layers revision tracking on top of
//! a [`RemoteStore`] so concurrent writers are detected instead of
//! overwritten, and [`DropboxRemote`] is the production backend.

mod coordinator;
mod dropbox;
mod remote;

pub use coordinator::{DownloadOutcome, SyncCoordinator, DEFAULT_REMOTE_PATH};
pub use dropbox::DropboxRemote;
pub use remote::{RemoteFile, RemoteMetadata, RemoteStore, WriteMode};
