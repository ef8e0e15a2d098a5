//! Dropbox implementation of the remote store.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::errors::{TallyError, TallyResult};

use super::remote::{RemoteFile, RemoteMetadata, RemoteStore, WriteMode};

/// Dropbox RPC endpoint base
const DROPBOX_API_URL: &str = "https://api.dropboxapi.com";

/// Dropbox content-transfer endpoint base
const DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com";

/// Metadata subset Dropbox returns for files
#[derive(Debug, Deserialize)]
struct FileMetadata {
    rev: String,
    #[serde(default)]
    size: Option<u64>,
}

/// Error payload carried by Dropbox 409 responses
#[derive(Debug, Deserialize)]
struct DropboxErrorResponse {
    #[serde(default)]
    error_summary: String,
}

/// Remote store backed by the Dropbox HTTP API.
///
/// Paths resolve inside the app folder the access token was issued
/// for. Obtaining and refreshing the token is the caller's concern.
pub struct DropboxRemote {
    client: Client,
    access_token: String,
    api_base: String,
    content_base: String,
}

impl DropboxRemote {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            api_base: DROPBOX_API_URL.to_string(),
            content_base: DROPBOX_CONTENT_URL.to_string(),
        }
    }

    /// Point the RPC endpoint somewhere else (tests).
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Point the content endpoint somewhere else (tests).
    pub fn with_content_base(mut self, url: impl Into<String>) -> Self {
        self.content_base = url.into();
        self
    }

    fn error_summary(body: &str) -> String {
        serde_json::from_str::<DropboxErrorResponse>(body)
            .map(|e| e.error_summary)
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteStore for DropboxRemote {
    async fn metadata(&self, path: &str) -> TallyResult<Option<RemoteMetadata>> {
        let response = self
            .client
            .post(format!("{}/2/files/get_metadata", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&json!({ "path": path }))
            .send()
            .await
            .map_err(|e| TallyError::RemoteError {
                reason: format!("get_metadata request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            let meta: FileMetadata = response.json().await?;
            return Ok(Some(RemoteMetadata {
                rev: meta.rev,
                size: meta.size,
            }));
        }

        let body = response.text().await.unwrap_or_default();
        // 409 with path/not_found just means nothing is there yet.
        if status.as_u16() == 409 && Self::error_summary(&body).starts_with("path/not_found") {
            return Ok(None);
        }
        Err(TallyError::RemoteError {
            reason: format!("get_metadata for '{path}' failed ({status}): {body}"),
        })
    }

    async fn download(&self, path: &str) -> TallyResult<RemoteFile> {
        tracing::debug!("Downloading '{}' from Dropbox", path);

        let response = self
            .client
            .post(format!("{}/2/files/download", self.content_base))
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", json!({ "path": path }).to_string())
            .send()
            .await
            .map_err(|e| TallyError::RemoteError {
                reason: format!("download request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TallyError::RemoteError {
                reason: format!("download of '{path}' failed ({status}): {body}"),
            });
        }

        // File metadata rides in a response header; the body is the
        // raw content.
        let meta = response
            .headers()
            .get("dropbox-api-result")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| serde_json::from_str::<FileMetadata>(v).ok())
            .ok_or_else(|| TallyError::RemoteError {
                reason: format!("download of '{path}' returned no usable metadata"),
            })?;

        let content = response.bytes().await?.to_vec();
        Ok(RemoteFile {
            content,
            rev: meta.rev,
        })
    }

    async fn upload(
        &self,
        path: &str,
        content: &[u8],
        mode: WriteMode,
    ) -> TallyResult<RemoteMetadata> {
        let arg = match &mode {
            WriteMode::Overwrite => json!({ "path": path, "mode": "overwrite", "mute": true }),
            WriteMode::Update(rev) => json!({
                "path": path,
                "mode": { ".tag": "update", "update": rev },
                "mute": true,
            }),
        };

        tracing::debug!("Uploading {} bytes to '{}' on Dropbox", content.len(), path);

        let response = self
            .client
            .post(format!("{}/2/files/upload", self.content_base))
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", arg.to_string())
            .header("Content-Type", "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| TallyError::RemoteError {
                reason: format!("upload request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            let meta: FileMetadata = response.json().await?;
            return Ok(RemoteMetadata {
                rev: meta.rev,
                size: meta.size,
            });
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 409 && Self::error_summary(&body).contains("conflict") {
            return Err(TallyError::SyncConflict {
                path: path.to_string(),
            });
        }
        Err(TallyError::RemoteError {
            reason: format!("upload to '{path}' failed ({status}): {body}"),
        })
    }
}
