//! Artifact storage.
//!
//! `StorageGateway` is the narrow contract the pipeline needs from object
//! storage: an idempotent create-or-overwrite write. `LocalStorage`
//! implements it on the local filesystem; production backends slot in
//! behind the same trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Deterministic artifact key for an (owner, job) pair.
///
/// The key is unique per pair and writes are upserts, so retries of the
/// same job land on the same object instead of accumulating copies.
pub fn artifact_key(owner_id: i64, job_id: i64) -> String {
    format!("{}/{}.pdf", owner_id, job_id)
}

/// Narrow storage contract: create-or-overwrite a single object.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Write `data` under `key` with upsert semantics, overwriting any
    /// prior object at the same key. Returns the stored path.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;
}

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create the backend, ensuring the root directory exists.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a storage key to a filesystem path.
    ///
    /// Keys containing traversal sequences or absolute paths are rejected
    /// so no key can resolve outside the storage root.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.base_path.join(key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for LocalStorage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        // File::create truncates an existing file, which is exactly the
        // upsert the contract requires.
        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to sync file {}: {}", path.display(), e))
        })?;

        info!(
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            "storage_put_complete"
        );

        Ok(key.to_string())
    }
}
