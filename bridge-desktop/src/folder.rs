//! Shared-Folder Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileStat, FolderAccess, FolderRef},
};
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Tokio-based folder access implementation.
///
/// A [`FolderRef`] is interpreted as a directory path. The directory is never
/// created by this adapter: the reference points at a user-chosen folder, and
/// a missing directory means the reference is no longer valid (drive
/// unmounted, folder deleted), which the caller treats as a recoverable
/// failure.
#[derive(Debug, Default, Clone)]
pub struct TokioFolderAccess;

impl TokioFolderAccess {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a folder reference to an existing directory.
    async fn resolve_dir(&self, folder: &FolderRef) -> Result<PathBuf> {
        let path = PathBuf::from(folder.as_str());
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(BridgeError::FolderUnresolvable(format!(
                "{} is not a directory",
                folder
            ))),
            Err(e) => Err(BridgeError::FolderUnresolvable(format!("{}: {}", folder, e))),
        }
    }
}

#[async_trait]
impl FolderAccess for TokioFolderAccess {
    async fn file_exists(&self, folder: &FolderRef, name: &str) -> Result<bool> {
        let path = self.resolve_dir(folder).await?.join(name);
        Ok(fs::try_exists(&path).await?)
    }

    async fn create_file(&self, folder: &FolderRef, name: &str) -> Result<()> {
        let path = self.resolve_dir(folder).await?.join(name);
        // Create without truncating an existing file.
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        debug!(path = ?path, "Created sync file");
        Ok(())
    }

    async fn stat_file(&self, folder: &FolderRef, name: &str) -> Result<Option<FileStat>> {
        let path = self.resolve_dir(folder).await?.join(name);
        match fs::metadata(&path).await {
            Ok(meta) => {
                let modified_at = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                Ok(Some(FileStat {
                    modified_at,
                    length: meta.len(),
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn read_file(&self, folder: &FolderRef, name: &str) -> Result<Bytes> {
        let path = self.resolve_dir(folder).await?.join(name);
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::FileNotFound(name.to_string())
            } else {
                BridgeError::Io(e)
            }
        })?;
        debug!(path = ?path, size = data.len(), "Read sync file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, folder: &FolderRef, name: &str, data: Bytes) -> Result<()> {
        let path = self.resolve_dir(folder).await?.join(name);
        fs::write(&path, data.as_ref()).await?;
        debug!(path = ?path, size = data.len(), "Wrote sync file");
        Ok(())
    }
}
