//! File Signature Change Detection
//!
//! Decides whether the sync file is worth re-reading without downloading it:
//! the signature is (modification time, byte length), not a content hash.
//! A write that preserves both fields within the platform's timestamp
//! resolution is invisible; accepted, because a missed update is caught by
//! the next differing write while a hash would force a full read every poll.

use bridge_traits::storage::{FolderAccess, FolderRef};
use std::sync::Arc;
use tracing::debug;

/// Change-detection token for the sync file.
///
/// Equality of both fields against the previous sample means "unchanged".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSignature {
    /// Last modification time, Unix epoch seconds.
    pub modified_at: i64,

    /// File length in bytes.
    pub length: u64,
}

/// Samples the sync file's signature through a [`FolderAccess`] bridge.
pub struct SignatureDetector {
    folder_access: Arc<dyn FolderAccess>,
    file_name: String,
}

impl SignatureDetector {
    pub fn new(folder_access: Arc<dyn FolderAccess>, file_name: impl Into<String>) -> Self {
        Self {
            folder_access,
            file_name: file_name.into(),
        }
    }

    /// Compute the current signature of the sync file inside the folder.
    ///
    /// Returns `None` when the file does not exist or the probe fails for any
    /// reason (folder unresolvable, stat error). Errors are logged and
    /// swallowed: the next poll retries independently.
    pub async fn probe(&self, folder: &FolderRef) -> Option<FileSignature> {
        match self.folder_access.stat_file(folder, &self.file_name).await {
            Ok(stat) => stat.map(|s| FileSignature {
                modified_at: s.modified_at,
                length: s.length,
            }),
            Err(e) => {
                debug!(folder = %folder, error = %e, "Signature probe failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::storage::FileStat;
    use bytes::Bytes;
    use mockall::mock;

    mock! {
        Folder {}

        #[async_trait]
        impl FolderAccess for Folder {
            async fn file_exists(&self, folder: &FolderRef, name: &str) -> BridgeResult<bool>;
            async fn create_file(&self, folder: &FolderRef, name: &str) -> BridgeResult<()>;
            async fn stat_file(&self, folder: &FolderRef, name: &str) -> BridgeResult<Option<FileStat>>;
            async fn read_file(&self, folder: &FolderRef, name: &str) -> BridgeResult<Bytes>;
            async fn write_file(&self, folder: &FolderRef, name: &str, data: Bytes) -> BridgeResult<()>;
        }
    }

    #[tokio::test]
    async fn test_probe_maps_stat_to_signature() {
        let mut folder_access = MockFolder::new();
        folder_access
            .expect_stat_file()
            .withf(|_, name| name == "progress.json")
            .returning(|_, _| {
                Ok(Some(FileStat {
                    modified_at: 1700000000,
                    length: 42,
                }))
            });

        let detector = SignatureDetector::new(Arc::new(folder_access), "progress.json");
        let sig = detector.probe(&FolderRef::new("/shared")).await.unwrap();
        assert_eq!(sig.modified_at, 1700000000);
        assert_eq!(sig.length, 42);
    }

    #[tokio::test]
    async fn test_probe_missing_file_is_none() {
        let mut folder_access = MockFolder::new();
        folder_access.expect_stat_file().returning(|_, _| Ok(None));

        let detector = SignatureDetector::new(Arc::new(folder_access), "progress.json");
        assert!(detector.probe(&FolderRef::new("/shared")).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_error_is_none() {
        let mut folder_access = MockFolder::new();
        folder_access
            .expect_stat_file()
            .returning(|_, _| Err(BridgeError::FolderUnresolvable("gone".to_string())));

        let detector = SignatureDetector::new(Arc::new(folder_access), "progress.json");
        assert!(detector.probe(&FolderRef::new("/shared")).await.is_none());
    }
}
