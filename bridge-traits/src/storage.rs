//! Shared-Folder Access Abstraction
//!
//! Provides a platform-agnostic trait for the single capability the sync core
//! needs from a host: resolving a user-chosen folder reference to a file that
//! can be probed, read, and overwritten.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Opaque reference to a user-chosen shared folder.
///
/// The string payload is meaningful only to the `FolderAccess` implementation
/// that issued it (a directory path on desktop, a document-tree URI on
/// mobile). The core treats it as an equality-comparable token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderRef(pub String);

impl FolderRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FolderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cheap change-detection sample for a file inside a shared folder.
///
/// Modification time plus byte length, not a content hash. Two writes that
/// preserve both fields within the platform's timestamp resolution are
/// indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Last modification time, Unix epoch seconds.
    pub modified_at: i64,

    /// File length in bytes.
    pub length: u64,
}

/// Shared-folder access trait
///
/// Abstracts folder/file operations so the sync coordinator stays independent
/// of how each platform grants access to a user-chosen directory:
/// - Desktop: plain filesystem paths
/// - Android: Storage Access Framework tree URIs
/// - iOS: security-scoped bookmarks
///
/// Every operation may fail at any time (permission revoked, folder deleted,
/// drive unmounted); all failures are recoverable and callers are expected to
/// retry on their next cycle.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{FolderAccess, FolderRef};
///
/// async fn overwrite(fs: &dyn FolderAccess, folder: &FolderRef) -> Result<()> {
///     fs.write_file(folder, "progress.json", b"[]".as_ref().into()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FolderAccess: Send + Sync {
    /// Check whether a file with the given name exists inside the folder.
    async fn file_exists(&self, folder: &FolderRef, name: &str) -> Result<bool>;

    /// Create an empty file with the given name inside the folder.
    ///
    /// Succeeds if the file already exists.
    async fn create_file(&self, folder: &FolderRef, name: &str) -> Result<()>;

    /// Stat a file inside the folder.
    ///
    /// Returns `Ok(None)` when the file does not exist; errors are reserved
    /// for an unresolvable folder or a failing stat call.
    async fn stat_file(&self, folder: &FolderRef, name: &str) -> Result<Option<FileStat>>;

    /// Read the entire contents of a file inside the folder.
    async fn read_file(&self, folder: &FolderRef, name: &str) -> Result<Bytes>;

    /// Overwrite a file inside the folder with the given contents,
    /// creating it if absent and truncating it otherwise.
    async fn write_file(&self, folder: &FolderRef, name: &str, data: Bytes) -> Result<()>;
}
