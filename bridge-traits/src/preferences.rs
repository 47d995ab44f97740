//! Preference Storage Abstraction
//!
//! The sync core needs exactly one preference from the host: the optional
//! reference to the user-chosen sync folder. Consumers observe it reactively
//! so pipelines can react to the user enabling, switching, or disabling sync.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::storage::FolderRef;

/// Reactive preference store for the sync folder reference.
///
/// Implementations own the persistence of the reference (SQLite row, platform
/// preferences, config file) and broadcast every replacement through a watch
/// channel. `None` means sync is disabled.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::preferences::PreferenceStore;
///
/// async fn enable(store: &dyn PreferenceStore) -> Result<()> {
///     store.set_sync_folder(Some(FolderRef::new("/shared/audiobooks"))).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Subscribe to the sync folder reference.
    ///
    /// The receiver yields the current value immediately on first poll and
    /// every subsequent replacement. Replacing with an equal value still
    /// produces an emission; consumers that care apply their own
    /// distinct-until-changed filtering.
    fn watch_sync_folder(&self) -> watch::Receiver<Option<FolderRef>>;

    /// Atomically replace the stored folder reference.
    ///
    /// `None` clears the preference and disables sync.
    async fn set_sync_folder(&self, folder: Option<FolderRef>) -> Result<()>;
}
