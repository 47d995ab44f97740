//! # Sync Coordinator
//!
//! Owns the lifecycle of the export and import pipelines. `start` launches
//! both as independent tasks exactly once per coordinator; `shutdown` cancels
//! them cooperatively. The pipelines share no state beyond the progress
//! store, the folder preference channel, and the folder access bridge, and
//! one pipeline failing or panicking never takes the other down.

use crate::conflict_resolver::ConflictResolver;
use crate::export::ExportPipeline;
use crate::import::ImportPipeline;
use crate::payload::SYNC_FILE_NAME;
use bridge_traits::preferences::PreferenceStore;
use bridge_traits::storage::FolderAccess;
use core_library::store::ProgressStore;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Timing and naming knobs for the sync pipelines.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period before the export pipeline writes a snapshot.
    pub debounce_window: Duration,

    /// How often the import pipeline samples the sync file's signature.
    pub poll_interval: Duration,

    /// Name of the sync file inside the shared folder.
    pub file_name: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_secs(1),
            poll_interval: Duration::from_secs(5),
            file_name: SYNC_FILE_NAME.to_string(),
        }
    }
}

/// Single-shot owner of the export and import tasks.
///
/// A coordinator starts at most once; after `shutdown` it stays stopped, and
/// resuming sync means building a fresh coordinator over the same
/// dependencies.
pub struct SyncCoordinator {
    store: Arc<ProgressStore>,
    preferences: Arc<dyn PreferenceStore>,
    folder_access: Arc<dyn FolderAccess>,
    events: EventBus,
    config: SyncConfig,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<ProgressStore>,
        preferences: Arc<dyn PreferenceStore>,
        folder_access: Arc<dyn FolderAccess>,
        events: EventBus,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            preferences,
            folder_access,
            events,
            config,
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Launch the export and import pipelines.
    ///
    /// Must be called from within a Tokio runtime. Repeated calls are no-ops:
    /// the first caller wins and duplicates are logged and ignored.
    pub fn start(&self) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Sync coordinator already started, ignoring");
            return;
        }

        let export = ExportPipeline::new(
            self.preferences.watch_sync_folder(),
            self.store.watch_active_books(),
            Arc::clone(&self.folder_access),
            self.events.clone(),
            self.config.debounce_window,
            self.config.file_name.clone(),
        );
        let import = ImportPipeline::new(
            self.preferences.watch_sync_folder(),
            Arc::clone(&self.folder_access),
            ConflictResolver::new(Arc::clone(&self.store)),
            self.events.clone(),
            self.config.poll_interval,
            self.config.file_name.clone(),
        );

        Self::spawn_supervised("export", export.run(self.cancel.clone()));
        Self::spawn_supervised("import", import.run(self.cancel.clone()));

        info!(
            debounce_ms = self.config.debounce_window.as_millis() as u64,
            poll_ms = self.config.poll_interval.as_millis() as u64,
            file = %self.config.file_name,
            "Sync coordinator started"
        );
        self.events.emit(CoreEvent::Sync(SyncEvent::Started)).ok();
    }

    /// Whether `start` has run.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Cancel both pipelines. Idempotent; safe to call before `start`.
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        info!("Sync coordinator shut down");
        self.events.emit(CoreEvent::Sync(SyncEvent::Stopped)).ok();
    }

    /// Spawn a pipeline with a watchdog that records a panic without
    /// affecting its sibling.
    fn spawn_supervised<F>(name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!(task = name, "Sync task panicked: {:?}", e);
                }
            }
        });
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
