//! # Export Pipeline
//!
//! Watches the sync folder preference and the active book list, and writes
//! the combined latest snapshot to the sync file after a quiet period.
//!
//! ## Debounce
//!
//! Playback position updates arrive continuously while the user listens.
//! Every emission re-arms a single trailing deadline; the snapshot is
//! serialized only once the inputs have been quiet for the debounce window,
//! so a burst of edits produces one write.
//!
//! ## Write deduplication
//!
//! The pipeline remembers the target folder and payload text of its last
//! successful write and skips the write when the next flush would repeat
//! both. This is what breaks the echo loop: an import that merges a peer's
//! file changes local state, local state re-serializes to the same text the
//! peer already wrote, and the export is suppressed. A newly chosen folder
//! never matches the memo, so it always receives a file.

use crate::payload::encode_payload;
use bridge_traits::storage::{FolderAccess, FolderRef};
use bytes::Bytes;
use core_library::models::BookContent;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Debounced exporter of local progress to the shared folder.
pub struct ExportPipeline {
    folder_rx: watch::Receiver<Option<FolderRef>>,
    books_rx: watch::Receiver<Vec<BookContent>>,
    folder_access: Arc<dyn FolderAccess>,
    events: EventBus,
    debounce_window: Duration,
    file_name: String,
}

impl ExportPipeline {
    pub fn new(
        folder_rx: watch::Receiver<Option<FolderRef>>,
        books_rx: watch::Receiver<Vec<BookContent>>,
        folder_access: Arc<dyn FolderAccess>,
        events: EventBus,
        debounce_window: Duration,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            folder_rx,
            books_rx,
            folder_access,
            events,
            debounce_window,
            file_name: file_name.into(),
        }
    }

    /// Run until cancelled or until both input channels close.
    ///
    /// Failed writes are reported and dropped; the next input emission
    /// schedules a fresh attempt.
    pub async fn run(mut self, cancel: CancellationToken) {
        // The initial combined snapshot counts as an emission, so a freshly
        // started pipeline exports once after the first quiet window.
        let mut pending = true;
        let mut deadline = Instant::now() + self.debounce_window;
        let mut last_written: Option<(FolderRef, String)> = None;

        debug!("Export pipeline running");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = self.folder_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    pending = true;
                    deadline = Instant::now() + self.debounce_window;
                }
                changed = self.books_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    pending = true;
                    deadline = Instant::now() + self.debounce_window;
                }
                _ = time::sleep_until(deadline), if pending => {
                    pending = false;
                    self.flush(&mut last_written).await;
                }
            }
        }
        debug!("Export pipeline stopped");
    }

    /// Serialize the latest snapshot and write it out unless it is a
    /// duplicate of the previous write or export is disabled.
    async fn flush(&mut self, last_written: &mut Option<(FolderRef, String)>) {
        let Some(folder) = self.folder_rx.borrow_and_update().clone() else {
            debug!("No sync folder configured, skipping export");
            return;
        };
        let books = self.books_rx.borrow_and_update().clone();

        let payload = match encode_payload(&books) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize progress payload");
                self.events
                    .emit(CoreEvent::Sync(SyncEvent::ExportFailed {
                        folder: folder.to_string(),
                        message: e.to_string(),
                    }))
                    .ok();
                return;
            }
        };

        // The memo is keyed on the target folder as well as the text, so a
        // newly selected folder always receives a file even when the payload
        // never changed, and even when the folder switch lands between the
        // debounce deadline firing and this read.
        if last_written
            .as_ref()
            .is_some_and(|(f, p)| *f == folder && *p == payload)
        {
            debug!(folder = %folder, "Payload unchanged, skipping write");
            return;
        }

        match self.write(&folder, &payload).await {
            Ok(()) => {
                info!(
                    folder = %folder,
                    books = books.len(),
                    bytes = payload.len(),
                    "Exported progress to sync file"
                );
                self.events
                    .emit(CoreEvent::Sync(SyncEvent::ExportCompleted {
                        folder: folder.to_string(),
                        books: books.len(),
                        bytes: payload.len(),
                    }))
                    .ok();
                *last_written = Some((folder, payload));
            }
            Err(e) => {
                warn!(folder = %folder, error = %e, "Failed to write sync file");
                self.events
                    .emit(CoreEvent::Sync(SyncEvent::ExportFailed {
                        folder: folder.to_string(),
                        message: e.to_string(),
                    }))
                    .ok();
            }
        }
    }

    async fn write(&self, folder: &FolderRef, payload: &str) -> bridge_traits::error::Result<()> {
        if !self
            .folder_access
            .file_exists(folder, &self.file_name)
            .await?
        {
            self.folder_access.create_file(folder, &self.file_name).await?;
        }
        self.folder_access
            .write_file(folder, &self.file_name, Bytes::from(payload.to_owned()))
            .await
    }
}
