//! # Import Pipeline
//!
//! Polls the sync file in the configured folder and merges peer progress
//! into the local store through the [`ConflictResolver`].
//!
//! ## Change detection
//!
//! Shared folders give no change notifications, so the pipeline polls on a
//! fixed interval. Each tick samples the file's [`FileSignature`]; the file
//! is read and merged only when the signature differs from the previous
//! sample. Appearance and disappearance of the file both count as changes.
//!
//! ## Folder switching
//!
//! The folder preference is a watch channel; the pipeline follows the latest
//! value. Switching folders abandons the old folder's polling state entirely,
//! and a redundant re-emission of the same folder does not reset it.

use crate::conflict_resolver::{ConflictResolver, MergeReport};
use crate::payload::decode_payload;
use crate::signature::{FileSignature, SignatureDetector};
use crate::Result;
use bridge_traits::storage::{FolderAccess, FolderRef};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polling importer of peer progress from the shared folder.
pub struct ImportPipeline {
    folder_rx: watch::Receiver<Option<FolderRef>>,
    folder_access: Arc<dyn FolderAccess>,
    detector: SignatureDetector,
    resolver: ConflictResolver,
    events: EventBus,
    poll_interval: Duration,
    file_name: String,
}

impl ImportPipeline {
    pub fn new(
        folder_rx: watch::Receiver<Option<FolderRef>>,
        folder_access: Arc<dyn FolderAccess>,
        resolver: ConflictResolver,
        events: EventBus,
        poll_interval: Duration,
        file_name: impl Into<String>,
    ) -> Self {
        let file_name = file_name.into();
        let detector = SignatureDetector::new(Arc::clone(&folder_access), file_name.clone());
        Self {
            folder_rx,
            folder_access,
            detector,
            resolver,
            events,
            poll_interval,
            file_name,
        }
    }

    /// Run until cancelled or until the preference channel closes.
    pub async fn run(mut self, cancel: CancellationToken) {
        debug!("Import pipeline running");
        let mut current: Option<FolderRef> = None;

        loop {
            let latest = self.folder_rx.borrow_and_update().clone();
            if latest == current {
                // Same folder re-emitted (or still unset): polling state for
                // it is already live, wait for an actual change.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = self.folder_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }
            current = latest.clone();

            let Some(folder) = latest else {
                debug!("Sync folder cleared, import disabled");
                continue;
            };

            if self.watch_folder(&folder, &cancel).await {
                break;
            }
        }
        debug!("Import pipeline stopped");
    }

    /// Poll one folder until the preference changes.
    ///
    /// Returns `true` when the pipeline should stop entirely.
    async fn watch_folder(&mut self, folder: &FolderRef, cancel: &CancellationToken) -> bool {
        info!(folder = %folder, "Watching sync folder");

        // Baseline signature; an existing file is imported immediately so a
        // fresh device catches up without waiting for the peer's next write.
        let mut last_sig: Option<FileSignature> = self.detector.probe(folder).await;
        if last_sig.is_some() {
            self.run_cycle(folder).await;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return true,
                changed = self.folder_rx.changed() => {
                    if changed.is_err() {
                        return true;
                    }
                    // A re-emission of the folder already being watched keeps
                    // the sequence (and its signature state) running; only a
                    // genuinely different value ends it.
                    if self.folder_rx.borrow_and_update().as_ref() == Some(folder) {
                        continue;
                    }
                    return false;
                }
                _ = time::sleep(self.poll_interval) => {
                    let sig = self.detector.probe(folder).await;
                    if sig != last_sig {
                        last_sig = sig;
                        if sig.is_some() {
                            self.run_cycle(folder).await;
                        } else {
                            debug!(folder = %folder, "Sync file disappeared");
                        }
                    }
                }
            }
        }
    }

    /// One read-decode-merge cycle. Failures are reported and dropped; the
    /// next signature change retries independently.
    async fn run_cycle(&self, folder: &FolderRef) {
        match self.import_once(folder).await {
            Ok(report) => {
                info!(
                    folder = %folder,
                    applied = report.applied,
                    skipped = report.skipped,
                    "Imported progress from sync file"
                );
                self.events
                    .emit(CoreEvent::Sync(SyncEvent::ImportCompleted {
                        folder: folder.to_string(),
                        entries_applied: report.applied,
                        entries_skipped: report.skipped,
                    }))
                    .ok();
            }
            Err(e) => {
                warn!(folder = %folder, error = %e, "Import cycle failed");
                self.events
                    .emit(CoreEvent::Sync(SyncEvent::ImportFailed {
                        folder: folder.to_string(),
                        message: e.to_string(),
                    }))
                    .ok();
            }
        }
    }

    async fn import_once(&self, folder: &FolderRef) -> Result<MergeReport> {
        let data = self.folder_access.read_file(folder, &self.file_name).await?;
        let entries = decode_payload(&data)?;
        self.resolver.apply_entries(&entries).await
    }
}
