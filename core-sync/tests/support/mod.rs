//! Shared fixtures for the pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::preferences::PreferenceStore;
use bridge_traits::storage::{FileStat, FolderAccess, FolderRef};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::models::{BookContent, BookId, ChapterId};
use core_library::store::ProgressStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// In-memory folder access shared by every "device" in a test.
///
/// Each write bumps a monotonic clock that doubles as the file's modification
/// time, so two writes always produce distinct signatures regardless of
/// content length.
#[derive(Default)]
pub struct MemoryFolderAccess {
    files: Mutex<HashMap<(String, String), (Bytes, i64)>>,
    clock: AtomicI64,
    writes: AtomicUsize,
    reads: AtomicUsize,
}

impl MemoryFolderAccess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn contents(&self, folder: &FolderRef, name: &str) -> Option<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(&(folder.to_string(), name.to_string()))
            .map(|(data, _)| data.clone())
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl FolderAccess for MemoryFolderAccess {
    async fn file_exists(&self, folder: &FolderRef, name: &str) -> BridgeResult<bool> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .contains_key(&(folder.to_string(), name.to_string())))
    }

    async fn create_file(&self, folder: &FolderRef, name: &str) -> BridgeResult<()> {
        let version = self.tick();
        self.files
            .lock()
            .unwrap()
            .entry((folder.to_string(), name.to_string()))
            .or_insert((Bytes::new(), version));
        Ok(())
    }

    async fn stat_file(&self, folder: &FolderRef, name: &str) -> BridgeResult<Option<FileStat>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&(folder.to_string(), name.to_string()))
            .map(|(data, version)| FileStat {
                modified_at: *version,
                length: data.len() as u64,
            }))
    }

    async fn read_file(&self, folder: &FolderRef, name: &str) -> BridgeResult<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .get(&(folder.to_string(), name.to_string()))
            .map(|(data, _)| data.clone())
            .ok_or_else(|| BridgeError::FileNotFound(name.to_string()))
    }

    async fn write_file(&self, folder: &FolderRef, name: &str, data: Bytes) -> BridgeResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let version = self.tick();
        self.files
            .lock()
            .unwrap()
            .insert((folder.to_string(), name.to_string()), (data, version));
        Ok(())
    }
}

/// Preference store over a bare watch channel, no persistence.
pub struct ChannelPreferenceStore {
    tx: watch::Sender<Option<FolderRef>>,
}

impl ChannelPreferenceStore {
    pub fn new(initial: Option<FolderRef>) -> Arc<Self> {
        let (tx, _) = watch::channel(initial);
        Arc::new(Self { tx })
    }
}

#[async_trait]
impl PreferenceStore for ChannelPreferenceStore {
    fn watch_sync_folder(&self) -> watch::Receiver<Option<FolderRef>> {
        self.tx.subscribe()
    }

    async fn set_sync_folder(&self, folder: Option<FolderRef>) -> BridgeResult<()> {
        self.tx.send_replace(folder);
        Ok(())
    }
}

pub async fn fresh_store() -> Arc<ProgressStore> {
    // SQLite work runs on a thread the runtime cannot see; under paused
    // virtual time the runtime auto-advances past the pool's acquire timeout
    // while waiting for it. Run setup on real time, and give the pool an
    // effectively unlimited acquire timeout so later acquires survive the
    // auto-advance churn until the SQLite thread responds.
    tokio::time::resume();
    let config =
        DatabaseConfig::in_memory().acquire_timeout(std::time::Duration::from_secs(86_400 * 365));
    let pool = create_pool(config).await.unwrap();
    let store = Arc::new(ProgressStore::new(pool).await.unwrap());
    tokio::time::pause();
    store
}

pub fn book_at(
    id: BookId,
    chapters: &[ChapterId],
    current: ChapterId,
    position: i64,
    played_at: DateTime<Utc>,
) -> BookContent {
    BookContent {
        id,
        chapters: chapters.to_vec(),
        current_chapter: current,
        position_in_chapter: position,
        last_played_at: played_at,
        is_active: true,
    }
}

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}
