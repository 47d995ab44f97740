//! End-to-end sync through a real directory, desktop shims included.

#![cfg(feature = "desktop-shims")]

use bridge_traits::storage::FolderRef;
use chrono::Utc;
use core_library::models::{BookContent, BookId, ChapterId};
use core_library::DatabaseConfig;
use core_service::{bootstrap_desktop, CoreService};
use core_sync::{SyncConfig, SYNC_FILE_NAME};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;

fn fast_config() -> SyncConfig {
    SyncConfig {
        debounce_window: Duration::from_millis(50),
        poll_interval: Duration::from_millis(100),
        file_name: SYNC_FILE_NAME.to_string(),
    }
}

async fn shared_dir(tag: &str) -> (FolderRef, PathBuf) {
    let dir = std::env::temp_dir().join(format!("core-service-{}-{}", tag, std::process::id()));
    fs::create_dir_all(&dir).await.unwrap();
    (FolderRef::new(dir.to_string_lossy().to_string()), dir)
}

async fn service() -> CoreService {
    bootstrap_desktop(DatabaseConfig::in_memory(), fast_config())
        .await
        .unwrap()
}

async fn wait_for<F, Fut>(what: &str, condition: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for {}", what);
}

#[tokio::test]
async fn test_progress_written_to_and_read_from_shared_folder() {
    let (folder, dir) = shared_dir("e2e").await;
    let sync_file = dir.join(SYNC_FILE_NAME);

    let id = BookId::new();
    let c1 = ChapterId::new();
    let c2 = ChapterId::new();

    // Device one: ahead, exports into the folder.
    let ahead = BookContent {
        id,
        chapters: vec![c1, c2],
        current_chapter: c2,
        position_in_chapter: 42_000,
        last_played_at: Utc::now(),
        is_active: true,
    };
    let device_one = service().await;
    device_one.library().upsert_book(ahead.clone()).await.unwrap();
    device_one.set_sync_folder(Some(folder.clone())).await.unwrap();
    device_one.start_sync();
    assert!(device_one.is_sync_started());

    wait_for("sync file to be written", || {
        let sync_file = sync_file.clone();
        async move { fs::try_exists(&sync_file).await.unwrap_or(false) }
    })
    .await;

    // Device two: behind, imports from the folder.
    let behind = BookContent {
        current_chapter: c1,
        position_in_chapter: 1_000,
        last_played_at: ahead.last_played_at - chrono::Duration::hours(1),
        ..ahead.clone()
    };
    let device_two = service().await;
    device_two.library().upsert_book(behind).await.unwrap();
    device_two.set_sync_folder(Some(folder)).await.unwrap();
    device_two.start_sync();

    let library_two = device_two.library();
    wait_for("device two to adopt the newer progress", || {
        let library = library_two.clone();
        async move {
            let book = library.get(id).await.unwrap();
            book.current_chapter == c2 && book.position_in_chapter == 42_000
        }
    })
    .await;

    device_one.shutdown_sync();
    device_two.shutdown_sync();
    fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_sync_stays_idle_without_a_folder() {
    let device = service().await;
    device.start_sync();

    let chapter = ChapterId::new();
    let book = BookContent {
        id: BookId::new(),
        chapters: vec![chapter],
        current_chapter: chapter,
        position_in_chapter: 0,
        last_played_at: Utc::now(),
        is_active: true,
    };
    // No folder configured: nothing to write to, nothing breaks.
    device.library().upsert_book(book.clone()).await.unwrap();
    sleep(Duration::from_millis(300)).await;

    assert_eq!(device.library().get(book.id).await.unwrap(), book);
    device.shutdown_sync();
}
