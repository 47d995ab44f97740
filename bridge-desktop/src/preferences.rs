//! Sync Preference Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    preferences::PreferenceStore,
    storage::FolderRef,
};
use sqlx::{sqlite::SqlitePool, Row};
use tokio::sync::{watch, Mutex};
use tracing::debug;

const SYNC_FOLDER_KEY: &str = "sync_folder";

/// SQLite-backed preference store.
///
/// Persists the sync folder reference in a `settings` row and broadcasts
/// every replacement over a watch channel. Replacements are serialized by an
/// internal mutex so the persisted value and the broadcast value never
/// diverge under concurrent callers.
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
    tx: watch::Sender<Option<FolderRef>>,
    write_guard: Mutex<()>,
}

impl SqlitePreferenceStore {
    /// Create a preference store over the given pool, loading the persisted
    /// folder reference if one exists.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;

        let initial = Self::load(&pool).await?;
        debug!(folder = ?initial, "Loaded sync folder preference");
        let (tx, _) = watch::channel(initial);

        Ok(Self {
            pool,
            tx,
            write_guard: Mutex::new(()),
        })
    }

    /// Create an in-memory preference store (for testing).
    ///
    /// Capped at one connection: each SQLite in-memory connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;
        Self::new(pool).await
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    async fn load(pool: &SqlitePool) -> Result<Option<FolderRef>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(SYNC_FOLDER_KEY)
            .fetch_optional(pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to get setting: {}", e)))?;

        Ok(row.map(|row| FolderRef::new(row.get::<String, _>(0))))
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    fn watch_sync_folder(&self) -> watch::Receiver<Option<FolderRef>> {
        self.tx.subscribe()
    }

    async fn set_sync_folder(&self, folder: Option<FolderRef>) -> Result<()> {
        let _guard = self.write_guard.lock().await;

        match &folder {
            Some(folder_ref) => {
                sqlx::query(
                    r#"
                    INSERT INTO settings (key, value, updated_at)
                    VALUES (?, ?, ?)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(SYNC_FOLDER_KEY)
                .bind(folder_ref.as_str())
                .bind(Self::now())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    BridgeError::OperationFailed(format!("Failed to set setting: {}", e))
                })?;
            }
            None => {
                sqlx::query("DELETE FROM settings WHERE key = ?")
                    .bind(SYNC_FOLDER_KEY)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        BridgeError::OperationFailed(format!("Failed to delete setting: {}", e))
                    })?;
            }
        }

        debug!(folder = ?folder, "Stored sync folder preference");
        self.tx.send_replace(folder);
        Ok(())
    }
}
