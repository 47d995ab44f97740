//! # Local Progress Store
//!
//! The application's source of truth for book playback state.
//!
//! ## Overview
//!
//! The store keeps every book in memory behind an async `RwLock`, writes each
//! change through to SQLite, and broadcasts the active book list over a
//! `tokio::sync::watch` channel so the export pipeline can react to edits.
//!
//! ## Atomicity
//!
//! All mutation goes through [`ProgressStore::update_book`], a read-modify-write
//! that runs entirely under the store's write lock. Concurrent local edits and
//! an in-flight import merge for the same book therefore serialize; lost
//! updates are impossible at this boundary. The coordinator holds no locks of
//! its own.

use crate::models::{BookContent, BookId, ChapterId};
use crate::{LibraryError, Result};
use chrono::TimeZone;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tokio::sync::{watch, RwLock};
use tracing::debug;

/// Local progress store backed by SQLite with an in-memory working set.
pub struct ProgressStore {
    pool: SqlitePool,
    books: RwLock<HashMap<BookId, BookContent>>,
    active_tx: watch::Sender<Vec<BookContent>>,
}

impl ProgressStore {
    /// Create a store over the given pool, loading all persisted books.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let books = Self::load_all(&pool).await?;
        debug!(count = books.len(), "Loaded books from database");

        let map: HashMap<BookId, BookContent> =
            books.into_iter().map(|b| (b.id, b)).collect();
        let (active_tx, _) = watch::channel(Self::active_snapshot(&map));

        Ok(Self {
            pool,
            books: RwLock::new(map),
            active_tx,
        })
    }

    /// Subscribe to the list of active books.
    ///
    /// The receiver yields the current list immediately and a fresh snapshot
    /// after every store mutation. Snapshots are sorted by book id so that an
    /// unchanged library always serializes to the same payload.
    pub fn watch_active_books(&self) -> watch::Receiver<Vec<BookContent>> {
        self.active_tx.subscribe()
    }

    /// Current list of active books, sorted by book id.
    pub async fn active_books(&self) -> Vec<BookContent> {
        let books = self.books.read().await;
        Self::active_snapshot(&books)
    }

    /// Look up a single book.
    pub async fn get(&self, id: BookId) -> Option<BookContent> {
        self.books.read().await.get(&id).cloned()
    }

    /// Insert or replace a book record.
    ///
    /// This is the library-management entry point (adding a book, archiving
    /// one by flipping `is_active`); sync merges go through [`Self::update_book`].
    pub async fn upsert_book(&self, book: BookContent) -> Result<()> {
        let mut books = self.books.write().await;
        self.persist(&book).await?;
        books.insert(book.id, book);
        self.active_tx.send_replace(Self::active_snapshot(&books));
        Ok(())
    }

    /// Atomically update a book by id with a transform that may be a no-op.
    ///
    /// The lookup, the transform, the database write, and the broadcast all
    /// happen under the store's write lock. Returns `Ok(true)` when the
    /// transform changed the record, `Ok(false)` when the book is unknown or
    /// the transform left it untouched. A failed database write leaves the
    /// in-memory record unchanged.
    pub async fn update_book<F>(&self, id: BookId, transform: F) -> Result<bool>
    where
        F: FnOnce(&mut BookContent),
    {
        let mut books = self.books.write().await;

        let Some(current) = books.get(&id) else {
            return Ok(false);
        };

        let mut updated = current.clone();
        transform(&mut updated);

        if updated == *current {
            return Ok(false);
        }
        // The id is the map key; transforms must not rewrite it.
        debug_assert_eq!(updated.id, id);

        self.persist(&updated).await?;
        books.insert(id, updated);
        self.active_tx.send_replace(Self::active_snapshot(&books));
        Ok(true)
    }

    fn active_snapshot(books: &HashMap<BookId, BookContent>) -> Vec<BookContent> {
        let mut active: Vec<BookContent> =
            books.values().filter(|b| b.is_active).cloned().collect();
        active.sort_by_key(|b| b.id);
        active
    }

    async fn persist(&self, book: &BookContent) -> Result<()> {
        let chapters = serde_json::to_string(&book.chapters).map_err(|e| {
            LibraryError::InvalidStoredValue {
                field: "chapters".to_string(),
                message: e.to_string(),
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO books (id, chapters, current_chapter, position_ms, last_played_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                chapters = excluded.chapters,
                current_chapter = excluded.current_chapter,
                position_ms = excluded.position_ms,
                last_played_at = excluded.last_played_at,
                is_active = excluded.is_active
            "#,
        )
        .bind(book.id.to_string())
        .bind(chapters)
        .bind(book.current_chapter.to_string())
        .bind(book.position_in_chapter)
        .bind(book.last_played_at.timestamp_millis())
        .bind(book.is_active)
        .execute(&self.pool)
        .await
        .map_err(LibraryError::Database)?;

        Ok(())
    }

    async fn load_all(pool: &SqlitePool) -> Result<Vec<BookContent>> {
        let rows = sqlx::query(
            "SELECT id, chapters, current_chapter, position_ms, last_played_at, is_active FROM books",
        )
        .fetch_all(pool)
        .await
        .map_err(LibraryError::Database)?;

        rows.into_iter().map(Self::row_to_book).collect()
    }

    fn row_to_book(row: sqlx::sqlite::SqliteRow) -> Result<BookContent> {
        let id: String = row.get("id");
        let chapters_json: String = row.get("chapters");
        let current_chapter: String = row.get("current_chapter");
        let position_ms: i64 = row.get("position_ms");
        let last_played_ms: i64 = row.get("last_played_at");
        let is_active: bool = row.get("is_active");

        let invalid = |field: &str, message: String| LibraryError::InvalidStoredValue {
            field: field.to_string(),
            message,
        };

        let chapters: Vec<ChapterId> =
            serde_json::from_str(&chapters_json).map_err(|e| invalid("chapters", e.to_string()))?;

        Ok(BookContent {
            id: BookId::from_string(&id).map_err(|e| invalid("id", e.to_string()))?,
            chapters,
            current_chapter: ChapterId::from_string(&current_chapter)
                .map_err(|e| invalid("current_chapter", e.to_string()))?,
            position_in_chapter: position_ms,
            last_played_at: chrono::Utc
                .timestamp_millis_opt(last_played_ms)
                .single()
                .ok_or_else(|| invalid("last_played_at", format!("{last_played_ms}")))?,
            is_active,
        })
    }
}
