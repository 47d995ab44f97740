//! # Conflict Resolution for Imported Progress
//!
//! Merges a peer's progress entries into the local store using per-book
//! last-write-wins: a remote entry is applied only when its timestamp is
//! strictly newer than the local one. Ties keep the local record, so two
//! devices that somehow land on the same millisecond never ping-pong the
//! same payload back and forth.
//!
//! Each entry is validated and merged independently; a malformed or stale
//! entry never blocks its neighbors. Validation and mutation for a single
//! book happen inside the store's atomic update, so a local edit racing the
//! merge cannot be overwritten by a decision taken against stale state.

use crate::payload::ProgressEntry;
use crate::Result;
use chrono::{DateTime, Utc};
use core_library::models::{BookId, ChapterId};
use core_library::store::ProgressStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to a single imported entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The entry updated the local record.
    Applied,
    /// The book id is not a UUID or the entry's chapter id is not a UUID.
    InvalidEntry,
    /// The entry's timestamp is not valid ISO-8601.
    InvalidTimestamp,
    /// No local book with this id exists. Sync never creates books.
    UnknownBook,
    /// The local book is archived; archived books are never resurrected.
    InactiveBook,
    /// The entry is not strictly newer than the local record.
    Stale,
    /// The entry names a chapter the local book does not contain.
    UnknownChapter,
    /// The entry carries a negative playback position.
    InvalidPosition,
}

impl MergeOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, MergeOutcome::Applied)
    }
}

/// Totals for one import cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies imported entries to the [`ProgressStore`].
pub struct ConflictResolver {
    store: Arc<ProgressStore>,
}

impl ConflictResolver {
    pub fn new(store: Arc<ProgressStore>) -> Self {
        Self { store }
    }

    /// Merge a full payload, entry by entry.
    ///
    /// Only store-level failures (a database write going down mid-merge)
    /// abort the cycle; every per-entry rejection is counted and logged.
    pub async fn apply_entries(&self, entries: &[ProgressEntry]) -> Result<MergeReport> {
        let mut report = MergeReport::default();

        for entry in entries {
            let outcome = self.apply_entry(entry).await?;
            if outcome.is_applied() {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }

        debug!(
            applied = report.applied,
            skipped = report.skipped,
            "Merged imported entries"
        );
        Ok(report)
    }

    /// Merge one entry, reporting why it was or was not applied.
    pub async fn apply_entry(&self, entry: &ProgressEntry) -> Result<MergeOutcome> {
        let Ok(book_id) = BookId::from_string(&entry.book_id) else {
            warn!(book_id = %entry.book_id, "Skipping entry with malformed book id");
            return Ok(MergeOutcome::InvalidEntry);
        };
        let Ok(chapter) = ChapterId::from_string(&entry.current_chapter) else {
            warn!(
                book_id = %entry.book_id,
                chapter = %entry.current_chapter,
                "Skipping entry with malformed chapter id"
            );
            return Ok(MergeOutcome::InvalidEntry);
        };
        let Some(remote_ts) = entry.parsed_last_played_at() else {
            warn!(
                book_id = %entry.book_id,
                timestamp = %entry.last_played_at,
                "Skipping entry with unparsable timestamp"
            );
            return Ok(MergeOutcome::InvalidTimestamp);
        };

        // The decision runs inside the store's atomic update so that the
        // local record cannot change between the comparison and the write.
        let mut outcome = MergeOutcome::UnknownBook;
        let position = entry.position_in_chapter;
        self.store
            .update_book(book_id, |book| {
                outcome = Self::decide(book, chapter, position, remote_ts);
                if outcome.is_applied() {
                    book.current_chapter = chapter;
                    book.position_in_chapter = position;
                    book.last_played_at = remote_ts;
                }
            })
            .await?;

        match outcome {
            MergeOutcome::Applied => {
                debug!(book_id = %book_id, chapter = %chapter, "Applied remote progress")
            }
            MergeOutcome::UnknownBook => {
                debug!(book_id = %book_id, "Skipping entry for unknown book")
            }
            MergeOutcome::InactiveBook => {
                debug!(book_id = %book_id, "Skipping entry for archived book")
            }
            MergeOutcome::Stale => {
                debug!(book_id = %book_id, "Skipping entry not newer than local record")
            }
            MergeOutcome::UnknownChapter => {
                warn!(
                    book_id = %book_id,
                    chapter = %chapter,
                    "Skipping entry with chapter missing from local book"
                )
            }
            MergeOutcome::InvalidPosition => {
                warn!(
                    book_id = %book_id,
                    position = position,
                    "Skipping entry with negative playback position"
                )
            }
            MergeOutcome::InvalidEntry | MergeOutcome::InvalidTimestamp => {}
        }

        Ok(outcome)
    }

    fn decide(
        book: &core_library::models::BookContent,
        chapter: ChapterId,
        position: i64,
        remote_ts: DateTime<Utc>,
    ) -> MergeOutcome {
        if !book.is_active {
            return MergeOutcome::InactiveBook;
        }
        if remote_ts <= book.last_played_at {
            return MergeOutcome::Stale;
        }
        if !book.contains_chapter(&chapter) {
            return MergeOutcome::UnknownChapter;
        }
        if position < 0 {
            return MergeOutcome::InvalidPosition;
        }
        MergeOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use core_library::db::create_test_pool;
    use core_library::models::BookContent;

    async fn store_with(book: BookContent) -> Arc<ProgressStore> {
        let pool = create_test_pool().await.unwrap();
        let store = Arc::new(ProgressStore::new(pool).await.unwrap());
        store.upsert_book(book).await.unwrap();
        store
    }

    fn test_book(active: bool) -> BookContent {
        let c1 = ChapterId::new();
        let c2 = ChapterId::new();
        BookContent {
            id: BookId::new(),
            chapters: vec![c1, c2],
            current_chapter: c1,
            position_in_chapter: 1_000,
            last_played_at: "2024-05-01T10:00:00Z".parse().unwrap(),
            is_active: active,
        }
    }

    fn entry_for(book: &BookContent, chapter: ChapterId, ts: DateTime<Utc>) -> ProgressEntry {
        ProgressEntry {
            book_id: book.id.to_string(),
            current_chapter: chapter.to_string(),
            position_in_chapter: 7_500,
            last_played_at: ts.to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_newer_entry_is_applied() {
        let book = test_book(true);
        let store = store_with(book.clone()).await;
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let newer = book.last_played_at + Duration::minutes(5);
        let entry = entry_for(&book, book.chapters[1], newer);

        let outcome = resolver.apply_entry(&entry).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Applied);

        let merged = store.get(book.id).await.unwrap();
        assert_eq!(merged.current_chapter, book.chapters[1]);
        assert_eq!(merged.position_in_chapter, 7_500);
        assert_eq!(merged.last_played_at, newer);
    }

    #[tokio::test]
    async fn test_equal_timestamp_keeps_local() {
        let book = test_book(true);
        let store = store_with(book.clone()).await;
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let entry = entry_for(&book, book.chapters[1], book.last_played_at);
        let outcome = resolver.apply_entry(&entry).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Stale);

        let unchanged = store.get(book.id).await.unwrap();
        assert_eq!(unchanged, book);
    }

    #[tokio::test]
    async fn test_older_entry_is_stale() {
        let book = test_book(true);
        let store = store_with(book.clone()).await;
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let older = book.last_played_at - Duration::hours(1);
        let entry = entry_for(&book, book.chapters[1], older);

        let outcome = resolver.apply_entry(&entry).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Stale);
    }

    #[tokio::test]
    async fn test_unknown_book_is_skipped() {
        let store = store_with(test_book(true)).await;
        let resolver = ConflictResolver::new(store);

        let foreign = test_book(true);
        let entry = entry_for(
            &foreign,
            foreign.chapters[0],
            Utc::now() + Duration::minutes(1),
        );

        let outcome = resolver.apply_entry(&entry).await.unwrap();
        assert_eq!(outcome, MergeOutcome::UnknownBook);
    }

    #[tokio::test]
    async fn test_inactive_book_is_never_resurrected() {
        let book = test_book(false);
        let store = store_with(book.clone()).await;
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let entry = entry_for(
            &book,
            book.chapters[1],
            book.last_played_at + Duration::minutes(5),
        );

        let outcome = resolver.apply_entry(&entry).await.unwrap();
        assert_eq!(outcome, MergeOutcome::InactiveBook);
        assert_eq!(store.get(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn test_unknown_chapter_is_rejected() {
        let book = test_book(true);
        let store = store_with(book.clone()).await;
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let entry = entry_for(
            &book,
            ChapterId::new(),
            book.last_played_at + Duration::minutes(5),
        );

        let outcome = resolver.apply_entry(&entry).await.unwrap();
        assert_eq!(outcome, MergeOutcome::UnknownChapter);
        assert_eq!(store.get(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn test_negative_position_is_rejected() {
        let book = test_book(true);
        let store = store_with(book.clone()).await;
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let mut entry = entry_for(
            &book,
            book.chapters[1],
            book.last_played_at + Duration::minutes(5),
        );
        entry.position_in_chapter = -1;

        let outcome = resolver.apply_entry(&entry).await.unwrap();
        assert_eq!(outcome, MergeOutcome::InvalidPosition);
        assert_eq!(store.get(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn test_malformed_ids_and_timestamps_are_counted_not_fatal() {
        let book = test_book(true);
        let store = store_with(book.clone()).await;
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let good = entry_for(
            &book,
            book.chapters[1],
            book.last_played_at + Duration::minutes(5),
        );
        let bad_id = ProgressEntry {
            book_id: "not-a-uuid".to_string(),
            ..good.clone()
        };
        let bad_ts = ProgressEntry {
            last_played_at: "whenever".to_string(),
            ..good.clone()
        };

        let report = resolver
            .apply_entries(&[bad_id, bad_ts, good])
            .await
            .unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn test_one_bad_entry_does_not_block_others() {
        let book_a = test_book(true);
        let book_b = test_book(true);
        let pool = create_test_pool().await.unwrap();
        let store = Arc::new(ProgressStore::new(pool).await.unwrap());
        store.upsert_book(book_a.clone()).await.unwrap();
        store.upsert_book(book_b.clone()).await.unwrap();
        let resolver = ConflictResolver::new(Arc::clone(&store));

        let newer = book_a.last_played_at + Duration::minutes(5);
        let bad = entry_for(&book_a, ChapterId::new(), newer);
        let good = entry_for(&book_b, book_b.chapters[1], newer);

        let report = resolver.apply_entries(&[bad, good]).await.unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);

        let merged = store.get(book_b.id).await.unwrap();
        assert_eq!(merged.current_chapter, book_b.chapters[1]);
    }
}
