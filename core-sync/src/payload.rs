//! Wire Format for the Sync File
//!
//! The sync file is a UTF-8 JSON array of progress entries, one per active
//! book. Entries are transient: they exist only while serializing local state
//! or deserializing a peer's file.
//!
//! ```json
//! [
//!   {
//!     "bookId": "0c5e…",
//!     "currentChapter": "9f2a…",
//!     "positionInChapter": 5000,
//!     "lastPlayedAt": "2024-05-01T10:15:00.000Z"
//!   }
//! ]
//! ```
//!
//! Entry ordering follows the progress store's iteration order (sorted by
//! book id) and carries no meaning: import applies entries independently.
//! An empty array is a valid file (no active books).

use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use core_library::models::BookContent;
use serde::{Deserialize, Serialize};

/// Fixed name of the sync file inside the shared folder.
pub const SYNC_FILE_NAME: &str = "audiobook-progress.json";

/// MIME type of the sync file, for hosts whose folder APIs require one.
pub const SYNC_FILE_MIME: &str = "application/json";

/// One book's progress as it travels through the sync file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    /// Book identifier.
    pub book_id: String,

    /// Chapter the peer was playing.
    pub current_chapter: String,

    /// Position inside that chapter, in milliseconds.
    pub position_in_chapter: i64,

    /// When the peer last played the book, ISO-8601.
    pub last_played_at: String,
}

impl ProgressEntry {
    /// Build the wire record for a local book.
    pub fn from_book(book: &BookContent) -> Self {
        Self {
            book_id: book.id.to_string(),
            current_chapter: book.current_chapter.to_string(),
            position_in_chapter: book.position_in_chapter,
            last_played_at: book
                .last_played_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Parse the entry's timestamp; `None` when it is not valid ISO-8601.
    pub fn parsed_last_played_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_played_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Serialize the active book list into the canonical payload text.
pub fn encode_payload(books: &[BookContent]) -> Result<String> {
    let entries: Vec<ProgressEntry> = books.iter().map(ProgressEntry::from_book).collect();
    Ok(serde_json::to_string(&entries)?)
}

/// Deserialize a sync file's contents.
pub fn decode_payload(data: &[u8]) -> Result<Vec<ProgressEntry>> {
    Ok(serde_json::from_slice(data)?)
}
