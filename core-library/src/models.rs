//! Domain models for the audiobook library
//!
//! Book records are owned exclusively by the [`ProgressStore`](crate::store::ProgressStore);
//! everything else receives clones and mutates only through its atomic
//! update-by-id primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(pub Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a chapter, unique within its book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterId(pub Uuid);

impl ChapterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ChapterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Book Content
// =============================================================================

/// Playback state of a single book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookContent {
    /// Book identifier.
    pub id: BookId,

    /// Chapter identifiers in playback order.
    pub chapters: Vec<ChapterId>,

    /// The chapter currently being played. Always a member of `chapters`.
    pub current_chapter: ChapterId,

    /// Playback position inside the current chapter, in milliseconds (>= 0).
    pub position_in_chapter: i64,

    /// When this book was last played.
    pub last_played_at: DateTime<Utc>,

    /// Whether the book is still tracked by the user's library.
    /// Archived or deleted books stay around with `is_active = false`
    /// and are never resurrected by a sync merge.
    pub is_active: bool,
}

impl BookContent {
    /// Whether the given chapter belongs to this book's chapter set.
    pub fn contains_chapter(&self, chapter: &ChapterId) -> bool {
        self.chapters.contains(chapter)
    }
}
