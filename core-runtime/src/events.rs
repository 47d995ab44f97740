//! # Event Bus System
//!
//! Provides an event-driven architecture for the sync core using
//! `tokio::sync::broadcast`. Modules emit typed events; hosts (a UI, a status
//! indicator, a log forwarder) subscribe independently.
//!
//! Emission is fire-and-forget: a missing subscriber is not an error and no
//! event ever affects control flow in the emitting module.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, SyncEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Sync(SyncEvent::ExportCompleted {
//!         folder: "/shared/audiobooks".to_string(),
//!         books: 3,
//!         bytes: 412,
//!     }))
//!     .ok();
//! ```
//!
//! ## Error Handling
//!
//! Subscribers can see two receive errors from the underlying broadcast
//! channel: `RecvError::Lagged(n)` (the subscriber fell behind by `n` events;
//! non-fatal) and `RecvError::Closed` (all senders dropped; shutdown signal).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Sync-related events
    Sync(SyncEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Sync(e) => e.description(),
        }
    }
}

/// Events related to progress synchronization with the shared folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// The coordinator launched its export and import tasks.
    Started,
    /// The export pipeline wrote the sync file.
    ExportCompleted {
        /// The folder reference written to.
        folder: String,
        /// Number of book entries in the payload.
        books: usize,
        /// Payload size in bytes.
        bytes: usize,
    },
    /// An export cycle failed; it will be retried on the next emission.
    ExportFailed {
        /// The folder reference involved, if any.
        folder: String,
        /// Human-readable error message.
        message: String,
    },
    /// An import cycle finished.
    ImportCompleted {
        /// The folder reference read from.
        folder: String,
        /// Entries that updated local state.
        entries_applied: usize,
        /// Entries skipped by the conflict resolver.
        entries_skipped: usize,
    },
    /// An import cycle failed; the next poll retries independently.
    ImportFailed {
        /// The folder reference involved.
        folder: String,
        /// Human-readable error message.
        message: String,
    },
    /// The coordinator was shut down.
    Stopped,
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started => "Sync coordinator started",
            SyncEvent::ExportCompleted { .. } => "Progress exported to shared folder",
            SyncEvent::ExportFailed { .. } => "Export cycle failed",
            SyncEvent::ImportCompleted { .. } => "Progress imported from shared folder",
            SyncEvent::ImportFailed { .. } => "Import cycle failed",
            SyncEvent::Stopped => "Sync coordinator stopped",
        }
    }
}

/// Central event bus for publishing and subscribing to core events.
///
/// Cheaply cloneable; clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers that fall behind by more than `capacity` events receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when there are none. Emitters treat both as success.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscription to the event bus.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(CoreEvent::Sync(SyncEvent::Started)).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event, CoreEvent::Sync(SyncEvent::Started));
        assert_eq!(event.description(), "Sync coordinator started");
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_error_but_harmless() {
        let bus = EventBus::new(10);
        assert!(bus
            .emit(CoreEvent::Sync(SyncEvent::Stopped))
            .is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_independently() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = CoreEvent::Sync(SyncEvent::ImportCompleted {
            folder: "/shared".to_string(),
            entries_applied: 2,
            entries_skipped: 1,
        });
        bus.emit(event.clone()).unwrap();

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = CoreEvent::Sync(SyncEvent::ExportCompleted {
            folder: "/shared".to_string(),
            books: 1,
            bytes: 64,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Sync\""));
        assert!(json.contains("\"event\":\"ExportCompleted\""));
    }
}
