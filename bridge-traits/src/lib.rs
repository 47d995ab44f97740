//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync core and platform-specific
//! implementations. Each trait represents a capability that the core requires
//! but that must be implemented differently per platform (desktop, iOS,
//! Android).
//!
//! ## Traits
//!
//! - [`FolderAccess`](storage::FolderAccess) - resolve a user-chosen folder
//!   reference and find, create, stat, read, and overwrite the sync file
//!   inside it
//! - [`PreferenceStore`](preferences::PreferenceStore) - reactive storage for
//!   the optional sync folder reference
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert platform-specific failures into it and keep
//! the messages actionable (include the folder reference or file name). Every
//! bridge failure is recoverable: the core logs it and retries on its next
//! debounce cycle or poll tick.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod preferences;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use preferences::PreferenceStore;
pub use storage::{FileStat, FolderAccess, FolderRef};
