//! # Desktop Bridge Implementations
//!
//! Desktop adapters for the host bridge traits:
//! - [`TokioFolderAccess`] - shared-folder access over `tokio::fs`, where a
//!   folder reference is a plain directory path
//! - [`SqlitePreferenceStore`] - SQLite-persisted sync-folder preference with
//!   reactive change broadcasting

pub mod folder;
pub mod preferences;

pub use folder::TokioFolderAccess;
pub use preferences::SqlitePreferenceStore;
