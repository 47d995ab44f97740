//! # Progress Synchronization
//!
//! Keeps audiobook playback progress in step across devices that share a
//! folder (a network drive, a cloud-synced directory). No server, no
//! accounts: the devices communicate through a single JSON file.
//!
//! ## Components
//!
//! - **Payload** (`payload`): the sync file's wire format
//! - **Export Pipeline** (`export`): debounced writer of local progress
//! - **Import Pipeline** (`import`): polling reader of peer progress
//! - **Signature Detection** (`signature`): cheap has-the-file-changed probe
//! - **Conflict Resolver** (`conflict_resolver`): per-book last-write-wins merge
//! - **Sync Coordinator** (`coordinator`): lifecycle of the two pipelines

pub mod conflict_resolver;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod import;
pub mod payload;
pub mod signature;

pub use conflict_resolver::{ConflictResolver, MergeOutcome, MergeReport};
pub use coordinator::{SyncConfig, SyncCoordinator};
pub use error::{Result, SyncError};
pub use export::ExportPipeline;
pub use import::ImportPipeline;
pub use payload::{decode_payload, encode_payload, ProgressEntry, SYNC_FILE_MIME, SYNC_FILE_NAME};
pub use signature::{FileSignature, SignatureDetector};
