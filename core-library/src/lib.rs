//! # Audiobook Library Module
//!
//! Owns the data model and the local progress store.
//!
//! ## Components
//!
//! - **Models** (`models`): `BookId`, `ChapterId`, and `BookContent`
//! - **Database** (`db`): SQLite pool creation and schema bootstrap
//! - **Progress Store** (`store`): the in-memory + write-through store with a
//!   reactive active-book stream and an atomic update-by-id primitive

pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{BookContent, BookId, ChapterId};
pub use store::ProgressStore;
