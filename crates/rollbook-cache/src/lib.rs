//! # rollbook-cache
//!
//! The local tier: a keyed store of [`BackupRecord`](rollbook_core::BackupRecord)s
//! tagged with their provenance, plus the key/value media it can sit on.

pub mod medium;
pub mod store;

pub use medium::{MemoryMedium, SqliteMedium};
pub use store::LocalCacheStore;

use rollbook_core::errors::LocalStorageError;

/// Convert a SQLite error message into a local storage error.
pub(crate) fn to_storage_err(msg: String) -> LocalStorageError {
    LocalStorageError::Sqlite { message: msg }
}
