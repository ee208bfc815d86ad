//! # rollbook-core
//!
//! Foundation crate for the rollbook dual-tier persistence coordinator.
//! Defines the document/record types, the seams to the local medium, the remote
//! store and the clock, plus errors, config, and constants.

pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use clock::{ManualClock, SystemClock};
pub use config::RollbookConfig;
pub use errors::{RollbookError, RollbookResult};
pub use models::{BackupRecord, DocumentKey, QuotaState, RecordSource, SaveOptions, SetOptions};
pub use traits::{Clock, KeyValueMedium, RemoteDocumentStore};
