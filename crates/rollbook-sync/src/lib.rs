//! # rollbook-sync
//!
//! The coordinator between the local backup cache and the remote document
//! store: quota cooldown tracking, fallback reads, debounced write-through
//! saves with per-document coalescing, and reconciliation of LOCAL records.

pub mod adapter;
pub mod engine;
pub mod quota;
pub mod read;
pub mod reconcile;
pub mod remote;
pub mod telemetry;
pub mod write;

pub use adapter::DurableStoreAdapter;
pub use engine::{PersistenceCoordinator, SyncStatus};
pub use quota::QuotaGuard;
pub use read::ReadCoordinator;
pub use reconcile::{ReconcileReport, SyncReconciler};
pub use remote::MemoryDocumentStore;
#[cfg(feature = "cloud")]
pub use remote::HttpDocumentStore;
pub use write::WriteCoordinator;
