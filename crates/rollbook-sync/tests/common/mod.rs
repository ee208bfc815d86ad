//! Shared wiring for the sync integration tests: an unbounded memory medium,
//! a hand-driven clock, and an in-memory remote store.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rollbook_cache::{LocalCacheStore, MemoryMedium};
use rollbook_core::errors::RemoteFailure;
use rollbook_core::models::DocumentKey;
use rollbook_core::ManualClock;
use rollbook_sync::{
    DurableStoreAdapter, MemoryDocumentStore, QuotaGuard, ReadCoordinator, SyncReconciler,
    WriteCoordinator,
};

pub const PREFIX: &str = "rollbook.backup";
pub const QUOTA_KEY: &str = "rollbook.quota.last_error_at";
pub const START_MS: i64 = 1_725_000_000_000;
pub const COOLDOWN: Duration = Duration::from_secs(60);
pub const DEBOUNCE: Duration = Duration::from_secs(10);

pub struct Harness {
    pub medium: Arc<MemoryMedium>,
    pub clock: Arc<ManualClock>,
    pub remote: Arc<MemoryDocumentStore>,
    pub cache: Arc<LocalCacheStore>,
    pub quota: Arc<QuotaGuard>,
    pub adapter: Arc<DurableStoreAdapter>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let medium = Arc::new(MemoryMedium::unbounded());
        let clock = Arc::new(ManualClock::new(START_MS));
        let remote = Arc::new(MemoryDocumentStore::new());
        let cache = Arc::new(LocalCacheStore::new(medium.clone(), clock.clone(), PREFIX));
        let quota = Arc::new(QuotaGuard::new(
            medium.clone(),
            clock.clone(),
            QUOTA_KEY,
            COOLDOWN,
        ));
        let adapter = Arc::new(DurableStoreAdapter::new(remote.clone(), timeout));
        Self {
            medium,
            clock,
            remote,
            cache,
            quota,
            adapter,
        }
    }

    pub fn reader(&self) -> ReadCoordinator {
        ReadCoordinator::new(self.cache.clone(), self.quota.clone(), self.adapter.clone())
    }

    pub fn writer(&self) -> WriteCoordinator {
        WriteCoordinator::new(
            self.cache.clone(),
            self.quota.clone(),
            self.adapter.clone(),
            DEBOUNCE,
        )
    }

    pub fn reconciler(&self) -> SyncReconciler {
        SyncReconciler::new(self.cache.clone(), self.quota.clone(), self.adapter.clone())
    }
}

pub fn key(id: &str) -> DocumentKey {
    DocumentKey::new("dashboards", id)
}

pub fn quota_failure() -> RemoteFailure {
    RemoteFailure::new("resource-exhausted", "Quota exceeded.")
}

pub fn network_failure() -> RemoteFailure {
    RemoteFailure::new("unavailable", "network unreachable")
}

/// Let paused tokio time run past a debounce window.
pub async fn past_debounce() {
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
}
