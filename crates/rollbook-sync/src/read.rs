//! ReadCoordinator: remote-first document loads with local fallback.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn, Instrument};

use rollbook_cache::LocalCacheStore;
use rollbook_core::models::DocumentKey;

use crate::adapter::DurableStoreAdapter;
use crate::quota::QuotaGuard;

/// Resolves reads against the remote store, falling back to the local cache.
pub struct ReadCoordinator {
    cache: Arc<LocalCacheStore>,
    quota: Arc<QuotaGuard>,
    adapter: Arc<DurableStoreAdapter>,
}

impl ReadCoordinator {
    pub fn new(
        cache: Arc<LocalCacheStore>,
        quota: Arc<QuotaGuard>,
        adapter: Arc<DurableStoreAdapter>,
    ) -> Self {
        Self {
            cache,
            quota,
            adapter,
        }
    }

    /// Load a document. Never fails; the worst case is `None`.
    ///
    /// A remote "no such document" is authoritative and is returned as `None`
    /// without consulting the cache.
    pub async fn load(&self, key: &DocumentKey) -> Option<Value> {
        self.load_inner(key).instrument(crate::load_span!(key)).await
    }

    async fn load_inner(&self, key: &DocumentKey) -> Option<Value> {
        if self.quota.is_cooling_down() {
            debug!(
                remaining_secs = self.quota.remaining_cooldown_seconds(),
                "load: quota cooldown active, serving local copy"
            );
            return self.cache.get(key);
        }

        match self.adapter.read(key).await {
            Ok(Some(doc)) => {
                if let Some(displaced) = self.cache.replace_with_remote(key, &doc) {
                    warn!(
                        local_saved_at = %displaced.timestamp,
                        "load: remote copy replaced unsynced local changes"
                    );
                }
                Some(doc)
            }
            Ok(None) => {
                debug!("load: remote has no document");
                None
            }
            Err(e) => {
                if e.is_quota() {
                    self.quota.record_quota_failure();
                } else {
                    warn!(kind = %e.kind, "load: remote read failed, serving local copy: {e}");
                }
                self.cache.get(key)
            }
        }
    }
}
