//! SyncReconciler: pushes LOCAL cache records back to the remote store.
//!
//! Reconciliation is an explicit call; it does not look at the quota
//! cooldown, and its writes merge fields rather than replace the document.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Instrument};

use rollbook_cache::LocalCacheStore;
use rollbook_core::models::{DocumentKey, RecordSource, SetOptions};

use crate::adapter::DurableStoreAdapter;
use crate::quota::QuotaGuard;

/// Outcome of a [`SyncReconciler::reconcile_pending`] sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: Vec<DocumentKey>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct SyncReconciler {
    cache: Arc<LocalCacheStore>,
    quota: Arc<QuotaGuard>,
    adapter: Arc<DurableStoreAdapter>,
}

impl SyncReconciler {
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

    /// Make the remote copy of `key` agree with the local one.
    ///
    /// `false` when there is no local value or the remote write failed; in
    /// the latter case the local record is left untouched.
    pub async fn reconcile(&self, key: &DocumentKey) -> bool {
        self.reconcile_inner(key)
            .instrument(crate::reconcile_span!(key))
            .await
    }

    async fn reconcile_inner(&self, key: &DocumentKey) -> bool {
        let Some(local) = self.cache.get(key) else {
            debug!("reconcile: nothing cached");
            return false;
        };

        match self.adapter.read(key).await {
            Ok(Some(remote)) if remote == local => {
                debug!("reconcile: remote already matches");
                self.cache.mark_remote(key, &local);
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(kind = %e.kind, "reconcile: remote read failed, pushing anyway: {e}");
            }
        }

        match self.adapter.write(key, &local, SetOptions::merge()).await {
            Ok(()) => {
                self.cache.mark_remote(key, &local);
                self.quota.reset();
                info!("reconcile: local copy pushed");
                true
            }
            Err(e) => {
                warn!(kind = %e.kind, "reconcile: remote write failed: {e}");
                false
            }
        }
    }

    /// Reconcile every record still tagged LOCAL, in key order.
    pub async fn reconcile_pending(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for (key, _) in self.cache.records_with_source(RecordSource::Local) {
            report.attempted += 1;
            if self.reconcile(&key).await {
                report.synced += 1;
            } else {
                report.failed.push(key);
            }
        }
        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                synced = report.synced,
                failed = report.failed.len(),
                "reconcile: sweep finished"
            );
        }
        report
    }
}
