//! WriteCoordinator: write-through saves with per-document debounce.
//!
//! Every save lands in the local cache before anything else happens. The
//! remote write is either issued right away (`immediate`) or deferred until
//! the document has been quiet for the debounce window; saves arriving inside
//! the window replace the pending payload, so only the latest one is sent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};

use rollbook_cache::LocalCacheStore;
use rollbook_core::errors::{RemoteError, RollbookResult};
use rollbook_core::models::{DocumentKey, SaveOptions, SetOptions};

use crate::adapter::DurableStoreAdapter;
use crate::quota::QuotaGuard;

/// The latest not-yet-sent payload for one document.
struct PendingSave {
    data: Value,
    generation: u64,
    timer: JoinHandle<()>,
}

struct Inner {
    cache: Arc<LocalCacheStore>,
    quota: Arc<QuotaGuard>,
    adapter: Arc<DurableStoreAdapter>,
    debounce: Duration,
    pending: DashMap<DocumentKey, PendingSave>,
    generations: AtomicU64,
}

/// Coalescing write-through save path. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WriteCoordinator {
    inner: Arc<Inner>,
}

impl WriteCoordinator {
    pub fn new(
        cache: Arc<LocalCacheStore>,
        quota: Arc<QuotaGuard>,
        adapter: Arc<DurableStoreAdapter>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                quota,
                adapter,
                debounce,
                pending: DashMap::new(),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    /// Save a document.
    ///
    /// Returns `Ok(true)` when the remote store confirmed the payload (or
    /// already held it), `Ok(false)` when the remote write was deferred or
    /// skipped. Only an immediate save can fail, and only for non-quota
    /// remote errors; the payload is in the local cache either way.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn save(
        &self,
        key: &DocumentKey,
        data: Value,
        options: SaveOptions,
    ) -> RollbookResult<bool> {
        let span = crate::save_span!(key, options.immediate);
        self.save_inner(key, data, options).instrument(span).await
    }

    async fn save_inner(
        &self,
        key: &DocumentKey,
        data: Value,
        options: SaveOptions,
    ) -> RollbookResult<bool> {
        self.inner.write_through(key, &data);

        if options.immediate {
            if let Some((_, superseded)) = self.inner.pending.remove(key) {
                superseded.timer.abort();
                debug!("save: immediate save preempts pending debounced save");
            }
            let confirmed = self.inner.execute_remote_save(key, &data, true).await?;
            return Ok(confirmed);
        }

        Inner::schedule(&self.inner, key.clone(), data);
        Ok(false)
    }

    /// Remote half of a save.
    ///
    /// `forced` saves ignore an active quota cooldown. A payload that the
    /// cache already holds as REMOTE is not re-sent. Quota failures start the
    /// cooldown and yield `Ok(false)`; other failures are returned.
    pub async fn execute_remote_save(
        &self,
        key: &DocumentKey,
        data: &Value,
        forced: bool,
    ) -> Result<bool, RemoteError> {
        self.inner.execute_remote_save(key, data, forced).await
    }

    /// Send the pending save for `key` now instead of waiting for its timer.
    /// `None` when nothing is pending.
    pub async fn flush(&self, key: &DocumentKey) -> Option<RollbookResult<bool>> {
        let (_, pending) = self.inner.pending.remove(key)?;
        pending.timer.abort();
        let outcome = self.inner.execute_remote_save(key, &pending.data, false).await;
        Some(outcome.map_err(Into::into))
    }

    /// Flush every pending save, in key order.
    pub async fn flush_all(&self) -> Vec<(DocumentKey, RollbookResult<bool>)> {
        let mut keys: Vec<DocumentKey> = self
            .inner
            .pending
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(outcome) = self.flush(&key).await {
                results.push((key, outcome));
            }
        }
        results
    }

    pub fn has_pending(&self, key: &DocumentKey) -> bool {
        self.inner.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }
}

impl Inner {
    /// Put the payload in the cache as LOCAL, unless the cache already holds
    /// exactly this payload as REMOTE.
    fn write_through(&self, key: &DocumentKey, data: &Value) {
        self.cache.put_local(key, data);
    }

    /// Replace the pending payload for `key` and restart its timer.
    fn schedule(this: &Arc<Self>, key: DocumentKey, data: Value) {
        let generation = this.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let timer = Self::spawn_timer(this, key.clone(), generation);
        match this.pending.entry(key) {
            Entry::Occupied(mut occupied) => {
                let pending = occupied.get_mut();
                pending.timer.abort();
                pending.data = data;
                pending.generation = generation;
                pending.timer = timer;
                debug!("save: coalesced into pending save");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PendingSave {
                    data,
                    generation,
                    timer,
                });
            }
        }
    }

    fn spawn_timer(this: &Arc<Self>, key: DocumentKey, generation: u64) -> JoinHandle<()> {
        let inner = Arc::clone(this);
        let span = crate::remote_save_span!(key);
        tokio::spawn(
            async move {
                tokio::time::sleep(inner.debounce).await;
                inner.fire(key, generation).await;
            }
            .instrument(span),
        )
    }

    /// Debounce expiry: send whatever is pending now, if this timer is still current.
    async fn fire(&self, key: DocumentKey, generation: u64) {
        let Some((_, pending)) = self
            .pending
            .remove_if(&key, |_, pending| pending.generation == generation)
        else {
            return;
        };
        match self.execute_remote_save(&key, &pending.data, false).await {
            Ok(true) => debug!("save: debounced save confirmed"),
            Ok(false) => debug!("save: debounced save kept local"),
            Err(e) => warn!(kind = %e.kind, "save: debounced remote write failed: {e}"),
        }
    }

    async fn execute_remote_save(
        &self,
        key: &DocumentKey,
        data: &Value,
        forced: bool,
    ) -> Result<bool, RemoteError> {
        if !forced && self.quota.is_cooling_down() {
            debug!(
                remaining_secs = self.quota.remaining_cooldown_seconds(),
                "save: quota cooldown active, keeping local copy"
            );
            return Ok(false);
        }

        if self
            .cache
            .record(key)
            .is_some_and(|record| record.confirms(data))
        {
            debug!("save: remote already holds this payload, skipping write");
            return Ok(true);
        }

        match self.adapter.write(key, data, SetOptions::replace()).await {
            Ok(()) => {
                self.cache.mark_remote(key, data);
                self.quota.reset();
                Ok(true)
            }
            Err(e) if e.is_quota() => {
                self.quota.record_quota_failure();
                Ok(false)
            }
            Err(e) => {
                warn!(kind = %e.kind, "save: remote write failed, keeping local copy: {e}");
                Err(e)
            }
        }
    }
}
