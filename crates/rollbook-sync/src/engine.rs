//! PersistenceCoordinator: the surface callers use: load, save, reconcile,
//! and quota status. Wires the cache, quota guard, adapter, and coordinators
//! around one local medium and one remote store.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;

use rollbook_cache::{LocalCacheStore, MemoryMedium, SqliteMedium};
use rollbook_core::config::RollbookConfig;
use rollbook_core::errors::RollbookResult;
use rollbook_core::models::{DocumentKey, SaveOptions};
use rollbook_core::traits::{Clock, KeyValueMedium, RemoteDocumentStore};
use rollbook_core::SystemClock;

use crate::adapter::DurableStoreAdapter;
use crate::quota::QuotaGuard;
use crate::read::ReadCoordinator;
use crate::reconcile::{ReconcileReport, SyncReconciler};
use crate::write::WriteCoordinator;

/// Sync status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Remote traffic flows normally.
    Normal,
    /// Remote quota exhausted; saves stay local until the window passes.
    CoolingDown { remaining_secs: u64 },
}

impl SyncStatus {
    pub fn is_cooling_down(&self) -> bool {
        matches!(self, Self::CoolingDown { .. })
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("all changes sync normally"),
            Self::CoolingDown { remaining_secs } => write!(
                f,
                "cloud quota reached: changes are saved locally and will sync in about {remaining_secs}s"
            ),
        }
    }
}

pub struct PersistenceCoordinator {
    config: RollbookConfig,
    cache: Arc<LocalCacheStore>,
    quota: Arc<QuotaGuard>,
    reader: ReadCoordinator,
    writer: WriteCoordinator,
    reconciler: Arc<SyncReconciler>,
}

impl PersistenceCoordinator {
    pub fn new(
        config: &RollbookConfig,
        remote: Arc<dyn RemoteDocumentStore>,
        medium: Arc<dyn KeyValueMedium>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(LocalCacheStore::new(
            Arc::clone(&medium),
            Arc::clone(&clock),
            config.storage.key_prefix.clone(),
        ));
        let quota = Arc::new(QuotaGuard::new(
            medium,
            clock,
            config.storage.quota_key.clone(),
            config.sync.cooldown(),
        ));
        let adapter = Arc::new(DurableStoreAdapter::new(
            remote,
            config.sync.request_timeout(),
        ));

        let reader = ReadCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&quota),
            Arc::clone(&adapter),
        );
        let writer = WriteCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&quota),
            Arc::clone(&adapter),
            config.sync.debounce(),
        );
        let reconciler = Arc::new(SyncReconciler::new(
            Arc::clone(&cache),
            Arc::clone(&quota),
            adapter,
        ));

        tracing::info!(
            prefix = %config.storage.key_prefix,
            debounce_ms = config.sync.debounce_ms,
            cooldown_secs = config.sync.cooldown_secs,
            "persistence coordinator ready"
        );

        Self {
            config: config.clone(),
            cache,
            quota,
            reader,
            writer,
            reconciler,
        }
    }

    /// Coordinator over a SQLite medium at `storage.db_path` and the system clock.
    pub fn with_sqlite(
        config: &RollbookConfig,
        remote: Arc<dyn RemoteDocumentStore>,
    ) -> RollbookResult<Self> {
        let medium = SqliteMedium::open(Path::new(&config.storage.db_path))?;
        Ok(Self::new(
            config,
            remote,
            Arc::new(medium),
            Arc::new(SystemClock),
        ))
    }

    /// Coordinator over a `storage.memory_capacity_bytes` memory medium and the system clock.
    pub fn in_memory(config: &RollbookConfig, remote: Arc<dyn RemoteDocumentStore>) -> Self {
        let medium = MemoryMedium::new(config.storage.memory_capacity_bytes);
        Self::new(config, remote, Arc::new(medium), Arc::new(SystemClock))
    }

    pub async fn load(&self, collection: &str, id: &str) -> Option<Value> {
        self.reader.load(&DocumentKey::new(collection, id)).await
    }

    /// See [`WriteCoordinator::save`].
    pub async fn save(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        options: SaveOptions,
    ) -> RollbookResult<bool> {
        self.writer
            .save(&DocumentKey::new(collection, id), data, options)
            .await
    }

    pub async fn reconcile(&self, collection: &str, id: &str) -> bool {
        self.reconciler
            .reconcile(&DocumentKey::new(collection, id))
            .await
    }

    pub async fn reconcile_pending(&self) -> ReconcileReport {
        self.reconciler.reconcile_pending().await
    }

    /// Send every debounced save now.
    pub async fn flush_all(&self) -> Vec<(DocumentKey, RollbookResult<bool>)> {
        self.writer.flush_all().await
    }

    pub fn is_quota_cooling_down(&self) -> bool {
        self.quota.is_cooling_down()
    }

    pub fn remaining_cooldown_seconds(&self) -> u64 {
        self.quota.remaining_cooldown_seconds()
    }

    pub fn status(&self) -> SyncStatus {
        match self.quota.remaining_cooldown_seconds() {
            0 => SyncStatus::Normal,
            remaining_secs => SyncStatus::CoolingDown { remaining_secs },
        }
    }

    /// Start the periodic reconcile sweep, if `sync.auto_reconcile_interval_secs`
    /// is non-zero. Sweeps are skipped while the quota guard is cooling down.
    pub fn spawn_auto_reconcile(&self) -> Option<JoinHandle<()>> {
        let period = self.config.sync.auto_reconcile_interval()?;
        let reconciler = Arc::clone(&self.reconciler);
        let quota = Arc::clone(&self.quota);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if quota.is_cooling_down() {
                    tracing::debug!("auto-reconcile: skipped during quota cooldown");
                    continue;
                }
                reconciler.reconcile_pending().await;
            }
        }))
    }

    pub fn config(&self) -> &RollbookConfig {
        &self.config
    }

    pub fn cache(&self) -> &LocalCacheStore {
        &self.cache
    }

    pub fn quota(&self) -> &QuotaGuard {
        &self.quota
    }

    pub fn writer(&self) -> &WriteCoordinator {
        &self.writer
    }
}
