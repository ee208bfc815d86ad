//! LocalCacheStore: last known value per document, tagged REMOTE or LOCAL.
//!
//! Never fails its caller: medium errors are logged and the operation becomes
//! a no-op; unreadable records read as absent.
//!
//! Writes, including the read-compare-write ones, are serialized on one lock
//! per store so a re-tag can never overwrite a newer payload.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use rollbook_core::errors::LocalStorageError;
use rollbook_core::models::{BackupRecord, DocumentKey, RecordSource};
use rollbook_core::traits::{Clock, KeyValueMedium};

/// Provenance-tagged backup cache over a [`KeyValueMedium`].
pub struct LocalCacheStore {
    medium: Arc<dyn KeyValueMedium>,
    clock: Arc<dyn Clock>,
    prefix: String,
    writes: Mutex<()>,
}

impl LocalCacheStore {
    pub fn new(
        medium: Arc<dyn KeyValueMedium>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            medium,
            clock,
            prefix: prefix.into(),
            writes: Mutex::new(()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Write `data` stamped with the current time. Returns whether the medium
    /// accepted the write.
    pub fn put(&self, key: &DocumentKey, data: &Value, source: RecordSource) -> bool {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_record(key, data, source)
    }

    /// Write `data` as LOCAL unless the cache already holds exactly `data` as
    /// REMOTE. Returns whether a write happened.
    pub fn put_local(&self, key: &DocumentKey, data: &Value) -> bool {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if self.record(key).is_some_and(|record| record.confirms(data)) {
            debug!(collection = %key.collection, id = %key.id, "cache: payload matches remote-confirmed copy");
            return false;
        }
        self.write_record(key, data, RecordSource::Local)
    }

    /// Store a copy just read from the remote store as REMOTE.
    ///
    /// Returns the previous record when it was LOCAL with different data,
    /// i.e. when unsynced local changes were replaced.
    pub fn replace_with_remote(&self, key: &DocumentKey, data: &Value) -> Option<BackupRecord> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        let displaced = self
            .record(key)
            .filter(|record| !record.is_remote() && &record.data != data);
        self.write_record(key, data, RecordSource::Remote);
        displaced
    }

    fn write_record(&self, key: &DocumentKey, data: &Value, source: RecordSource) -> bool {
        let record = BackupRecord::new(data.clone(), self.clock.now(), source);
        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(collection = %key.collection, id = %key.id, "cache: cannot serialize record: {e}");
                return false;
            }
        };
        match self.medium.set_item(&key.storage_key(&self.prefix), &raw) {
            Ok(()) => {
                debug!(collection = %key.collection, id = %key.id, ?source, "cache: record written");
                true
            }
            Err(e) => {
                warn!(collection = %key.collection, id = %key.id, "cache: local write dropped: {e}");
                false
            }
        }
    }

    /// Cached payload, or `None` when absent, unreadable, or corrupt.
    pub fn get(&self, key: &DocumentKey) -> Option<Value> {
        self.record(key).map(|record| record.data)
    }

    /// Full cached record, or `None` when absent, unreadable, or corrupt.
    pub fn record(&self, key: &DocumentKey) -> Option<BackupRecord> {
        let storage_key = key.storage_key(&self.prefix);
        let raw = match self.medium.get_item(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(collection = %key.collection, id = %key.id, "cache: local read failed: {e}");
                return None;
            }
        };
        match decode(&storage_key, &raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection = %key.collection, id = %key.id, "cache: treating as miss: {e}");
                None
            }
        }
    }

    /// Re-tag the record as REMOTE, but only while it still holds `data`.
    ///
    /// A newer LOCAL value written while a remote call was in flight stays LOCAL.
    pub fn mark_remote(&self, key: &DocumentKey, data: &Value) -> bool {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        match self.record(key) {
            Some(record) if &record.data == data => {
                record.is_remote() || self.write_record(key, data, RecordSource::Remote)
            }
            _ => {
                debug!(collection = %key.collection, id = %key.id, "cache: newer value cached, not re-tagging");
                false
            }
        }
    }

    /// Every readable record carrying `source`, ordered by key.
    pub fn records_with_source(&self, source: RecordSource) -> Vec<(DocumentKey, BackupRecord)> {
        let keys = match self.medium.keys_with_prefix(&format!("{}/", self.prefix)) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("cache: cannot enumerate records: {e}");
                return Vec::new();
            }
        };
        keys.iter()
            .filter_map(|storage_key| DocumentKey::from_storage_key(&self.prefix, storage_key))
            .filter_map(|key| self.record(&key).map(|record| (key, record)))
            .filter(|(_, record)| record.source == source)
            .collect()
    }
}

fn decode(storage_key: &str, raw: &str) -> Result<BackupRecord, LocalStorageError> {
    serde_json::from_str(raw).map_err(|e| LocalStorageError::CorruptRecord {
        key: storage_key.to_string(),
        reason: e.to_string(),
    })
}
