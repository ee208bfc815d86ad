//! In-process remote store. Used for offline runs and tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use rollbook_core::errors::RemoteFailure;
use rollbook_core::models::SetOptions;
use rollbook_core::traits::RemoteDocumentStore;

use super::merge::merge_fields;

#[derive(Default)]
struct Failures {
    next_reads: VecDeque<RemoteFailure>,
    next_writes: VecDeque<RemoteFailure>,
    reads: Option<RemoteFailure>,
    writes: Option<RemoteFailure>,
}

/// [`RemoteDocumentStore`] held in memory, with call counters and scripted failures.
///
/// One-shot failures (`fail_next_*`) are consumed before sticky ones
/// (`set_*_failure`). A failed call does not touch the stored documents.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<(String, String), Value>>,
    failures: Mutex<Failures>,
    latency: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without counting a write.
    pub fn insert(&self, collection: &str, id: &str, doc: Value) {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((collection.to_string(), id.to_string()), doc);
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `get` calls, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_next_read(&self, failure: RemoteFailure) {
        self.failures().next_reads.push_back(failure);
    }

    pub fn fail_next_write(&self, failure: RemoteFailure) {
        self.failures().next_writes.push_back(failure);
    }

    /// Fail every read until cleared with `None`.
    pub fn set_read_failure(&self, failure: Option<RemoteFailure>) {
        self.failures().reads = failure;
    }

    /// Fail every write until cleared with `None`.
    pub fn set_write_failure(&self, failure: Option<RemoteFailure>) {
        self.failures().writes = failure;
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteDocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RemoteFailure> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        {
            let mut failures = self.failures();
            if let Some(failure) = failures.next_reads.pop_front() {
                return Err(failure);
            }
            if let Some(failure) = failures.reads.clone() {
                return Err(failure);
            }
        }
        Ok(self.document(collection, id))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: &Value,
        options: SetOptions,
    ) -> Result<(), RemoteFailure> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        {
            let mut failures = self.failures();
            if let Some(failure) = failures.next_writes.pop_front() {
                return Err(failure);
            }
            if let Some(failure) = failures.writes.clone() {
                return Err(failure);
            }
        }

        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = (collection.to_string(), id.to_string());
        if options.merge {
            if let Some(existing) = documents.get_mut(&slot) {
                merge_fields(existing, doc);
                return Ok(());
            }
        }
        documents.insert(slot, doc.clone());
        Ok(())
    }
}
