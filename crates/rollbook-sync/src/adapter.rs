//! DurableStoreAdapter: typed-outcome wrapper over a [`RemoteDocumentStore`].
//!
//! Translates raw back-end failures into [`RemoteErrorKind`]s and bounds every
//! call with an optional deadline. No retries here; fallback is the caller's job.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use rollbook_core::errors::{RemoteError, RemoteErrorKind, RemoteFailure, RemoteOperation};
use rollbook_core::models::{DocumentKey, SetOptions};
use rollbook_core::traits::RemoteDocumentStore;

const QUOTA_CODES: &[&str] = &["resource-exhausted", "resource_exhausted", "429"];

const TRANSIENT_CODES: &[&str] = &[
    "unavailable",
    "deadline-exceeded",
    "deadline_exceeded",
    "cancelled",
    "aborted",
    "timeout",
    "503",
    "504",
];

const QUOTA_MESSAGE_MARKERS: &[&str] = &["quota", "resource exhausted", "resource-exhausted"];

const TRANSIENT_MESSAGE_MARKERS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "unavailable",
    "offline",
    "connection",
];

/// Classify a raw back-end failure. Codes win over message text.
pub fn classify(failure: &RemoteFailure) -> RemoteErrorKind {
    if let Some(code) = failure.code.as_deref() {
        let code = code.trim().to_ascii_lowercase();
        if QUOTA_CODES.contains(&code.as_str()) {
            return RemoteErrorKind::QuotaExceeded;
        }
        if TRANSIENT_CODES.contains(&code.as_str()) {
            return RemoteErrorKind::Transient;
        }
    }
    let message = failure.message.to_ascii_lowercase();
    if QUOTA_MESSAGE_MARKERS.iter().any(|m| message.contains(m)) {
        RemoteErrorKind::QuotaExceeded
    } else if TRANSIENT_MESSAGE_MARKERS.iter().any(|m| message.contains(m)) {
        RemoteErrorKind::Transient
    } else {
        RemoteErrorKind::Unknown
    }
}

/// Remote store access with classified failures.
pub struct DurableStoreAdapter {
    store: Arc<dyn RemoteDocumentStore>,
    timeout: Option<Duration>,
}

impl DurableStoreAdapter {
    pub fn new(store: Arc<dyn RemoteDocumentStore>, timeout: Option<Duration>) -> Self {
        Self { store, timeout }
    }

    /// Fetch a document; `Ok(None)` when the remote has no such document.
    pub async fn read(&self, key: &DocumentKey) -> Result<Option<Value>, RemoteError> {
        let call = self.store.get(&key.collection, &key.id);
        self.bounded(RemoteOperation::Read, key, call).await
    }

    /// Upsert a document, replacing it or merging per `options`.
    pub async fn write(
        &self,
        key: &DocumentKey,
        data: &Value,
        options: SetOptions,
    ) -> Result<(), RemoteError> {
        let call = self.store.set(&key.collection, &key.id, data, options);
        self.bounded(RemoteOperation::Write, key, call).await
    }

    async fn bounded<T, F>(
        &self,
        operation: RemoteOperation,
        key: &DocumentKey,
        call: F,
    ) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteFailure>>,
    {
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(RemoteError {
                        kind: RemoteErrorKind::Transient,
                        operation,
                        collection: key.collection.clone(),
                        id: key.id.clone(),
                        message: format!("timed out after {}ms", limit.as_millis()),
                    })
                }
            },
            None => call.await,
        };
        outcome.map_err(|failure| RemoteError {
            kind: classify(&failure),
            operation,
            collection: key.collection.clone(),
            id: key.id.clone(),
            message: failure.to_string(),
        })
    }
}
