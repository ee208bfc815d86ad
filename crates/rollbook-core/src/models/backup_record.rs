use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordSource {
    /// The durable store accepted (or served) this value at the record timestamp.
    Remote,
    /// Written to the cache only; a remote write is still owed.
    Local,
}

/// Last known value of one document in the local medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Opaque document payload.
    pub data: serde_json::Value,
    /// Serialized as RFC 3339 / ISO-8601.
    pub timestamp: DateTime<Utc>,
    pub source: RecordSource,
}

impl BackupRecord {
    pub fn new(data: serde_json::Value, timestamp: DateTime<Utc>, source: RecordSource) -> Self {
        Self {
            data,
            timestamp,
            source,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.source == RecordSource::Remote
    }

    /// Whether this record is a remote-confirmed copy of `data`.
    pub fn confirms(&self, data: &serde_json::Value) -> bool {
        self.is_remote() && &self.data == data
    }
}
