use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a logical document: `(collection, id)`.
///
/// Both parts are free-form. In storage keys the collection is escaped so
/// that the first unescaped `/` after the prefix always ends it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Key under which the backup record is stored in the local medium.
    pub fn storage_key(&self, prefix: &str) -> String {
        format!("{prefix}/{}/{}", escape_segment(&self.collection), self.id)
    }

    /// Inverse of [`storage_key`](Self::storage_key). Returns `None` for keys
    /// outside `prefix` or without both segments.
    pub fn from_storage_key(prefix: &str, key: &str) -> Option<Self> {
        let rest = key.strip_prefix(prefix)?.strip_prefix('/')?;
        let (collection, id) = rest.split_once('/')?;
        if collection.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(unescape_segment(collection)?, id))
    }
}

/// `%` becomes `%25` and `/` becomes `%2F`; nothing else changes.
fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Inverse of [`escape_segment`]. `None` for any other `%` sequence.
fn unescape_segment(segment: &str) -> Option<String> {
    let mut unescaped = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(at) = rest.find('%') {
        unescaped.push_str(&rest[..at]);
        let escape = rest.get(at..at + 3)?;
        match escape {
            "%25" => unescaped.push('%'),
            "%2F" | "%2f" => unescaped.push('/'),
            _ => return None,
        }
        rest = &rest[at + 3..];
    }
    unescaped.push_str(rest);
    Some(unescaped)
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
