use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure class of a remote store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteErrorKind {
    /// Network or availability problem. Falls back locally, never starts a cooldown.
    Transient,
    /// The store rejected the call for resource exhaustion. Starts a cooldown.
    QuotaExceeded,
    /// Anything else.
    Unknown,
}

impl RemoteErrorKind {
    pub fn is_quota(self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::QuotaExceeded => f.write_str("quota exceeded"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Which remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteOperation {
    Read,
    Write,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Unclassified failure as reported by a remote store back-end.
///
/// `code` carries whatever status the back-end exposes (`"resource-exhausted"`,
/// `"unavailable"`, an HTTP status rendered as text, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteFailure {}

impl RemoteFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

/// Classified remote store failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("remote {operation} of {collection}/{id} failed ({kind}): {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub operation: RemoteOperation,
    pub collection: String,
    pub id: String,
    pub message: String,
}

impl RemoteError {
    pub fn is_quota(&self) -> bool {
        self.kind.is_quota()
    }
}
