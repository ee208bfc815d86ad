/// Local key/value medium errors. Logged and swallowed by the cache layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocalStorageError {
    #[error("local storage quota exceeded writing {key} ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },

    #[error("local storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("corrupt record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}
