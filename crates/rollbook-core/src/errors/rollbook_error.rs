use super::{ConfigError, LocalStorageError, RemoteError};

/// Top-level error for every rollbook operation that can fail.
#[derive(Debug, thiserror::Error)]
pub enum RollbookError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    LocalStorage(#[from] LocalStorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RollbookError {
    /// The remote failure behind this error, if any.
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

pub type RollbookResult<T> = Result<T, RollbookError>;
