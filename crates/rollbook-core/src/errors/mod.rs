mod config_error;
mod remote_error;
mod rollbook_error;
mod storage_error;

pub use config_error::ConfigError;
pub use remote_error::{RemoteError, RemoteErrorKind, RemoteFailure, RemoteOperation};
pub use rollbook_error::{RollbookError, RollbookResult};
pub use storage_error::LocalStorageError;
