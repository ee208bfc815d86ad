use crate::errors::LocalStorageError;

/// Synchronous string key/value medium (browser `localStorage` equivalent).
///
/// Any call may fail, including on overflow; callers in the cache layer
/// swallow these failures.
pub trait KeyValueMedium: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStorageError>;
    fn remove_item(&self, key: &str) -> Result<(), LocalStorageError>;

    /// All stored keys beginning with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LocalStorageError>;
}
