use serde::{Deserialize, Serialize};

use super::defaults;

/// Local medium configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file backing the durable local medium.
    pub db_path: String,
    /// Prefix of backup record keys. Records live at `{key_prefix}/{collection}/{id}`.
    pub key_prefix: String,
    /// Key holding the persisted quota cooldown timestamp.
    pub quota_key: String,
    /// Byte budget of the in-memory medium.
    pub memory_capacity_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::DEFAULT_DB_PATH.to_string(),
            key_prefix: defaults::DEFAULT_KEY_PREFIX.to_string(),
            quota_key: defaults::DEFAULT_QUOTA_KEY.to_string(),
            memory_capacity_bytes: defaults::DEFAULT_MEMORY_CAPACITY_BYTES,
        }
    }
}
