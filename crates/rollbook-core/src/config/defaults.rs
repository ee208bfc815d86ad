//! Default values for every config field.

use crate::constants;

pub const DEFAULT_DB_PATH: &str = "rollbook-cache.db";
pub const DEFAULT_KEY_PREFIX: &str = constants::DEFAULT_KEY_PREFIX;
pub const DEFAULT_QUOTA_KEY: &str = constants::DEFAULT_QUOTA_KEY;
pub const DEFAULT_MEMORY_CAPACITY_BYTES: usize = constants::DEFAULT_MEMORY_CAPACITY_BYTES;

pub const DEFAULT_DEBOUNCE_MS: u64 = constants::DEFAULT_DEBOUNCE_MS;
pub const DEFAULT_COOLDOWN_SECS: u64 = constants::DEFAULT_COOLDOWN_SECS;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = constants::DEFAULT_REQUEST_TIMEOUT_MS;
pub const DEFAULT_AUTO_RECONCILE_INTERVAL_SECS: u64 = 0;

pub const DEFAULT_REMOTE_BASE_URL: &str = "http://127.0.0.1:8080";

pub const DEFAULT_LOG_LEVEL: &str = "info";
