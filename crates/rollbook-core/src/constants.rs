/// rollbook version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Quiet period before a coalesced save is sent to the remote store.
pub const DEFAULT_DEBOUNCE_MS: u64 = 10_000;

/// How long remote traffic is suspended after a quota failure.
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// Per-call deadline on remote reads/writes. Zero disables the deadline.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Prefix of every backup record key in the local medium.
pub const DEFAULT_KEY_PREFIX: &str = "rollbook.backup";

/// Local medium key holding the epoch-ms of the last quota failure.
pub const DEFAULT_QUOTA_KEY: &str = "rollbook.quota.last_error_at";

/// Browser localStorage budget (5 MiB).
pub const DEFAULT_MEMORY_CAPACITY_BYTES: usize = 5 * 1024 * 1024;
