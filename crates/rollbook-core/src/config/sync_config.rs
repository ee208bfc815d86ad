use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Write coalescing, quota cooldown, and reconciliation timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Debounce window for non-immediate saves (milliseconds).
    pub debounce_ms: u64,
    /// Cooldown window after a quota failure (seconds).
    pub cooldown_secs: u64,
    /// Deadline on each remote call (milliseconds). Zero disables it.
    pub request_timeout_ms: u64,
    /// Period of the background reconcile loop (seconds). Zero disables it.
    pub auto_reconcile_interval_secs: u64,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn auto_reconcile_interval(&self) -> Option<Duration> {
        (self.auto_reconcile_interval_secs > 0)
            .then(|| Duration::from_secs(self.auto_reconcile_interval_secs))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::DEFAULT_DEBOUNCE_MS,
            cooldown_secs: defaults::DEFAULT_COOLDOWN_SECS,
            request_timeout_ms: defaults::DEFAULT_REQUEST_TIMEOUT_MS,
            auto_reconcile_interval_secs: defaults::DEFAULT_AUTO_RECONCILE_INTERVAL_SECS,
        }
    }
}
