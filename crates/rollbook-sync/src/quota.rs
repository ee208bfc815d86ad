//! Remote write-quota cooldown: a NORMAL/COOLDOWN state machine whose state is
//! a pure function of the last quota failure time and the clock.
//!
//! The failure time is persisted in the local medium so a cooldown survives a
//! restart. COOLDOWN → NORMAL is evaluated lazily whenever the state is read.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use rollbook_core::models::QuotaState;
use rollbook_core::traits::{Clock, KeyValueMedium};

/// Process-wide quota cooldown tracker. Share one instance per remote store.
pub struct QuotaGuard {
    medium: Arc<dyn KeyValueMedium>,
    clock: Arc<dyn Clock>,
    storage_key: String,
    window: Duration,
    last_quota_error_at: Mutex<Option<i64>>,
}

impl QuotaGuard {
    /// Create a guard, picking up any cooldown persisted under `storage_key`.
    pub fn new(
        medium: Arc<dyn KeyValueMedium>,
        clock: Arc<dyn Clock>,
        storage_key: impl Into<String>,
        window: Duration,
    ) -> Self {
        let storage_key = storage_key.into();
        let persisted = load_timestamp(medium.as_ref(), &storage_key);
        Self {
            medium,
            clock,
            storage_key,
            window,
            last_quota_error_at: Mutex::new(persisted),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether remote traffic is currently suspended. Clears an expired cooldown.
    pub fn is_cooling_down(&self) -> bool {
        self.remaining_ms() > 0
    }

    pub fn state(&self) -> QuotaState {
        if self.is_cooling_down() {
            QuotaState::Cooldown
        } else {
            QuotaState::Normal
        }
    }

    /// Enter (or extend) the cooldown starting now.
    pub fn record_quota_failure(&self) {
        let now = self.clock.now_ms();
        *self.slot() = Some(now);
        if let Err(e) = self.medium.set_item(&self.storage_key, &now.to_string()) {
            warn!("quota: cooldown not persisted: {e}");
        }
        info!(
            cooldown_secs = self.window.as_secs(),
            "quota: remote quota exceeded, entering cooldown"
        );
    }

    /// Force the guard back to NORMAL.
    pub fn reset(&self) {
        let mut slot = self.slot();
        if slot.take().is_some() {
            info!("quota: cooldown cleared");
        }
        self.clear_persisted();
    }

    /// Whole seconds left in the cooldown, rounded up. Zero when NORMAL.
    pub fn remaining_cooldown_seconds(&self) -> u64 {
        let remaining = self.remaining_ms();
        (remaining as u64).div_ceil(1000)
    }

    /// Epoch-ms of the failure that started the active cooldown.
    pub fn last_quota_error_at(&self) -> Option<i64> {
        self.remaining_ms();
        *self.slot()
    }

    fn remaining_ms(&self) -> i64 {
        let mut slot = self.slot();
        let Some(at) = *slot else {
            return 0;
        };
        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        let elapsed = self.clock.now_ms().saturating_sub(at);
        if elapsed >= window_ms {
            *slot = None;
            drop(slot);
            self.clear_persisted();
            info!("quota: cooldown window elapsed, resuming remote traffic");
            return 0;
        }
        // A clock that moved backwards never extends the window.
        window_ms.saturating_sub(elapsed).min(window_ms)
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.medium.remove_item(&self.storage_key) {
            warn!("quota: persisted cooldown not cleared: {e}");
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<i64>> {
        self.last_quota_error_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_timestamp(medium: &dyn KeyValueMedium, key: &str) -> Option<i64> {
    match medium.get_item(key) {
        Ok(Some(raw)) => match raw.trim().parse::<i64>() {
            Ok(at) => Some(at),
            Err(_) => {
                warn!(raw = %raw, "quota: ignoring unparseable persisted cooldown");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("quota: cannot read persisted cooldown: {e}");
            None
        }
    }
}
