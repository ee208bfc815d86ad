//! In-process medium with a byte budget, modelled on browser `localStorage`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use rollbook_core::errors::LocalStorageError;
use rollbook_core::traits::KeyValueMedium;

#[derive(Debug, Default)]
struct Items {
    entries: BTreeMap<String, String>,
    used_bytes: usize,
}

/// Bounded in-memory key/value medium.
///
/// Size is accounted as `key.len() + value.len()` per entry. A write that would
/// push the total past the capacity fails with [`LocalStorageError::QuotaExceeded`]
/// and leaves the previous value in place.
#[derive(Debug)]
pub struct MemoryMedium {
    items: Mutex<Items>,
    capacity_bytes: usize,
    unavailable: AtomicBool,
}

impl MemoryMedium {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            items: Mutex::new(Items::default()),
            capacity_bytes,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Medium without a size limit.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Make every subsequent call fail as if storage were disabled.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn used_bytes(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .used_bytes
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), LocalStorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LocalStorageError::Unavailable {
                reason: "memory medium disabled".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new(rollbook_core::constants::DEFAULT_MEMORY_CAPACITY_BYTES)
    }
}

impl KeyValueMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStorageError> {
        self.check_available()?;
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStorageError> {
        self.check_available()?;
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = items
            .entries
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let incoming = key.len() + value.len();
        let projected = items.used_bytes - previous + incoming;
        if projected > self.capacity_bytes {
            return Err(LocalStorageError::QuotaExceeded {
                key: key.to_string(),
                bytes: incoming,
            });
        }
        items.entries.insert(key.to_string(), value.to_string());
        items.used_bytes = projected;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStorageError> {
        self.check_available()?;
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = items.entries.remove(key) {
            items.used_bytes -= key.len() + old.len();
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LocalStorageError> {
        self.check_available()?;
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
