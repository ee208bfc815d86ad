use serde::{Deserialize, Serialize};

/// Options for a coordinated save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Skip the debounce window and write now, even during a quota cooldown.
    pub immediate: bool,
}

impl SaveOptions {
    pub fn immediate() -> Self {
        Self { immediate: true }
    }

    pub fn debounced() -> Self {
        Self { immediate: false }
    }
}

/// Options for a remote document write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptions {
    /// Field-level merge instead of full replace.
    pub merge: bool,
}

impl SetOptions {
    pub fn replace() -> Self {
        Self { merge: false }
    }

    pub fn merge() -> Self {
        Self { merge: true }
    }
}
