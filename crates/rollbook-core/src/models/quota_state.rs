use serde::{Deserialize, Serialize};

/// Remote write-quota state. Always derived from the last quota failure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaState {
    Normal,
    Cooldown,
}
