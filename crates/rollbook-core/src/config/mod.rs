//! TOML configuration. Every section is optional; missing fields take defaults.

pub mod defaults;
mod observability_config;
mod remote_config;
mod storage_config;
mod sync_config;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use observability_config::ObservabilityConfig;
pub use remote_config::RemoteConfig;
pub use storage_config::StorageConfig;
pub use sync_config::SyncConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbookConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub observability: ObservabilityConfig,
}

impl RollbookConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.cooldown_secs == 0 {
            return Err(invalid("sync.cooldown_secs", "must be greater than 0"));
        }
        if self.storage.key_prefix.is_empty() {
            return Err(invalid("storage.key_prefix", "must not be empty"));
        }
        if self.storage.quota_key.is_empty() {
            return Err(invalid("storage.quota_key", "must not be empty"));
        }
        if self
            .storage
            .quota_key
            .starts_with(&format!("{}/", self.storage.key_prefix))
        {
            return Err(invalid(
                "storage.quota_key",
                "must not live under storage.key_prefix",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
