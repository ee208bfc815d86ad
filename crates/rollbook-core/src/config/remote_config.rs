use serde::{Deserialize, Serialize};

use super::defaults;

/// Remote document store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Bearer token. Empty means unauthenticated.
    pub api_key: String,
}

impl RemoteConfig {
    pub fn bearer_token(&self) -> Option<&str> {
        (!self.api_key.is_empty()).then_some(self.api_key.as_str())
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_REMOTE_BASE_URL.to_string(),
            api_key: String::new(),
        }
    }
}
