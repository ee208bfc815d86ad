/// Configuration loading and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {reason}")]
    Parse { reason: String },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}
