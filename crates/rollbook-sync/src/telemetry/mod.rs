//! Structured logging setup and span helpers.

pub mod spans;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use rollbook_core::config::ObservabilityConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    result.is_ok()
}
