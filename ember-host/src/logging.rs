//! Logging setup.

use anyhow::{anyhow, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Build the filter: `RUST_LOG` wins over the configured level.
pub fn filter(log_level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(log_level)
            .map_err(|e| anyhow!("invalid log level {}: {}", log_level, e)),
    }
}

/// Install the global subscriber. Logs go to stderr; stdout carries script responses.
pub fn init(log_level: &str) -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(filter(log_level)?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
