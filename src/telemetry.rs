//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSection;

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// filter; the JSON format is for log shippers, the default for terminals.
pub fn init(logging: &LoggingSection) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.clone()));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;
    }
    Ok(())
}
