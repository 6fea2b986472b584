use {
    tracing::Level,
    tracing_subscriber::{fmt, EnvFilter},
};

use crate::{Config, Error};

/// Installs the global `tracing` subscriber. `RUST_LOG`, when set, takes
/// precedence over the configured verbosity.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init(config: &Config) -> Result<(), Error> {
    let level: Level = config.logger.verbosity.into();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::ConfigError(format!("Failed to install logger: {e}")))
}
