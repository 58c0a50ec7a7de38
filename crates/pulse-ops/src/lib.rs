//! Operational helpers: logging setup.

use pulse_types::{config::OpsConfig, PulseError, Result};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Builds the log filter from `log_level`, falling back to `info` when the
/// directive does not parse.
pub fn log_filter(config: &OpsConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| PulseError::Ops(format!("failed to create log filter: {err}")))
}

/// Installs the global fmt subscriber. Logs go to stderr so command output
/// on stdout stays machine-readable.
pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = log_filter(config)?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| PulseError::Ops(format!("tracing init error: {err}")))?;
    debug!(level = %config.log_level, "tracing initialised");
    Ok(())
}
