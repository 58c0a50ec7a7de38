use thiserror::Error;

pub type Result<T, E = PulseError> = std::result::Result<T, E>;

/// Unified error type covering the failure scenarios of every subsystem.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("telemetry unavailable: {0}")]
    TelemetryUnavailable(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("repository error: {0}")]
    Repository(String),
    #[error("aggregation failed: {0}")]
    Aggregation(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
