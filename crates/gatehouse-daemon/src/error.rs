//! Error types for gatehouse-daemon

use gatehouse_types::RegistryError;

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

/// Errors that can occur in the daemon
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid purge window: start age {start_secs}s must be less than end age {end_secs}s")]
    InvalidPurgeWindow { start_secs: u64, end_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Actuator delivery failure.
///
/// Actuation is best-effort: these are logged at the dispatch boundary
/// and never roll back a registry transition.
#[derive(Debug, thiserror::Error)]
#[error("Actuator delivery failed: {0}")]
pub struct ActuatorError(pub String);
