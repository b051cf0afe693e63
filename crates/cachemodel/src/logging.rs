use thiserror::Error as ThisError;
use tracing_subscriber::EnvFilter;

/// Directive used when neither a filter nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "warn";

///
/// LoggingError
///

#[derive(Debug, ThisError)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Resolve a filter directive. An empty directive defers to `RUST_LOG`,
/// then to [`DEFAULT_FILTER`].
pub fn build_filter(filter: &str) -> Result<EnvFilter, LoggingError> {
    if filter.trim().is_empty() {
        return Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)));
    }

    EnvFilter::try_new(filter).map_err(|e| LoggingError::InvalidFilter {
        filter: filter.to_string(),
        message: e.to_string(),
    })
}

/// Install a stderr `fmt` subscriber for the whole process.
pub fn init_logging(filter: &str) -> Result<(), LoggingError> {
    let filter = build_filter(filter)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(version = crate::VERSION, "logging initialised");

    Ok(())
}
