//! Logging setup errors

use thiserror::Error;

/// Errors raised while installing the global subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber was already installed
    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),

    /// The log file or its directory could not be created
    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),
}
