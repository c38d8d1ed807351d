//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur while installing the global subscriber
#[derive(Debug, Clone, Error)]
pub enum LoggingError {
    /// A global subscriber was already installed, or the filter was rejected
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// The requested level or format cannot be used
    #[error("Invalid logging configuration: {0}")]
    InvalidConfiguration(String),
}
