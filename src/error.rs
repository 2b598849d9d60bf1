//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use thiserror::Error;

/// Main error type for admixcrf operations
#[derive(Error, Debug)]
pub enum AdmixError {
    /// I/O errors (thread spawn failures, telemetry output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data errors (window ordering, SNP-to-window mapping, buffer shape)
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Algorithm errors (degenerate emissions, non-finite probabilities)
    #[error("Algorithm error: {message}")]
    Algorithm { message: String },

    /// Configuration errors (out-of-range tunables, K mismatch, thread pool)
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Type alias for Results using AdmixError
pub type Result<T> = std::result::Result<T, AdmixError>;

impl AdmixError {
    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an algorithm error
    pub fn algorithm(message: impl Into<String>) -> Self {
        Self::Algorithm {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for AdmixError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::Config {
            message: format!("Failed to create thread pool: {}", err),
        }
    }
}
