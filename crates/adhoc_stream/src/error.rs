//! Stream error types

use thiserror::Error;

/// Errors carried on a stream's error channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// A producer failed while emitting
    #[error("producer failed: {0}")]
    Producer(String),

    /// An operator rejected a value
    #[error("operator failed: {0}")]
    Operator(String),
}

/// Result type for fallible stream operators
pub type Result<T> = std::result::Result<T, StreamError>;
