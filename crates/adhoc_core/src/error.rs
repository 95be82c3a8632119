//! Binder error types

use adhoc_stream::StreamError;
use thiserror::Error;

/// Errors raised while binding streams to a component
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// `dispatch` was called while the source stream was not started
    #[error("dispatch called while the source stream is inactive")]
    Inactive,

    /// A blueprint key shadows a property the binder injects itself
    #[error("blueprint `{key}` collides with reserved property `{reserved}`")]
    ReservedName { key: String, reserved: String },

    /// A derived stream terminated with an error
    #[error("stream for property `{property}` failed: {source}")]
    Stream {
        property: String,
        #[source]
        source: StreamError,
    },
}

/// Result type for binder operations
pub type Result<T> = std::result::Result<T, BindError>;
