//! Error types for the `ragkit-model` crate.

use thiserror::Error;

/// Errors that can occur while generating text.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller passed input the operation cannot use.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The generation backend rejected or failed the request.
    #[error("Generation error ({provider}): {message}")]
    ApiError {
        /// The backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The backend answered without any text.
    #[error("Generation error ({provider}): response contained no text")]
    EmptyResponse {
        /// The backend that produced the empty response.
        provider: String,
    },
}

/// A convenience result type for generation operations.
pub type Result<T> = std::result::Result<T, ModelError>;
