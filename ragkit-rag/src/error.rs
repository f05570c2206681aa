//! Error types for the `ragkit-rag` crate.

use thiserror::Error;

use crate::document::ScoredSegment;

/// Errors that can occur in retrieval operations.
///
/// Nothing here is retried internally; each variant names the operation and
/// the offending value so a caller can log it or apply its own retry policy.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid chunking, index or pipeline parameters.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The embedding backend could not produce a vector.
    #[error("Embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A document could not be ingested. The index is unchanged.
    #[error("Ingest of document '{document_id}' failed: {cause}")]
    IngestFailed {
        /// The identifier of the document being ingested.
        document_id: String,
        /// The embedding or index failure that aborted the ingest.
        #[source]
        cause: Box<RagError>,
    },

    /// The operation needs at least one successful ingest first.
    #[error("Pipeline not ready: '{operation}' called before any document was ingested")]
    NotReady {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// A caller-supplied argument is out of range.
    #[error("Invalid argument to '{operation}': {message}")]
    InvalidArgument {
        /// The operation that rejected the argument.
        operation: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The generation backend failed while answering.
    ///
    /// The segments retrieved for the question are kept so the caller still
    /// has something to show.
    #[error("Generation unavailable: {message}")]
    GenerationUnavailable {
        /// A description of the failure.
        message: String,
        /// The segments that were retrieved as context.
        retrieved: Vec<ScoredSegment>,
    },

    /// An error occurred in the vector index backend.
    #[error("Vector index error ({backend}): {message}")]
    IndexError {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    pub(crate) fn invalid_argument(operation: &'static str, message: impl Into<String>) -> Self {
        RagError::InvalidArgument { operation, message: message.into() }
    }

    pub(crate) fn index(backend: &str, message: impl Into<String>) -> Self {
        RagError::IndexError { backend: backend.to_string(), message: message.into() }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
