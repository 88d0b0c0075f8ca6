//! Error types for the `docqa` crate.

use thiserror::Error;

/// Errors that can occur while running the question-answering pipeline.
///
/// Every error aborts the current run: there are no automatic retries and
/// no fallback to a lower-quality stage. The caller receives exactly one
/// descriptive failure.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied unusable input (empty text, blank question,
    /// missing credential, bad chunk parameters).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Embedding shapes are inconsistent within a run, either across
    /// vectors (dimensionality) or against the chunk count.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An external collaborator (embedder, reranker, answerer, or document
    /// source) failed: network error, auth rejection, timeout, or a
    /// malformed response.
    #[error("{collaborator} unavailable: {message}")]
    CollaboratorUnavailable {
        /// The collaborator that produced the failure.
        collaborator: String,
        /// A description of the failure.
        message: String,
    },

    /// A stage produced nothing to continue with: no chunks survived
    /// splitting, or the reranker returned zero documents.
    #[error("empty result: {0}")]
    EmptyResult(String),

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build an [`Error::CollaboratorUnavailable`] for the named collaborator.
    pub fn collaborator(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CollaboratorUnavailable {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
