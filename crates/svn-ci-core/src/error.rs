//! Error types for trigger evaluation and its remote collaborators.

use thiserror::Error;

/// Failure reported by a remote collaborator (build service or repository).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("unexpected response from {endpoint}: {reason}")]
    Response { endpoint: String, reason: String },
}

impl SourceError {
    /// Transport-level failure: the call never produced a usable response.
    pub fn request(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::Request {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// The call completed but the response was an error or unusable.
    pub fn response(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::Response {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for collaborator calls.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Branch resolution failure for a single build definition.
///
/// A failed wildcard listing aborts resolution for the whole definition
/// instead of skipping the wildcard: a partial branch list would silently
/// stop triggering CI for the missing branches.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to list branches under '{base}': {source}")]
    Listing {
        base: String,
        #[source]
        source: SourceError,
    },
}
