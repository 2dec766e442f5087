use thiserror::Error;

/// Application-wide error types.
///
/// Covers both external collaborators (the ArticleMeta metadata source and
/// the search index) plus the serialization boundary between them.
/// `serde_json::Error` converts automatically via `#[from]`; HTTP-level
/// failures are classified by the client crates into the string-carrying
/// variants below.
#[derive(Error, Debug)]
pub enum AppError {
    /// Metadata source request failed.
    ///
    /// Raised when an ArticleMeta call returns a non-success status or the
    /// response body cannot be decoded.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// Search index operation failed.
    ///
    /// Raised for index creation, upsert, or delete failures other than the
    /// distinguishable not-found condition.
    #[error("Search index error: {0}")]
    IndexError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    ///
    /// Typically a malformed base address for one of the collaborators.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Document absent from the index.
    ///
    /// Raised by delete when the index reports 404. The sync driver treats
    /// this as already-satisfied and continues.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Generic application error for cases not covered by specific variants.
    #[error("Error: {0}")]
    Generic(String),
}
