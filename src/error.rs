//! Error types for coverscout
//!
//! Everything below the pipeline boundary degrades to "fewer candidates":
//! sniff failures, source failures and timeouts are absorbed where they
//! occur and logged, never propagated. Only programmer-error-class
//! failures (an invalid request, an unbuildable HTTP client) surface as
//! hard errors to the caller.

use thiserror::Error;

/// Metadata sniffing errors, local to one candidate's resolution
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SniffError {
    /// Buffered bytes match no known image signature, or the buffer cap
    /// was reached before dimensions could be extracted
    #[error("Unrecognized image format")]
    UnrecognizedFormat,

    /// Stream ended before enough header bytes were available
    #[error("Stream truncated before image dimensions were available")]
    TruncatedStream,
}

/// Cover source query errors, local to one source
///
/// The orchestrator treats any of these as "zero candidates from this
/// source"; they never abort the batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Hard errors surfaced to the pipeline caller
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed selection request, rejected before any network work
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result type for pipeline-boundary operations
pub type Result<T> = std::result::Result<T, Error>;
