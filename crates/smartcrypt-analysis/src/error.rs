//! Error types for the analysis collaborators.

use thiserror::Error;

/// Errors from the external collaborators.
///
/// These never escape the engine's analysis path: a failed analysis is
/// recovered into the fail-safe Critical report. Help-desk failures are
/// surfaced to the initiating actor.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The collaborator could not be reached.
    #[error("collaborator unreachable: {0}")]
    Unreachable(String),

    /// The collaborator answered, but the payload is missing required
    /// fields or is not parseable.
    #[error("malformed report: {0}")]
    MalformedReport(String),
}

/// Result type for collaborator operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
