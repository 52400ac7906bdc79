//! Error types for the SmartCrypt core.

use thiserror::Error;

/// Validation failures. These are recovered locally and surfaced to the
/// initiating actor as a rejection; no state changes on any of them.
///
/// Access denials (policy or key mismatch) are NOT errors — they are
/// ordinary `Denied` results the caller renders as a message.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("at least one recipient is required")]
    NoRecipients,

    #[error("access policy must not be empty")]
    EmptyPolicy,

    #[error("username {0:?} is already taken")]
    DuplicateUsername(String),

    #[error("user id {0:?} is already taken")]
    DuplicateUserId(String),

    #[error("required field {0:?} is missing")]
    MissingField(&'static str),

    #[error("message must not be empty")]
    EmptyMessage,
}

/// Result type for validating operations.
pub type Result<T> = std::result::Result<T, ValidationError>;
