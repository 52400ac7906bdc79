//! Error types for the engine.

use smartcrypt_analysis::AnalysisError;
use smartcrypt_core::ValidationError;
use smartcrypt_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
///
/// None of these is fatal: every error is per-action, and the store's
/// prior state remains valid after any rejected action. Access denials are
/// not errors — they come back as `Denied` outcomes.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The help-desk assistant failed.
    #[error("assistant error: {0}")]
    Assistant(#[from] AnalysisError),

    /// The actor lacks permission for this action.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Acting or target user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Target file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// An analysis of this file is already pending.
    #[error("analysis already pending for file: {0}")]
    AnalysisPending(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
