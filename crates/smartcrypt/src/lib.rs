//! # SmartCrypt Engine
//!
//! The unified API for the SmartCrypt system: access-control decisions,
//! the encryption lifecycle, workflow sequencing, and notification
//! dispatch over a pluggable store.
//!
//! ## Overview
//!
//! An actor requests an action; the permission matrix authorizes it; if
//! the action mutates encryption state, the lifecycle performs the
//! transition and the sequencer schedules any follow-up after the current
//! dialog settles; the dispatcher informs affected parties.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use smartcrypt::{Engine, EngineConfig};
//! use smartcrypt_analysis::{CannedAnalyzer, CannedAssistant};
//! use smartcrypt_store::MemoryStore;
//!
//! let engine = Engine::new(
//!     MemoryStore::new(),
//!     Arc::new(CannedAnalyzer::new()),
//!     Arc::new(CannedAssistant::new("We are on it.")),
//!     EngineConfig::default(),
//! );
//! ```
//!
//! ## Key Pieces
//!
//! - [`Engine`] - the facade over a [`smartcrypt_store::Store`]
//! - [`Sequencer`] / [`FollowUp`] - the single-slot deferred-action
//!   register driven by an explicit `dialog_settled` event
//! - [`ViewOutcome`] / [`DownloadOutcome`] - denial is a value, not an
//!   error
//! - [`listing`] - the dashboard tab filters, all sharing one policy
//!   evaluation path

pub mod engine;
pub mod error;
pub mod listing;
pub mod sequencer;

pub use engine::{
    Credentials, DashboardStats, DownloadOutcome, Engine, EngineConfig, NewAdmin, NewUser,
    ViewOutcome,
};
pub use error::{EngineError, Result};
pub use sequencer::{FollowUp, Sequencer, SequencerState};
