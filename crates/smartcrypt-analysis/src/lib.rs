//! # SmartCrypt Analysis
//!
//! External collaborator interfaces for the SmartCrypt engine.
//!
//! ## Overview
//!
//! Two collaborators, both opaque to the engine:
//!
//! - [`ThreatAnalyzer`] - given a filename, returns a [`ThreatReport`].
//!   The engine validates only that all four report fields are present;
//!   any failure substitutes [`ThreatReport::failsafe`] (Critical).
//! - [`SupportAssistant`] - drafts the initial reply to a help-desk
//!   request before administrators are notified.
//!
//! Canned in-memory implementations live in `analyzer::canned` and
//! `assistant::canned` for tests.

pub mod analyzer;
pub mod assistant;
pub mod error;
pub mod report;

pub use analyzer::{canned::CannedAnalyzer, ThreatAnalyzer};
pub use assistant::{canned::CannedAssistant, SupportAssistant};
pub use error::{AnalysisError, Result};
pub use report::{parse_report, RawReport, ThreatLevel, ThreatReport};
