//! Append-only activity log entries.

use serde::{Deserialize, Serialize};

use crate::types::LogId;

/// The kind of logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Upload,
    Share,
    Login,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ActivityKind::Upload => "Upload",
            ActivityKind::Share => "Share",
            ActivityKind::Login => "Login",
        })
    }
}

/// One entry in the activity log. Entries are appended and never mutated
/// or deleted; deleting a user leaves their entries in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Stable identifier.
    pub id: LogId,

    /// Username of the acting user at the time of the action.
    pub username: String,

    /// What was done.
    pub kind: ActivityKind,

    /// When (Unix milliseconds).
    pub timestamp: i64,
}

impl ActivityEntry {
    /// Create an entry.
    pub fn new(
        id: impl Into<LogId>,
        username: impl Into<String>,
        kind: ActivityKind,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            kind,
            timestamp,
        }
    }
}
