//! Notification records.
//!
//! Notifications are single-recipient. A message addressed to "all
//! administrators" is materialized as one record per admin at dispatch
//! time; there is no group-addressed record.

use serde::{Deserialize, Serialize};

use crate::types::{NotificationId, UserId};

/// Dispatch target for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyTarget {
    /// A single user. Unknown ids are a silent no-op, not an error.
    User(UserId),
    /// Every current administrator, snapshotted at dispatch time.
    Admins,
}

/// A notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable identifier, tied to the dispatch timestamp and recipient.
    pub id: NotificationId,

    /// The single recipient.
    pub user_id: UserId,

    /// Display message.
    pub message: String,

    /// Dispatch time (Unix milliseconds).
    pub timestamp: i64,

    /// Whether the recipient has read it.
    pub read: bool,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(
        id: impl Into<NotificationId>,
        user_id: impl Into<UserId>,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            message: message.into(),
            timestamp,
            read: false,
        }
    }

    /// A copy marked as read.
    pub fn marked_read(&self) -> Self {
        let mut updated = self.clone();
        updated.read = true;
        updated
    }
}
