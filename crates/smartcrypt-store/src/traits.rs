//! Store trait: the abstract interface over the four persisted collections.
//!
//! This trait keeps the engine storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;

use smartcrypt_core::{
    ActivityEntry, FileId, FileItem, Notification, NotificationId, User, UserId,
};

use crate::error::Result;

/// Result of inserting a user.
///
/// Uniqueness of the id and of the username (case-insensitive, across all
/// roles) is decided here, inside the store's write lock, so two racing
/// creations cannot both succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertUserOutcome {
    /// User was inserted.
    Inserted,
    /// Another user already holds this id.
    DuplicateId,
    /// Another user already holds this username.
    DuplicateUsername,
}

/// The Store trait: async interface over users, files, notifications, and
/// the activity log.
///
/// # Design Notes
///
/// - **Whole-record swaps**: updates replace the stored record with a new
///   value; there is no field-level mutation, so a rejected operation
///   leaves the prior record intact.
/// - **Newest first**: all listing methods return reverse-chronological
///   order. Batch notification pushes preserve in-call insertion order at
///   the head of the list.
/// - **Weak references**: deleting a user does not cascade to their
///   notifications, activity entries, or uploaded files.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a user, enforcing id and username uniqueness.
    async fn insert_user(&self, user: &User) -> Result<InsertUserOutcome>;

    /// Get a user by id.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Find a user by username, case-insensitively.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// List all users, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Replace a stored user record.
    ///
    /// Errors with `NotFound` if no user with this id exists.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Remove a user. Returns whether a record was removed.
    async fn delete_user(&self, id: &UserId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // File Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new file at the head of the list.
    async fn insert_file(&self, file: &FileItem) -> Result<()>;

    /// Get a file by id.
    async fn get_file(&self, id: &FileId) -> Result<Option<FileItem>>;

    /// List all files, newest first.
    async fn list_files(&self) -> Result<Vec<FileItem>>;

    /// Replace a stored file record.
    ///
    /// Errors with `NotFound` if no file with this id exists.
    async fn update_file(&self, file: &FileItem) -> Result<()>;

    /// Remove a file. Returns whether a record was removed.
    async fn delete_file(&self, id: &FileId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Notification Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Prepend a batch of notifications, preserving the batch's order at
    /// the head of the list.
    async fn push_notifications(&self, batch: &[Notification]) -> Result<()>;

    /// List a user's notifications, newest first.
    async fn notifications_for(&self, user_id: &UserId) -> Result<Vec<Notification>>;

    /// Replace a stored notification (read-state changes).
    async fn update_notification(&self, notification: &Notification) -> Result<()>;

    /// Mark all of a user's notifications as read.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<()>;

    /// Hard-remove a notification. Returns whether a record was removed.
    async fn delete_notification(&self, id: &NotificationId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Activity Log Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an activity entry. Entries are never mutated or deleted.
    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()>;

    /// List all activity entries, newest first.
    async fn list_activity(&self) -> Result<Vec<ActivityEntry>>;
}
