//! # SmartCrypt Core
//!
//! Pure domain types for the SmartCrypt engine: users, files, encryption
//! states, notifications, and the activity log.
//!
//! This crate contains no I/O, no storage, no async. It is pure data with
//! the invariants encoded in the types.
//!
//! ## Key Types
//!
//! - [`User`] - An account with a [`Role`], a status, and an attribute set
//! - [`FileItem`] - An uploaded file with its [`Encryption`] state
//! - [`Encryption`] - Sum type over Plaintext / Standard / Policy; a file
//!   can never hold both a key and a policy
//! - [`Notification`] / [`ActivityEntry`] - Single-recipient notifications
//!   and the append-only activity log
//!
//! ## Invariants
//!
//! The mutual exclusion of standard and policy encryption is structural:
//! there is no representable state with both sub-fields set.

pub mod activity;
pub mod error;
pub mod file;
pub mod notification;
pub mod types;
pub mod user;

pub use activity::{ActivityEntry, ActivityKind};
pub use error::ValidationError;
pub use file::{
    mime_type_for, DecryptionKey, Encryption, EncryptionKind, FileItem, PolicyMode,
};
pub use notification::{Notification, NotifyTarget};
pub use types::{FileId, LogId, NotificationId, UserId};
pub use user::{attribute_value, Role, User, UserBuilder, UserStatus};
