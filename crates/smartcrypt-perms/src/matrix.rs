//! The permission matrix: pure predicates mapping (role, ownership, file
//! state) to allowed actions.
//!
//! Viewing and downloading are always allowed here; the encryption
//! lifecycle gates them separately. Level 4 is the restricted role: it can
//! never share, delete, edit, or analyze, regardless of ownership.

use smartcrypt_core::{FileItem, Role, User};

/// An action on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAction {
    View,
    Download,
    Share,
    Delete,
    Edit,
    Analyze,
}

impl FileAction {
    /// All file actions, for exhaustive test sweeps.
    pub const ALL: [FileAction; 6] = [
        FileAction::View,
        FileAction::Download,
        FileAction::Share,
        FileAction::Delete,
        FileAction::Edit,
        FileAction::Analyze,
    ];
}

/// Decide whether `user` may perform `action` on `file`.
///
/// Deterministic in its three inputs; no side effects.
pub fn can_perform(action: FileAction, user: &User, file: &FileItem) -> bool {
    let is_owner = file.is_owned_by(&user.id);
    let restricted = user.role.is_restricted();

    match action {
        // Gated by the encryption lifecycle, not by the matrix.
        FileAction::View => true,
        FileAction::Download => true,
        FileAction::Share => {
            !restricted && (is_owner || matches!(user.role, Role::Level1 | Role::Level2))
        }
        FileAction::Delete => {
            !restricted && (is_owner || matches!(user.role, Role::Admin | Role::Level1))
        }
        FileAction::Edit => {
            !restricted && (user.role == Role::Admin || (is_owner && user.role == Role::Level1))
        }
        FileAction::Analyze => {
            !restricted
                && matches!(user.role, Role::Admin | Role::Level1)
                && !file.is_encrypted()
        }
    }
}

/// A user-management action, decided on role alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManageAction {
    /// Block an account (or unblock it).
    Block,
    /// Suspend an account (or unsuspend it).
    Suspend,
    /// Remove an account.
    Delete,
}

/// Decide whether a user with `role` may perform a management action.
pub fn can_manage(action: ManageAction, role: Role) -> bool {
    match action {
        ManageAction::Block => role == Role::Admin,
        ManageAction::Delete => role == Role::Admin,
        ManageAction::Suspend => matches!(role, Role::Admin | Role::Level1 | Role::Level2),
    }
}

/// The management listing: every non-admin account.
///
/// Admin accounts never appear in management views and are never targets
/// of add/delete/status actions — this filter is the invariant, not a
/// runtime guard scattered across call sites.
pub fn manageable_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Vec<&'a User> {
    users.into_iter().filter(|u| !u.is_admin()).collect()
}
