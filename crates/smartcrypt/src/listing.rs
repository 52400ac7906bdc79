//! File listing filters for the dashboard tabs.
//!
//! Pure functions over a file slice, so every view derives from the same
//! predicates. The received-files filter goes through the same policy
//! evaluation as viewing and downloading — the call sites must not
//! diverge.

use smartcrypt_core::{EncryptionKind, FileItem, User};
use smartcrypt_perms::evaluate_file;

/// Files the user uploaded.
pub fn my_files<'a>(files: &'a [FileItem], user: &User) -> Vec<&'a FileItem> {
    files.iter().filter(|f| f.is_owned_by(&user.id)).collect()
}

/// Files the user uploaded and shared: a non-empty recipient list, or any
/// policy protection.
pub fn shared_by_me<'a>(files: &'a [FileItem], user: &User) -> Vec<&'a FileItem> {
    files
        .iter()
        .filter(|f| {
            f.is_owned_by(&user.id)
                && (f.encryption.shared_with().map_or(false, |s| !s.is_empty())
                    || f.encryption.kind() == EncryptionKind::Abe)
        })
        .collect()
}

/// Files shared with the user: direct recipient-list membership, or a
/// policy the user's attributes satisfy.
pub fn received_files<'a>(files: &'a [FileItem], user: &User) -> Vec<&'a FileItem> {
    files
        .iter()
        .filter(|f| f.is_shared_with(&user.id) || evaluate_file(user, f).is_granted())
        .collect()
}

/// Files the user has downloaded.
pub fn downloaded_files<'a>(files: &'a [FileItem], user: &User) -> Vec<&'a FileItem> {
    files
        .iter()
        .filter(|f| f.downloaded_by.contains(&user.id))
        .collect()
}
