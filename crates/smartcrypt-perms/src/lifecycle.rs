//! The encryption lifecycle state machine.
//!
//! Transitions: Plaintext → Standard (standard share), Plaintext → Policy
//! (policy share). Once encrypted, re-sharing in the other mode replaces
//! the previous protection outright — the engine does not layer policies.
//!
//! Every transition is a pure reducer: it takes the old file and returns a
//! new value for the store to swap in atomically. A rejected transition
//! leaves the prior state untouched.

use std::collections::BTreeSet;

use rand::Rng;

use smartcrypt_core::{
    DecryptionKey, Encryption, FileItem, PolicyMode, UserId, ValidationError,
};

use crate::policy::Decision;

/// Result of a successful standard share: the updated file plus the key
/// to reveal once the share dialog has settled.
#[derive(Debug, Clone)]
pub struct ShareOutcome {
    pub file: FileItem,
    pub key: DecryptionKey,
}

/// Share a file with a named recipient list under a fresh key.
///
/// Fails with [`ValidationError::NoRecipients`] on an empty list. Repeated
/// standard shares union the recipients (idempotent), but every call
/// generates a new key — only the most recent key is active. A prior
/// policy is discarded, and its recipient set starts from empty.
pub fn share_standard<R: Rng + ?Sized>(
    file: &FileItem,
    recipients: &BTreeSet<UserId>,
    rng: &mut R,
) -> Result<ShareOutcome, ValidationError> {
    if recipients.is_empty() {
        return Err(ValidationError::NoRecipients);
    }

    let key = crate::keygen::generate_key(rng);

    let mut shared_with = match &file.encryption {
        Encryption::Standard { shared_with, .. } => shared_with.clone(),
        _ => BTreeSet::new(),
    };
    shared_with.extend(recipients.iter().cloned());

    let mut updated = file.clone();
    updated.encryption = Encryption::Standard {
        key: key.clone(),
        shared_with,
    };

    Ok(ShareOutcome { file: updated, key })
}

/// Protect a file with an attribute policy.
///
/// Fails with [`ValidationError::EmptyPolicy`] if the policy trims to
/// nothing. Clears any previous key and recipient list; policy-encrypted
/// files carry no direct share list.
pub fn share_policy(
    file: &FileItem,
    policy: &str,
    mode: PolicyMode,
) -> Result<FileItem, ValidationError> {
    if policy.trim().is_empty() {
        return Err(ValidationError::EmptyPolicy);
    }

    let mut updated = file.clone();
    updated.encryption = Encryption::Policy {
        policy: policy.to_owned(),
        mode,
    };
    Ok(updated)
}

/// Check a supplied key against a standard-encrypted file.
///
/// Exact, case-sensitive match. Only meaningful for standard encryption;
/// every other state answers `Denied`. Attempts are independent — there is
/// no lockout or backoff.
pub fn verify_key(file: &FileItem, supplied: &str) -> Decision {
    match &file.encryption {
        Encryption::Standard { key, .. } if key.matches(supplied) => Decision::Granted,
        _ => Decision::Denied,
    }
}
