//! Files and their encryption state.
//!
//! A file is in exactly one of three protection states, modeled as a sum
//! type so that "both a key and a policy are set" is unrepresentable.

use std::collections::BTreeSet;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{FileId, UserId};

/// The shared secret gating a standard-encrypted file.
///
/// Comparison is exact and case-sensitive; `CLOUD-FOREST-482` and
/// `cloud-forest-482` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecryptionKey(pub String);

impl DecryptionKey {
    /// Create a key from anything string-like.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive comparison against a supplied string.
    pub fn matches(&self, supplied: &str) -> bool {
        self.0 == supplied
    }
}

impl std::fmt::Display for DecryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the required values of an attribute policy combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyMode {
    /// Strict: the user must hold every required value.
    #[default]
    And,
    /// Flexible: one matching value suffices.
    Or,
}

/// Discriminator for the encryption state, for callers that only need the
/// shape and not the payload (badges, permission checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncryptionKind {
    None,
    Standard,
    Abe,
}

/// A file's protection state.
///
/// Re-sharing in the other mode replaces the whole variant: a policy share
/// drops the key and recipient list, a standard share drops the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encryption {
    /// No protection; anyone may view and download.
    Plaintext,
    /// Key-based protection for a named recipient list.
    Standard {
        key: DecryptionKey,
        shared_with: BTreeSet<UserId>,
    },
    /// Attribute-policy protection: comma-separated required values plus a
    /// combination mode. No recipient list, no key.
    Policy { policy: String, mode: PolicyMode },
}

impl Encryption {
    /// Whether the file is protected at all.
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Encryption::Plaintext)
    }

    /// The state's discriminator.
    pub fn kind(&self) -> EncryptionKind {
        match self {
            Encryption::Plaintext => EncryptionKind::None,
            Encryption::Standard { .. } => EncryptionKind::Standard,
            Encryption::Policy { .. } => EncryptionKind::Abe,
        }
    }

    /// The recipient list, if this is a standard-encrypted file.
    pub fn shared_with(&self) -> Option<&BTreeSet<UserId>> {
        match self {
            Encryption::Standard { shared_with, .. } => Some(shared_with),
            _ => None,
        }
    }
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    /// Stable identifier.
    pub id: FileId,

    /// Original filename, including extension.
    pub filename: String,

    /// Upload time (Unix milliseconds).
    pub uploaded_at: i64,

    /// Uploader's username at upload time (display only).
    pub uploader: String,

    /// Immutable owner reference.
    pub uploader_id: UserId,

    /// Opaque content payload.
    pub content: Bytes,

    /// MIME type, supplied or inferred from the filename.
    pub mime_type: String,

    /// Current protection state.
    pub encryption: Encryption,

    /// Users who have successfully downloaded the content. Grows
    /// monotonically; never cleared.
    pub downloaded_by: BTreeSet<UserId>,
}

impl FileItem {
    /// Create a plaintext file.
    pub fn new(
        id: impl Into<FileId>,
        filename: impl Into<String>,
        uploaded_at: i64,
        uploader: impl Into<String>,
        uploader_id: impl Into<UserId>,
        content: Bytes,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            uploaded_at,
            uploader: uploader.into(),
            uploader_id: uploader_id.into(),
            content,
            mime_type: mime_type.into(),
            encryption: Encryption::Plaintext,
            downloaded_by: BTreeSet::new(),
        }
    }

    /// Whether the given user owns this file.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.uploader_id == user_id
    }

    /// Whether the file is protected at all.
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_encrypted()
    }

    /// Whether the given user is on the standard-share recipient list.
    pub fn is_shared_with(&self, user_id: &UserId) -> bool {
        self.encryption
            .shared_with()
            .map(|s| s.contains(user_id))
            .unwrap_or(false)
    }

    /// A copy of this file with the user recorded as a downloader.
    /// Idempotent union; the set never shrinks.
    pub fn with_download_by(&self, user_id: UserId) -> Self {
        let mut updated = self.clone();
        updated.downloaded_by.insert(user_id);
        updated
    }
}

/// Infer a MIME type from a filename extension.
///
/// Unknown and missing extensions fall back to `application/octet-stream`.
pub fn mime_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "txt" => "text/plain",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
