//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use smartcrypt_core::{
    ActivityEntry, ActivityKind, DecryptionKey, Encryption, FileId, FileItem, Notification,
    NotificationId, PolicyMode, Role, User, UserId, UserStatus,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InsertUserOutcome, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via an internal mutex; every operation runs on the blocking
/// thread pool so the async runtime is never stalled on disk I/O.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(&path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!("opened sqlite store at {}", path.as_ref().display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::InvalidData("connection mutex poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Column encoding helpers
// ─────────────────────────────────────────────────────────────────────────

fn role_to_db(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Level1 => "level1",
        Role::Level2 => "level2",
        Role::Level3 => "level3",
        Role::Level4 => "level4",
    }
}

fn role_from_db(value: &str) -> Result<Role> {
    match value {
        "admin" => Ok(Role::Admin),
        "level1" => Ok(Role::Level1),
        "level2" => Ok(Role::Level2),
        "level3" => Ok(Role::Level3),
        "level4" => Ok(Role::Level4),
        other => Err(StoreError::InvalidData(format!("unknown role: {other}"))),
    }
}

fn status_to_db(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Active => "active",
        UserStatus::Blocked => "blocked",
        UserStatus::Suspended => "suspended",
    }
}

fn status_from_db(value: &str) -> Result<UserStatus> {
    match value {
        "active" => Ok(UserStatus::Active),
        "blocked" => Ok(UserStatus::Blocked),
        "suspended" => Ok(UserStatus::Suspended),
        other => Err(StoreError::InvalidData(format!("unknown status: {other}"))),
    }
}

fn kind_to_db(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Upload => "upload",
        ActivityKind::Share => "share",
        ActivityKind::Login => "login",
    }
}

fn kind_from_db(value: &str) -> Result<ActivityKind> {
    match value {
        "upload" => Ok(ActivityKind::Upload),
        "share" => Ok(ActivityKind::Share),
        "login" => Ok(ActivityKind::Login),
        other => Err(StoreError::InvalidData(format!(
            "unknown activity kind: {other}"
        ))),
    }
}

fn mode_to_db(mode: PolicyMode) -> &'static str {
    match mode {
        PolicyMode::And => "and",
        PolicyMode::Or => "or",
    }
}

fn mode_from_db(value: &str) -> Result<PolicyMode> {
    match value {
        "and" => Ok(PolicyMode::And),
        "or" => Ok(PolicyMode::Or),
        other => Err(StoreError::InvalidData(format!(
            "unknown policy mode: {other}"
        ))),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// The three encryption columns, flattened for binding.
struct EncryptionColumns {
    encryption_type: &'static str,
    decryption_key: Option<String>,
    shared_with: String,
    access_policy: Option<String>,
    policy_mode: Option<&'static str>,
}

fn encryption_columns(encryption: &Encryption) -> Result<EncryptionColumns> {
    Ok(match encryption {
        Encryption::Plaintext => EncryptionColumns {
            encryption_type: "none",
            decryption_key: None,
            shared_with: "[]".to_owned(),
            access_policy: None,
            policy_mode: None,
        },
        Encryption::Standard { key, shared_with } => EncryptionColumns {
            encryption_type: "standard",
            decryption_key: Some(key.as_str().to_owned()),
            shared_with: to_json(shared_with)?,
            access_policy: None,
            policy_mode: None,
        },
        Encryption::Policy { policy, mode } => EncryptionColumns {
            encryption_type: "abe",
            decryption_key: None,
            shared_with: "[]".to_owned(),
            access_policy: Some(policy.clone()),
            policy_mode: Some(mode_to_db(*mode)),
        },
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User> {
    let role: String = row.get("role")?;
    let status: String = row.get("status")?;
    let attributes: String = row.get("attributes")?;

    Ok(User {
        id: UserId::new(row.get::<_, String>("id")?),
        username: row.get("username")?,
        password: row.get("password")?,
        role: role_from_db(&role)?,
        role_name: row.get("role_name")?,
        status: status_from_db(&status)?,
        organization: row.get("organization")?,
        department: row.get("department")?,
        attributes: from_json::<BTreeSet<String>>(&attributes)?,
    })
}

fn row_to_file(row: &rusqlite::Row<'_>) -> Result<FileItem> {
    let encryption_type: String = row.get("encryption_type")?;
    let shared_with: String = row.get("shared_with")?;
    let downloaded_by: String = row.get("downloaded_by")?;

    let encryption = match encryption_type.as_str() {
        "none" => Encryption::Plaintext,
        "standard" => {
            let key: Option<String> = row.get("decryption_key")?;
            let key = key.ok_or_else(|| {
                StoreError::InvalidData("standard-encrypted file without a key".into())
            })?;
            Encryption::Standard {
                key: DecryptionKey::new(key),
                shared_with: from_json(&shared_with)?,
            }
        }
        "abe" => {
            let policy: Option<String> = row.get("access_policy")?;
            let policy = policy.ok_or_else(|| {
                StoreError::InvalidData("policy-encrypted file without a policy".into())
            })?;
            let mode: Option<String> = row.get("policy_mode")?;
            let mode = match mode {
                Some(m) => mode_from_db(&m)?,
                None => PolicyMode::default(),
            };
            Encryption::Policy { policy, mode }
        }
        other => {
            return Err(StoreError::InvalidData(format!(
                "unknown encryption type: {other}"
            )))
        }
    };

    Ok(FileItem {
        id: FileId::new(row.get::<_, String>("id")?),
        filename: row.get("filename")?,
        uploaded_at: row.get("uploaded_at")?,
        uploader: row.get("uploader")?,
        uploader_id: UserId::new(row.get::<_, String>("uploader_id")?),
        content: Bytes::from(row.get::<_, Vec<u8>>("content")?),
        mime_type: row.get("mime_type")?,
        encryption,
        downloaded_by: from_json(&downloaded_by)?,
    })
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> Result<Notification> {
    Ok(Notification {
        id: NotificationId::new(row.get::<_, String>("id")?),
        user_id: UserId::new(row.get::<_, String>("user_id")?),
        message: row.get("message")?,
        timestamp: row.get("timestamp")?,
        read: row.get("read")?,
    })
}

fn row_to_activity(row: &rusqlite::Row<'_>) -> Result<ActivityEntry> {
    let kind: String = row.get("kind")?;
    Ok(ActivityEntry {
        id: smartcrypt_core::LogId::new(row.get::<_, String>("id")?),
        username: row.get("username")?,
        kind: kind_from_db(&kind)?,
        timestamp: row.get("timestamp")?,
    })
}

fn upsert_file(conn: &Connection, file: &FileItem, insert: bool) -> Result<usize> {
    let cols = encryption_columns(&file.encryption)?;
    let sql = if insert {
        "INSERT INTO files (id, filename, uploaded_at, uploader, uploader_id, content,
            mime_type, encryption_type, decryption_key, shared_with, access_policy,
            policy_mode, downloaded_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    } else {
        "UPDATE files SET filename = ?2, uploaded_at = ?3, uploader = ?4,
            uploader_id = ?5, content = ?6, mime_type = ?7, encryption_type = ?8,
            decryption_key = ?9, shared_with = ?10, access_policy = ?11,
            policy_mode = ?12, downloaded_by = ?13
         WHERE id = ?1"
    };
    let changed = conn.execute(
        sql,
        params![
            file.id.as_str(),
            file.filename,
            file.uploaded_at,
            file.uploader,
            file.uploader_id.as_str(),
            file.content.as_ref(),
            file.mime_type,
            cols.encryption_type,
            cols.decryption_key,
            cols.shared_with,
            cols.access_policy,
            cols.policy_mode,
            to_json(&file.downloaded_by)?,
        ],
    )?;
    Ok(changed)
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_user(&self, user: &User) -> Result<InsertUserOutcome> {
        let user = user.clone();
        self.blocking(move |conn| {
            let id_taken: bool = conn
                .query_row(
                    "SELECT 1 FROM users WHERE id = ?1",
                    params![user.id.as_str()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if id_taken {
                return Ok(InsertUserOutcome::DuplicateId);
            }

            let name_taken: bool = conn
                .query_row(
                    "SELECT 1 FROM users WHERE LOWER(username) = LOWER(?1)",
                    params![user.username],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if name_taken {
                return Ok(InsertUserOutcome::DuplicateUsername);
            }

            conn.execute(
                "INSERT INTO users (id, username, password, role, role_name, status,
                    organization, department, attributes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.id.as_str(),
                    user.username,
                    user.password,
                    role_to_db(user.role),
                    user.role_name,
                    status_to_db(user.status),
                    user.organization,
                    user.department,
                    to_json(&user.attributes)?,
                ],
            )?;
            Ok(InsertUserOutcome::Inserted)
        })
        .await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let id = id.clone();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT * FROM users WHERE id = ?1",
                params![id.as_str()],
                |row| Ok(row_to_user(row)),
            )
            .optional()?
            .transpose()
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_owned();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT * FROM users WHERE LOWER(username) = LOWER(?1)",
                params![username],
                |row| Ok(row_to_user(row)),
            )
            .optional()?
            .transpose()
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY rowid DESC")?;
            let rows = stmt.query_map([], |row| Ok(row_to_user(row)))?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row??);
            }
            Ok(users)
        })
        .await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET username = ?2, password = ?3, role = ?4,
                    role_name = ?5, status = ?6, organization = ?7,
                    department = ?8, attributes = ?9
                 WHERE id = ?1",
                params![
                    user.id.as_str(),
                    user.username,
                    user.password,
                    role_to_db(user.role),
                    user.role_name,
                    status_to_db(user.status),
                    user.organization,
                    user.department,
                    to_json(&user.attributes)?,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("user {}", user.id)));
            }
            Ok(())
        })
        .await
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool> {
        let id = id.clone();
        self.blocking(move |conn| {
            let changed =
                conn.execute("DELETE FROM users WHERE id = ?1", params![id.as_str()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn insert_file(&self, file: &FileItem) -> Result<()> {
        let file = file.clone();
        self.blocking(move |conn| {
            upsert_file(conn, &file, true)?;
            Ok(())
        })
        .await
    }

    async fn get_file(&self, id: &FileId) -> Result<Option<FileItem>> {
        let id = id.clone();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT * FROM files WHERE id = ?1",
                params![id.as_str()],
                |row| Ok(row_to_file(row)),
            )
            .optional()?
            .transpose()
        })
        .await
    }

    async fn list_files(&self) -> Result<Vec<FileItem>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM files ORDER BY rowid DESC")?;
            let rows = stmt.query_map([], |row| Ok(row_to_file(row)))?;
            let mut files = Vec::new();
            for row in rows {
                files.push(row??);
            }
            Ok(files)
        })
        .await
    }

    async fn update_file(&self, file: &FileItem) -> Result<()> {
        let file = file.clone();
        self.blocking(move |conn| {
            let changed = upsert_file(conn, &file, false)?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("file {}", file.id)));
            }
            Ok(())
        })
        .await
    }

    async fn delete_file(&self, id: &FileId) -> Result<bool> {
        let id = id.clone();
        self.blocking(move |conn| {
            let changed =
                conn.execute("DELETE FROM files WHERE id = ?1", params![id.as_str()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn push_notifications(&self, batch: &[Notification]) -> Result<()> {
        let batch = batch.to_vec();
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            // Listing is ORDER BY rowid DESC; inserting the batch in
            // reverse keeps its in-call order at the head of the list.
            for notification in batch.iter().rev() {
                tx.execute(
                    "INSERT INTO notifications (id, user_id, message, timestamp, read)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        notification.id.as_str(),
                        notification.user_id.as_str(),
                        notification.message,
                        notification.timestamp,
                        notification.read,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn notifications_for(&self, user_id: &UserId) -> Result<Vec<Notification>> {
        let user_id = user_id.clone();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM notifications WHERE user_id = ?1 ORDER BY rowid DESC",
            )?;
            let rows = stmt.query_map(params![user_id.as_str()], |row| {
                Ok(row_to_notification(row))
            })?;
            let mut notifications = Vec::new();
            for row in rows {
                notifications.push(row??);
            }
            Ok(notifications)
        })
        .await
    }

    async fn update_notification(&self, notification: &Notification) -> Result<()> {
        let notification = notification.clone();
        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE notifications SET user_id = ?2, message = ?3,
                    timestamp = ?4, read = ?5
                 WHERE id = ?1",
                params![
                    notification.id.as_str(),
                    notification.user_id.as_str(),
                    notification.message,
                    notification.timestamp,
                    notification.read,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!(
                    "notification {}",
                    notification.id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<()> {
        let user_id = user_id.clone();
        self.blocking(move |conn| {
            conn.execute(
                "UPDATE notifications SET read = 1 WHERE user_id = ?1",
                params![user_id.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_notification(&self, id: &NotificationId) -> Result<bool> {
        let id = id.clone();
        self.blocking(move |conn| {
            let changed = conn.execute(
                "DELETE FROM notifications WHERE id = ?1",
                params![id.as_str()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
        let entry = entry.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO activity_log (id, username, kind, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    entry.id.as_str(),
                    entry.username,
                    kind_to_db(entry.kind),
                    entry.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_activity(&self) -> Result<Vec<ActivityEntry>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM activity_log ORDER BY rowid DESC")?;
            let rows = stmt.query_map([], |row| Ok(row_to_activity(row)))?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row??);
            }
            Ok(entries)
        })
        .await
    }
}
