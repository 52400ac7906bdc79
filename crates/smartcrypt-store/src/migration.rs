//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system: each migration transforms the
//! schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: the four top-level collections.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Users: the directory. Usernames are unique case-insensitively.
        CREATE TABLE users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            password TEXT,
            role TEXT NOT NULL,
            role_name TEXT NOT NULL,
            status TEXT NOT NULL,
            organization TEXT,
            department TEXT,
            attributes TEXT NOT NULL          -- JSON array of key:value strings
        );
        CREATE UNIQUE INDEX idx_users_username ON users (LOWER(username));

        -- Files: content plus encryption sub-state. A row can never hold
        -- both a decryption key and an access policy.
        CREATE TABLE files (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            uploaded_at INTEGER NOT NULL,     -- Unix milliseconds
            uploader TEXT NOT NULL,
            uploader_id TEXT NOT NULL,
            content BLOB NOT NULL,
            mime_type TEXT NOT NULL,
            encryption_type TEXT NOT NULL,    -- 'none' | 'standard' | 'abe'
            decryption_key TEXT,
            shared_with TEXT NOT NULL,        -- JSON array of user ids
            access_policy TEXT,
            policy_mode TEXT,                 -- 'and' | 'or'
            downloaded_by TEXT NOT NULL,      -- JSON array of user ids
            CHECK (NOT (decryption_key IS NOT NULL AND access_policy IS NOT NULL))
        );
        CREATE INDEX idx_files_uploader ON files (uploader_id);

        -- Notifications: single-recipient records, hard-deleted.
        CREATE TABLE notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            message TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            read INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX idx_notifications_user ON notifications (user_id);

        -- Activity log: append-only.
        CREATE TABLE activity_log (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            kind TEXT NOT NULL,               -- 'upload' | 'share' | 'login'
            timestamp INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
