//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite but
//! keeps everything in memory with no persistence.

use std::sync::RwLock;

use async_trait::async_trait;

use smartcrypt_core::{
    ActivityEntry, FileId, FileItem, Notification, NotificationId, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::traits::{InsertUserOutcome, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
/// Lists are kept newest-first, matching the SQLite backend's ordering.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: Vec<User>,
    files: Vec<FileItem>,
    notifications: Vec<Notification>,
    activity: Vec<ActivityEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::InvalidData("store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::InvalidData("store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<InsertUserOutcome> {
        let mut inner = self.write()?;
        if inner.users.iter().any(|u| u.id == user.id) {
            return Ok(InsertUserOutcome::DuplicateId);
        }
        let lowered = user.username.to_lowercase();
        if inner
            .users
            .iter()
            .any(|u| u.username.to_lowercase() == lowered)
        {
            return Ok(InsertUserOutcome::DuplicateUsername);
        }
        inner.users.insert(0, user.clone());
        Ok(InsertUserOutcome::Inserted)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let lowered = username.to_lowercase();
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username.to_lowercase() == lowered)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.clone())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut inner = self.write()?;
        match inner.users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("user {}", user.id))),
        }
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.users.len();
        inner.users.retain(|u| &u.id != id);
        Ok(inner.users.len() < before)
    }

    async fn insert_file(&self, file: &FileItem) -> Result<()> {
        self.write()?.files.insert(0, file.clone());
        Ok(())
    }

    async fn get_file(&self, id: &FileId) -> Result<Option<FileItem>> {
        Ok(self.read()?.files.iter().find(|f| &f.id == id).cloned())
    }

    async fn list_files(&self) -> Result<Vec<FileItem>> {
        Ok(self.read()?.files.clone())
    }

    async fn update_file(&self, file: &FileItem) -> Result<()> {
        let mut inner = self.write()?;
        match inner.files.iter_mut().find(|f| f.id == file.id) {
            Some(slot) => {
                *slot = file.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("file {}", file.id))),
        }
    }

    async fn delete_file(&self, id: &FileId) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.files.len();
        inner.files.retain(|f| &f.id != id);
        Ok(inner.files.len() < before)
    }

    async fn push_notifications(&self, batch: &[Notification]) -> Result<()> {
        let mut inner = self.write()?;
        // Prepend the batch as a block: reversing keeps in-call order at
        // the head of the newest-first list.
        for notification in batch.iter().rev() {
            inner.notifications.insert(0, notification.clone());
        }
        Ok(())
    }

    async fn notifications_for(&self, user_id: &UserId) -> Result<Vec<Notification>> {
        Ok(self
            .read()?
            .notifications
            .iter()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_notification(&self, notification: &Notification) -> Result<()> {
        let mut inner = self.write()?;
        match inner
            .notifications
            .iter_mut()
            .find(|n| n.id == notification.id)
        {
            Some(slot) => {
                *slot = notification.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "notification {}",
                notification.id
            ))),
        }
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<()> {
        let mut inner = self.write()?;
        for notification in inner
            .notifications
            .iter_mut()
            .filter(|n| &n.user_id == user_id)
        {
            notification.read = true;
        }
        Ok(())
    }

    async fn delete_notification(&self, id: &NotificationId) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.notifications.len();
        inner.notifications.retain(|n| &n.id != id);
        Ok(inner.notifications.len() < before)
    }

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
        self.write()?.activity.insert(0, entry.clone());
        Ok(())
    }

    async fn list_activity(&self) -> Result<Vec<ActivityEntry>> {
        Ok(self.read()?.activity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartcrypt_core::Role;

    fn user(id: &str, username: &str) -> User {
        User::builder(id, username).role(Role::Level1).build()
    }

    #[tokio::test]
    async fn test_insert_user_detects_duplicates() {
        let store = MemoryStore::new();
        assert_eq!(
            store.insert_user(&user("u1", "alice")).await.unwrap(),
            InsertUserOutcome::Inserted
        );
        assert_eq!(
            store.insert_user(&user("u1", "bob")).await.unwrap(),
            InsertUserOutcome::DuplicateId
        );
        assert_eq!(
            store.insert_user(&user("u2", "ALICE")).await.unwrap(),
            InsertUserOutcome::DuplicateUsername
        );
    }

    #[tokio::test]
    async fn test_find_by_username_is_case_insensitive() {
        let store = MemoryStore::new();
        store.insert_user(&user("u1", "Alice")).await.unwrap();
        let found = store.find_user_by_username("aLiCe").await.unwrap();
        assert_eq!(found.unwrap().id, UserId::from("u1"));
    }

    #[tokio::test]
    async fn test_users_list_newest_first() {
        let store = MemoryStore::new();
        store.insert_user(&user("u1", "alice")).await.unwrap();
        store.insert_user(&user("u2", "bob")).await.unwrap();
        let listed = store.list_users().await.unwrap();
        assert_eq!(listed[0].id, UserId::from("u2"));
        assert_eq!(listed[1].id, UserId::from("u1"));
    }

    #[tokio::test]
    async fn test_notification_batch_preserves_order() {
        let store = MemoryStore::new();
        let older = Notification::new("n0", "u1", "old", 1);
        store.push_notifications(&[older]).await.unwrap();

        let batch = vec![
            Notification::new("n1", "u1", "fan-out", 2),
            Notification::new("n2", "u1", "fan-out", 2),
        ];
        store.push_notifications(&batch).await.unwrap();

        let listed = store.notifications_for(&UserId::from("u1")).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2", "n0"]);
    }

    #[tokio::test]
    async fn test_update_missing_file_is_not_found() {
        let store = MemoryStore::new();
        let file = FileItem::new(
            "f1",
            "a.txt",
            1,
            "alice",
            "u1",
            bytes::Bytes::new(),
            "text/plain",
        );
        assert!(matches!(
            store.update_file(&file).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_user_keeps_their_notifications() {
        let store = MemoryStore::new();
        store.insert_user(&user("u1", "alice")).await.unwrap();
        store
            .push_notifications(&[Notification::new("n1", "u1", "hi", 1)])
            .await
            .unwrap();

        assert!(store.delete_user(&UserId::from("u1")).await.unwrap());
        let remaining = store.notifications_for(&UserId::from("u1")).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
