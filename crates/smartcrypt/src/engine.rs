//! The Engine: unified API for the SmartCrypt system.
//!
//! The engine brings together storage, access-control decisions, the
//! encryption lifecycle, and the external collaborators into a cohesive
//! interface. Every operation takes the acting user's id, authorizes
//! against the permission matrices, and applies mutations as whole-record
//! swaps — a rejected action changes nothing.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use rand::Rng;

use smartcrypt_analysis::{SupportAssistant, ThreatAnalyzer, ThreatReport};
use smartcrypt_core::{
    mime_type_for, ActivityEntry, ActivityKind, FileId, FileItem, Notification,
    NotificationId, NotifyTarget, Role, User, UserId, UserStatus, ValidationError,
};
use smartcrypt_perms::{
    can_manage, can_perform, evaluate_file, lifecycle, manageable_users, FileAction,
    ManageAction, ShareOutcome,
};
use smartcrypt_store::{InsertUserOutcome, Store};

use crate::error::{EngineError, Result};
use crate::listing;
use crate::sequencer::{FollowUp, Sequencer};

/// Configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Simulated upload latency. The file record is created only after
    /// this delay elapses.
    pub upload_delay: Duration,
    /// Simulated decrypt latency before a key check answers.
    pub decrypt_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upload_delay: Duration::from_millis(1500),
            decrypt_delay: Duration::from_millis(1000),
        }
    }
}

impl EngineConfig {
    /// Zero-latency configuration for tests.
    pub fn immediate() -> Self {
        Self {
            upload_delay: Duration::ZERO,
            decrypt_delay: Duration::ZERO,
        }
    }
}

/// Outcome of a view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    /// Access granted; the content may be rendered.
    Granted { content: Bytes, mime_type: String },
    /// Standard-encrypted file, no key supplied: prompt for one.
    KeyRequired,
    /// Key or policy mismatch. A normal result, not a fault.
    Denied,
}

/// Outcome of a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Access granted; the download was recorded.
    Granted { content: Bytes, mime_type: String },
    /// Policy mismatch. A normal result, not a fault.
    Denied,
}

/// Fields for self-service admin registration.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub organization: String,
}

/// Fields for creating a user through the admin panel.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub role_name: Option<String>,
    pub department: Option<String>,
}

/// Login credentials. The role is part of the credential: the same
/// username cannot log in under a role it does not hold.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
    pub role: Role,
}

/// Headline counts for the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_files: usize,
    pub encrypted_files: usize,
    pub log_events: usize,
}

/// The main engine struct.
///
/// Generic over the storage backend. Single-writer semantics: each
/// mutating operation runs to completion against the store before the
/// next is accepted by the backend's internal lock.
pub struct Engine<S: Store> {
    store: Arc<S>,
    analyzer: Arc<dyn ThreatAnalyzer>,
    assistant: Arc<dyn SupportAssistant>,
    config: EngineConfig,
    sequencer: Mutex<Sequencer>,
    analyses_in_flight: Arc<Mutex<HashSet<FileId>>>,
}

impl<S: Store> Engine<S> {
    /// Create a new engine instance.
    pub fn new(
        store: S,
        analyzer: Arc<dyn ThreatAnalyzer>,
        assistant: Arc<dyn SupportAssistant>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            analyzer,
            assistant,
            config,
            sequencer: Mutex::new(Sequencer::new()),
            analyses_in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts & Sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new administrator account.
    pub async fn register_admin(&self, new_admin: NewAdmin) -> Result<User> {
        for (value, field) in [
            (&new_admin.first_name, "first name"),
            (&new_admin.last_name, "last name"),
            (&new_admin.email, "email"),
            (&new_admin.organization, "organization"),
            (&new_admin.username, "username"),
            (&new_admin.password, "password"),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field).into());
            }
        }

        let user = User {
            id: UserId::new(new_id("admin")),
            username: new_admin.username.clone(),
            password: Some(new_admin.password),
            role: Role::Admin,
            role_name: "Administrator".into(),
            status: UserStatus::Active,
            organization: Some(new_admin.organization),
            department: None,
            attributes: ["role:admin", "access:all"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        self.insert_checked(user).await
    }

    /// Attempt a login. `None` means invalid credentials — a rejection the
    /// caller renders, not an error.
    pub async fn login(&self, credentials: &Credentials) -> Result<Option<User>> {
        let found = self
            .store
            .find_user_by_username(&credentials.username)
            .await?
            .filter(|u| u.role == credentials.role);

        let Some(user) = found else {
            return Ok(None);
        };

        let accepted = match (&user.password, &credentials.password) {
            (Some(stored), Some(supplied)) => stored == supplied,
            // Legacy passwordless accounts may log in without a password,
            // but never as an administrator.
            (None, _) => credentials.role != Role::Admin,
            (Some(_), None) => false,
        };

        if !accepted {
            return Ok(None);
        }

        self.record_activity(&user.username, ActivityKind::Login)
            .await?;
        Ok(Some(user))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a user through the admin panel.
    pub async fn add_user(&self, actor: &UserId, new_user: NewUser) -> Result<User> {
        let admin = self.require_user(actor).await?;
        if !admin.is_admin() {
            return Err(EngineError::NotAuthorized(
                "only administrators can add users".into(),
            ));
        }
        if new_user.role == Role::Admin {
            return Err(EngineError::NotAuthorized(
                "administrator accounts are created through registration".into(),
            ));
        }
        for (value, field) in [
            (&new_user.username, "username"),
            (&new_user.user_id, "user id"),
            (&new_user.password, "password"),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field).into());
            }
        }

        let mut builder = User::builder(new_user.user_id.trim(), new_user.username)
            .role(new_user.role)
            .password(new_user.password);
        if let Some(role_name) = new_user.role_name {
            builder = builder.role_name(role_name);
        }
        if let Some(department) = new_user.department {
            builder = builder.department(department);
        }
        if let Some(organization) = admin.organization.clone() {
            builder = builder.organization(organization);
        }

        let user = self.insert_checked(builder.build()).await?;
        self.notify(
            NotifyTarget::User(admin.id.clone()),
            &format!("You created a new user: {}.", user.username),
        )
        .await?;
        Ok(user)
    }

    /// Insert a user, mapping duplicate outcomes to validation errors.
    async fn insert_checked(&self, user: User) -> Result<User> {
        match self.store.insert_user(&user).await? {
            InsertUserOutcome::Inserted => Ok(user),
            InsertUserOutcome::DuplicateId => {
                Err(ValidationError::DuplicateUserId(user.id.0).into())
            }
            InsertUserOutcome::DuplicateUsername => {
                Err(ValidationError::DuplicateUsername(user.username).into())
            }
        }
    }

    /// The full directory, newest first.
    pub async fn users(&self) -> Result<Vec<User>> {
        Ok(self.store.list_users().await?)
    }

    /// The management listing: never contains administrator accounts.
    pub async fn managed_users(&self) -> Result<Vec<User>> {
        let users = self.store.list_users().await?;
        Ok(manageable_users(&users).into_iter().cloned().collect())
    }

    /// Change a user's status (block, suspend, or reactivate).
    pub async fn set_user_status(
        &self,
        actor: &UserId,
        target: &UserId,
        status: UserStatus,
    ) -> Result<User> {
        let acting = self.require_user(actor).await?;
        let subject = self.require_user(target).await?;
        if subject.is_admin() {
            return Err(EngineError::NotAuthorized(
                "administrator accounts cannot be managed".into(),
            ));
        }

        // Reactivation requires the permission of the action it undoes.
        let action = match status {
            UserStatus::Blocked => ManageAction::Block,
            UserStatus::Suspended => ManageAction::Suspend,
            UserStatus::Active => match subject.status {
                UserStatus::Blocked => ManageAction::Block,
                _ => ManageAction::Suspend,
            },
        };
        if !can_manage(action, acting.role) {
            return Err(EngineError::NotAuthorized(format!(
                "role {} may not {:?} users",
                acting.role, action
            )));
        }

        let mut updated = subject;
        updated.status = status;
        self.store.update_user(&updated).await?;
        Ok(updated)
    }

    /// Remove a user account. Their files, notifications, and activity
    /// entries remain (weak references).
    pub async fn delete_user(&self, actor: &UserId, target: &UserId) -> Result<()> {
        let acting = self.require_user(actor).await?;
        let subject = self.require_user(target).await?;
        if subject.is_admin() {
            return Err(EngineError::NotAuthorized(
                "administrator accounts cannot be managed".into(),
            ));
        }
        if !can_manage(ManageAction::Delete, acting.role) {
            return Err(EngineError::NotAuthorized(format!(
                "role {} may not delete users",
                acting.role
            )));
        }
        self.store.delete_user(target).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // File Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Upload a file.
    ///
    /// The upload delay elapses before anything is persisted: dropping
    /// this future first applies no mutation.
    pub async fn upload_file(
        &self,
        actor: &UserId,
        filename: &str,
        content: Bytes,
        mime_type: Option<&str>,
    ) -> Result<FileItem> {
        let user = self.require_user(actor).await?;
        if user.role.is_restricted() {
            return Err(EngineError::NotAuthorized(
                "Level 4 accounts cannot upload files".into(),
            ));
        }

        tokio::time::sleep(self.config.upload_delay).await;

        let mime = mime_type
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| mime_type_for(filename).to_owned());
        let file = FileItem::new(
            new_id("file"),
            filename,
            now_millis(),
            &user.username,
            user.id.clone(),
            content,
            mime,
        );

        self.store.insert_file(&file).await?;
        self.record_activity(&user.username, ActivityKind::Upload)
            .await?;
        Ok(file)
    }

    /// List all files, newest first.
    pub async fn files(&self) -> Result<Vec<FileItem>> {
        Ok(self.store.list_files().await?)
    }

    /// Share a file with a named recipient list under a fresh key.
    ///
    /// On success, recipients are notified and a `RevealKey` follow-up is
    /// queued so the key is shown only after the share dialog settles.
    pub async fn share_standard(
        &self,
        actor: &UserId,
        file_id: &FileId,
        recipients: &BTreeSet<UserId>,
    ) -> Result<ShareOutcome> {
        let user = self.require_user(actor).await?;
        let file = self.require_file(file_id).await?;
        self.authorize(FileAction::Share, &user, &file)?;

        let outcome = lifecycle::share_standard(&file, recipients, &mut rand::thread_rng())?;
        self.store.update_file(&outcome.file).await?;
        self.record_activity(&user.username, ActivityKind::Share)
            .await?;

        for recipient in recipients {
            self.notify(
                NotifyTarget::User(recipient.clone()),
                &format!("{} shared \"{}\" with you.", user.username, file.filename),
            )
            .await?;
        }

        self.enqueue_follow_up(FollowUp::RevealKey {
            file_id: outcome.file.id.clone(),
            key: outcome.key.clone(),
        });
        Ok(outcome)
    }

    /// Protect a file with an attribute policy.
    pub async fn share_policy(
        &self,
        actor: &UserId,
        file_id: &FileId,
        policy: &str,
        mode: smartcrypt_core::PolicyMode,
    ) -> Result<FileItem> {
        let user = self.require_user(actor).await?;
        let file = self.require_file(file_id).await?;
        self.authorize(FileAction::Share, &user, &file)?;

        let updated = lifecycle::share_policy(&file, policy, mode)?;
        self.store.update_file(&updated).await?;
        self.record_activity(&user.username, ActivityKind::Share)
            .await?;
        Ok(updated)
    }

    /// Request to view a file's content.
    ///
    /// Plaintext always grants. Policy-encrypted files are decided by the
    /// attribute evaluator. Standard-encrypted files demand a key; the
    /// decrypt delay elapses before the verdict, and dropping the future
    /// first has no effect (there is no mutation on this path at all).
    pub async fn view_file(
        &self,
        actor: &UserId,
        file_id: &FileId,
        supplied_key: Option<&str>,
    ) -> Result<ViewOutcome> {
        let user = self.require_user(actor).await?;
        let file = self.require_file(file_id).await?;

        let granted = ViewOutcome::Granted {
            content: file.content.clone(),
            mime_type: file.mime_type.clone(),
        };

        match &file.encryption {
            smartcrypt_core::Encryption::Plaintext => Ok(granted),
            smartcrypt_core::Encryption::Policy { .. } => {
                if evaluate_file(&user, &file).is_granted() {
                    Ok(granted)
                } else {
                    Ok(ViewOutcome::Denied)
                }
            }
            smartcrypt_core::Encryption::Standard { .. } => match supplied_key {
                None => Ok(ViewOutcome::KeyRequired),
                Some(key) => {
                    tokio::time::sleep(self.config.decrypt_delay).await;
                    if lifecycle::verify_key(&file, key).is_granted() {
                        Ok(granted)
                    } else {
                        Ok(ViewOutcome::Denied)
                    }
                }
            },
        }
    }

    /// Download a file's content.
    ///
    /// Only policy-encrypted files are gated here; standard-encrypted and
    /// plaintext files download without a key prompt. Success records the
    /// downloader and notifies the uploader when someone else downloaded.
    pub async fn download_file(
        &self,
        actor: &UserId,
        file_id: &FileId,
    ) -> Result<DownloadOutcome> {
        let user = self.require_user(actor).await?;
        let file = self.require_file(file_id).await?;

        if matches!(file.encryption, smartcrypt_core::Encryption::Policy { .. })
            && !evaluate_file(&user, &file).is_granted()
        {
            return Ok(DownloadOutcome::Denied);
        }

        let updated = file.with_download_by(user.id.clone());
        self.store.update_file(&updated).await?;

        if user.id != file.uploader_id {
            self.notify(
                NotifyTarget::User(file.uploader_id.clone()),
                &format!(
                    "{} downloaded your file: \"{}\".",
                    user.username, file.filename
                ),
            )
            .await?;
        }

        Ok(DownloadOutcome::Granted {
            content: file.content.clone(),
            mime_type: file.mime_type.clone(),
        })
    }

    /// Delete a file.
    pub async fn delete_file(&self, actor: &UserId, file_id: &FileId) -> Result<()> {
        let user = self.require_user(actor).await?;
        let file = self.require_file(file_id).await?;
        self.authorize(FileAction::Delete, &user, &file)?;
        self.store.delete_file(file_id).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Threat Analysis
    // ─────────────────────────────────────────────────────────────────────────

    /// Run threat analysis on a file.
    ///
    /// At most one analysis per file may be in flight; re-entrant requests
    /// are rejected while pending. A collaborator failure substitutes the
    /// fail-safe Critical report, and the actor is notified of completion
    /// either way.
    pub async fn analyze_file(
        &self,
        actor: &UserId,
        file_id: &FileId,
    ) -> Result<ThreatReport> {
        let user = self.require_user(actor).await?;
        let file = self.require_file(file_id).await?;
        self.authorize(FileAction::Analyze, &user, &file)?;

        let _guard = AnalysisGuard::acquire(&self.analyses_in_flight, file.id.clone())
            .ok_or_else(|| EngineError::AnalysisPending(file.id.0.clone()))?;

        let report = match self.analyzer.analyze(&file.filename).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("threat analysis failed for {}: {e}", file.id);
                ThreatReport::failsafe()
            }
        };

        self.notify(
            NotifyTarget::User(user.id.clone()),
            &format!("Analysis for \"{}\" is complete.", file.filename),
        )
        .await?;
        Ok(report)
    }

    /// The user chose to secure a file from an analysis result: queue the
    /// share dialog to open once the analysis dialog settles.
    pub async fn request_share_after_analysis(&self, file_id: &FileId) -> Result<()> {
        let file = self.require_file(file_id).await?;
        self.enqueue_follow_up(FollowUp::OpenShare { file_id: file.id });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Workflow Sequencer
    // ─────────────────────────────────────────────────────────────────────────

    /// Queue a follow-up action (last-write-wins).
    pub fn enqueue_follow_up(&self, follow_up: FollowUp) {
        self.sequencer.lock().unwrap().enqueue(follow_up);
    }

    /// The current dialog finished closing: fire the pending follow-up.
    pub fn dialog_settled(&self) -> Option<FollowUp> {
        self.sequencer.lock().unwrap().dialog_settled()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notifications & Activity
    // ─────────────────────────────────────────────────────────────────────────

    /// Dispatch a notification.
    ///
    /// `Admins` snapshots the directory at call time and materializes one
    /// record per administrator, in directory order, with ids tied to the
    /// shared timestamp. An unknown single recipient is a silent no-op.
    pub async fn notify(
        &self,
        target: NotifyTarget,
        message: &str,
    ) -> Result<Vec<Notification>> {
        let timestamp = now_millis();
        let batch = match target {
            NotifyTarget::Admins => {
                let admins: Vec<User> = self
                    .store
                    .list_users()
                    .await?
                    .into_iter()
                    .filter(|u| u.is_admin())
                    .collect();
                admins
                    .into_iter()
                    .map(|admin| {
                        Notification::new(
                            format!("notif-{timestamp}-{}", admin.id),
                            admin.id,
                            message,
                            timestamp,
                        )
                    })
                    .collect()
            }
            NotifyTarget::User(user_id) => {
                if self.store.get_user(&user_id).await?.is_none() {
                    tracing::debug!("dropping notification for unknown user {user_id}");
                    return Ok(Vec::new());
                }
                vec![Notification::new(
                    new_id("notif"),
                    user_id,
                    message,
                    timestamp,
                )]
            }
        };

        self.store.push_notifications(&batch).await?;
        Ok(batch)
    }

    /// A user's notifications, newest first.
    pub async fn notifications_for(&self, user_id: &UserId) -> Result<Vec<Notification>> {
        Ok(self.store.notifications_for(user_id).await?)
    }

    /// Count of a user's unread notifications.
    pub async fn unread_count(&self, user_id: &UserId) -> Result<usize> {
        Ok(self
            .store
            .notifications_for(user_id)
            .await?
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    /// Mark one of a user's notifications as read.
    pub async fn mark_notification_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<()> {
        let notifications = self.store.notifications_for(user_id).await?;
        if let Some(notification) = notifications.iter().find(|n| &n.id == notification_id) {
            self.store
                .update_notification(&notification.marked_read())
                .await?;
        }
        Ok(())
    }

    /// Mark all of a user's notifications as read.
    pub async fn mark_all_read(&self, user_id: &UserId) -> Result<()> {
        Ok(self.store.mark_all_read(user_id).await?)
    }

    /// Hard-remove a notification.
    pub async fn delete_notification(&self, notification_id: &NotificationId) -> Result<()> {
        self.store.delete_notification(notification_id).await?;
        Ok(())
    }

    /// The activity log, newest first.
    pub async fn activity_log(&self) -> Result<Vec<ActivityEntry>> {
        Ok(self.store.list_activity().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Help Desk
    // ─────────────────────────────────────────────────────────────────────────

    /// Submit a help-desk request: the assistant drafts an initial reply
    /// and every administrator is notified.
    pub async fn submit_help_request(
        &self,
        actor: &UserId,
        message: &str,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let user = self.require_user(actor).await?;

        let reply = self.assistant.respond(message).await?;
        self.notify(
            NotifyTarget::Admins,
            &format!("{} sent a help desk request.", user.username),
        )
        .await?;
        Ok(reply)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Listings
    // ─────────────────────────────────────────────────────────────────────────

    /// Files the user uploaded.
    pub async fn my_files(&self, user: &User) -> Result<Vec<FileItem>> {
        let files = self.store.list_files().await?;
        Ok(cloned(listing::my_files(&files, user)))
    }

    /// Files the user uploaded and shared.
    pub async fn shared_by_me(&self, user: &User) -> Result<Vec<FileItem>> {
        let files = self.store.list_files().await?;
        Ok(cloned(listing::shared_by_me(&files, user)))
    }

    /// Files shared with the user, directly or by policy.
    pub async fn received_files(&self, user: &User) -> Result<Vec<FileItem>> {
        let files = self.store.list_files().await?;
        Ok(cloned(listing::received_files(&files, user)))
    }

    /// Files the user has downloaded.
    pub async fn downloaded_files(&self, user: &User) -> Result<Vec<FileItem>> {
        let files = self.store.list_files().await?;
        Ok(cloned(listing::downloaded_files(&files, user)))
    }

    /// Headline counts for the dashboards.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let files = self.store.list_files().await?;
        Ok(DashboardStats {
            total_users: self.store.list_users().await?.len(),
            total_files: files.len(),
            encrypted_files: files.iter().filter(|f| f.is_encrypted()).count(),
            log_events: self.store.list_activity().await?.len(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn authorize(&self, action: FileAction, user: &User, file: &FileItem) -> Result<()> {
        if can_perform(action, user, file) {
            Ok(())
        } else {
            Err(EngineError::NotAuthorized(format!(
                "{} may not {:?} file {}",
                user.username, action, file.id
            )))
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| EngineError::UserNotFound(id.0.clone()))
    }

    async fn require_file(&self, id: &FileId) -> Result<FileItem> {
        self.store
            .get_file(id)
            .await?
            .ok_or_else(|| EngineError::FileNotFound(id.0.clone()))
    }

    async fn record_activity(&self, username: &str, kind: ActivityKind) -> Result<()> {
        let entry = ActivityEntry::new(new_id("log"), username, kind, now_millis());
        self.store.append_activity(&entry).await?;
        Ok(())
    }
}

fn cloned(files: Vec<&FileItem>) -> Vec<FileItem> {
    files.into_iter().cloned().collect()
}

/// RAII guard marking a file's analysis as in flight. Released on drop, so
/// a cancelled analysis future cannot wedge the file.
struct AnalysisGuard {
    in_flight: Arc<Mutex<HashSet<FileId>>>,
    file_id: FileId,
}

impl AnalysisGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<FileId>>>, file_id: FileId) -> Option<Self> {
        let mut set = in_flight.lock().unwrap();
        if !set.insert(file_id.clone()) {
            return None;
        }
        Some(Self {
            in_flight: Arc::clone(in_flight),
            file_id,
        })
    }
}

impl Drop for AnalysisGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.file_id);
        }
    }
}

/// Generate an id: prefix, creation timestamp, short random suffix.
fn new_id(prefix: &str) -> String {
    let mut suffix = [0u8; 2];
    rand::thread_rng().fill(&mut suffix);
    format!("{prefix}-{}-{}", now_millis(), hex::encode(suffix))
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
