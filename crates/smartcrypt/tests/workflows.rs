//! End-to-end workflow tests for the engine.
//!
//! These exercise the full path: permission matrix → lifecycle transition
//! → store swap → notification dispatch → sequencer follow-up.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use smartcrypt::{
    Credentials, DownloadOutcome, Engine, EngineConfig, EngineError, FollowUp, NewUser,
    ViewOutcome,
};
use smartcrypt_analysis::{CannedAnalyzer, CannedAssistant, ThreatLevel};
use smartcrypt_core::{
    mime_type_for, FileItem, NotifyTarget, PolicyMode, Role, User, UserId, UserStatus,
    ValidationError,
};
use smartcrypt_store::{MemoryStore, Store};

struct Harness {
    engine: Engine<MemoryStore>,
    analyzer: Arc<CannedAnalyzer>,
    assistant: Arc<CannedAssistant>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(EngineConfig::immediate())
    }

    fn with_config(config: EngineConfig) -> Self {
        let analyzer = Arc::new(CannedAnalyzer::new());
        let assistant = Arc::new(CannedAssistant::new("An administrator has been notified."));
        let engine = Engine::new(
            MemoryStore::new(),
            Arc::clone(&analyzer) as Arc<dyn smartcrypt_analysis::ThreatAnalyzer>,
            Arc::clone(&assistant) as Arc<dyn smartcrypt_analysis::SupportAssistant>,
            config,
        );
        Self {
            engine,
            analyzer,
            assistant,
        }
    }

    async fn seed_user(&self, id: &str, username: &str, role: Role) -> User {
        let user = User::builder(id, username)
            .role(role)
            .password("pw")
            .build();
        self.engine.store().insert_user(&user).await.unwrap();
        user
    }

    async fn seed_user_with_attributes(
        &self,
        id: &str,
        username: &str,
        role: Role,
        attributes: &[&str],
    ) -> User {
        let mut user = User::builder(id, username)
            .role(role)
            .password("pw")
            .build();
        user.attributes = attributes.iter().map(|s| s.to_string()).collect();
        self.engine.store().insert_user(&user).await.unwrap();
        user
    }

    async fn seed_admin(&self, id: &str, username: &str) -> User {
        let mut user = User::builder(id, username)
            .role(Role::Admin)
            .role_name("Administrator")
            .password("pw")
            .build();
        user.attributes = ["role:admin", "access:all"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.engine.store().insert_user(&user).await.unwrap();
        user
    }

    async fn seed_file(&self, id: &str, filename: &str, owner: &User) -> FileItem {
        let file = FileItem::new(
            id,
            filename,
            1_000,
            &owner.username,
            owner.id.clone(),
            Bytes::from_static(b"file contents"),
            mime_type_for(filename),
        );
        self.engine.store().insert_file(&file).await.unwrap();
        file
    }
}

fn recipients(ids: &[&str]) -> BTreeSet<UserId> {
    ids.iter().map(|s| UserId::from(*s)).collect()
}

// ─────────────────────────────────────────────────────────────────────────
// Standard Shares
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_standard_shares_union_recipients_with_one_active_key() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    h.seed_user("u2", "bob", Role::Level3).await;
    h.seed_user("u3", "carol", Role::Level3).await;
    h.seed_user("u4", "dave", Role::Level3).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;

    let first = h
        .engine
        .share_standard(&owner.id, &file.id, &recipients(&["u2", "u3"]))
        .await
        .unwrap();
    let second = h
        .engine
        .share_standard(&owner.id, &file.id, &recipients(&["u3", "u4"]))
        .await
        .unwrap();

    assert_eq!(
        second.file.encryption.shared_with().unwrap(),
        &recipients(&["u2", "u3", "u4"])
    );

    // Only the most recent key unlocks the file.
    let view = h
        .engine
        .view_file(&UserId::from("u2"), &file.id, Some(second.key.as_str()))
        .await
        .unwrap();
    assert!(matches!(view, ViewOutcome::Granted { .. }));

    if first.key != second.key {
        let stale = h
            .engine
            .view_file(&UserId::from("u2"), &file.id, Some(first.key.as_str()))
            .await
            .unwrap();
        assert_eq!(stale, ViewOutcome::Denied);
    }
}

#[tokio::test]
async fn standard_share_notifies_recipients_and_queues_key_reveal() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    h.seed_user("u2", "bob", Role::Level3).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;

    let outcome = h
        .engine
        .share_standard(&owner.id, &file.id, &recipients(&["u2"]))
        .await
        .unwrap();

    let inbox = h
        .engine
        .notifications_for(&UserId::from("u2"))
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].message.contains("alice"));
    assert!(inbox[0].message.contains("plan.pdf"));

    // The key reveal fires exactly once, after the share dialog settles.
    assert_eq!(
        h.engine.dialog_settled(),
        Some(FollowUp::RevealKey {
            file_id: file.id.clone(),
            key: outcome.key,
        })
    );
    assert_eq!(h.engine.dialog_settled(), None);
}

#[tokio::test]
async fn share_with_empty_recipient_list_is_rejected_without_mutation() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;

    let err = h
        .engine
        .share_standard(&owner.id, &file.id, &BTreeSet::new())
        .await;
    assert!(matches!(
        err,
        Err(EngineError::Validation(ValidationError::NoRecipients))
    ));

    let stored = h.engine.store().get_file(&file.id).await.unwrap().unwrap();
    assert!(!stored.is_encrypted());
    assert!(h.engine.activity_log().await.unwrap().is_empty());
}

#[tokio::test]
async fn decrypt_is_case_sensitive() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    h.seed_user("u2", "bob", Role::Level3).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;

    let outcome = h
        .engine
        .share_standard(&owner.id, &file.id, &recipients(&["u2"]))
        .await
        .unwrap();

    let wrong_case = outcome.key.as_str().to_lowercase();
    let denied = h
        .engine
        .view_file(&UserId::from("u2"), &file.id, Some(&wrong_case))
        .await
        .unwrap();
    assert_eq!(denied, ViewOutcome::Denied);

    // No lockout: the correct key still works on the next attempt.
    let granted = h
        .engine
        .view_file(&UserId::from("u2"), &file.id, Some(outcome.key.as_str()))
        .await
        .unwrap();
    assert!(matches!(granted, ViewOutcome::Granted { .. }));
}

#[tokio::test]
async fn viewing_standard_encrypted_without_key_prompts() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    h.seed_user("u2", "bob", Role::Level3).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;
    h.engine
        .share_standard(&owner.id, &file.id, &recipients(&["u2"]))
        .await
        .unwrap();

    let outcome = h
        .engine
        .view_file(&UserId::from("u2"), &file.id, None)
        .await
        .unwrap();
    assert_eq!(outcome, ViewOutcome::KeyRequired);
}

// ─────────────────────────────────────────────────────────────────────────
// Policy Shares
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn policy_share_round_trip_and_overwrite_by_standard_share() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let holder = h
        .seed_user_with_attributes(
            "u2",
            "bob",
            Role::Level3,
            &["userID:s1", "department:ds"],
        )
        .await;
    h.seed_user("u3", "carol", Role::Level3).await;
    let file = h.seed_file("f1", "records.pdf", &owner).await;

    h.engine
        .share_policy(&owner.id, &file.id, "s1,ds", PolicyMode::And)
        .await
        .unwrap();

    let granted = h.engine.view_file(&holder.id, &file.id, None).await.unwrap();
    assert!(matches!(granted, ViewOutcome::Granted { .. }));
    assert_eq!(h.engine.received_files(&holder).await.unwrap().len(), 1);

    // A standard share replaces the policy outright.
    h.engine
        .share_standard(&owner.id, &file.id, &recipients(&["u3"]))
        .await
        .unwrap();

    let after = h.engine.view_file(&holder.id, &file.id, None).await.unwrap();
    assert_eq!(after, ViewOutcome::KeyRequired);
    assert!(h.engine.received_files(&holder).await.unwrap().is_empty());
}

#[tokio::test]
async fn and_mode_requires_all_values_or_mode_any() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let full = h
        .seed_user_with_attributes(
            "u2",
            "bob",
            Role::Level3,
            &["level:level1", "department:security"],
        )
        .await;
    let partial = h
        .seed_user_with_attributes("u3", "carol", Role::Level3, &["department:security"])
        .await;
    let file = h.seed_file("f1", "audit.docx", &owner).await;

    h.engine
        .share_policy(&owner.id, &file.id, "level1,security", PolicyMode::And)
        .await
        .unwrap();
    assert!(matches!(
        h.engine.view_file(&full.id, &file.id, None).await.unwrap(),
        ViewOutcome::Granted { .. }
    ));
    assert_eq!(
        h.engine.view_file(&partial.id, &file.id, None).await.unwrap(),
        ViewOutcome::Denied
    );

    h.engine
        .share_policy(&owner.id, &file.id, "level1,security", PolicyMode::Or)
        .await
        .unwrap();
    assert!(matches!(
        h.engine.view_file(&partial.id, &file.id, None).await.unwrap(),
        ViewOutcome::Granted { .. }
    ));
}

#[tokio::test]
async fn empty_policy_share_is_rejected() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;

    let err = h
        .engine
        .share_policy(&owner.id, &file.id, "   ", PolicyMode::Or)
        .await;
    assert!(matches!(
        err,
        Err(EngineError::Validation(ValidationError::EmptyPolicy))
    ));
}

// ─────────────────────────────────────────────────────────────────────────
// Downloads
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn standard_encrypted_files_download_without_a_key() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let other = h.seed_user("u2", "bob", Role::Level3).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;
    h.engine
        .share_standard(&owner.id, &file.id, &recipients(&["u2"]))
        .await
        .unwrap();

    // Download is transport, not disclosure: no key prompt here.
    let outcome = h.engine.download_file(&other.id, &file.id).await.unwrap();
    assert!(matches!(outcome, DownloadOutcome::Granted { .. }));

    let stored = h.engine.store().get_file(&file.id).await.unwrap().unwrap();
    assert!(stored.downloaded_by.contains(&other.id));

    // The uploader is told who downloaded.
    let inbox = h.engine.notifications_for(&owner.id).await.unwrap();
    assert!(inbox.iter().any(|n| n.message.contains("downloaded")));
}

#[tokio::test]
async fn policy_encrypted_downloads_are_gated_by_the_evaluator() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let outsider = h.seed_user("u2", "bob", Role::Level3).await;
    let insider = h
        .seed_user_with_attributes("u3", "carol", Role::Level3, &["department:security"])
        .await;
    let file = h.seed_file("f1", "audit.pdf", &owner).await;
    h.engine
        .share_policy(&owner.id, &file.id, "security", PolicyMode::Or)
        .await
        .unwrap();

    assert_eq!(
        h.engine.download_file(&outsider.id, &file.id).await.unwrap(),
        DownloadOutcome::Denied
    );
    assert!(matches!(
        h.engine.download_file(&insider.id, &file.id).await.unwrap(),
        DownloadOutcome::Granted { .. }
    ));

    let stored = h.engine.store().get_file(&file.id).await.unwrap().unwrap();
    assert!(stored.downloaded_by.contains(&insider.id));
    assert!(!stored.downloaded_by.contains(&outsider.id));
}

#[tokio::test]
async fn own_downloads_do_not_notify() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;

    h.engine.download_file(&owner.id, &file.id).await.unwrap();
    assert!(h.engine.notifications_for(&owner.id).await.unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────
// Permission Enforcement
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn level4_cannot_upload_share_or_delete() {
    let h = Harness::new();
    let restricted = h.seed_user("u4", "dan", Role::Level4).await;
    let owner = h.seed_user("u1", "alice", Role::Level1).await;
    let file = h.seed_file("f1", "plan.pdf", &owner).await;

    assert!(matches!(
        h.engine
            .upload_file(&restricted.id, "mine.txt", Bytes::new(), None)
            .await,
        Err(EngineError::NotAuthorized(_))
    ));
    assert!(matches!(
        h.engine
            .share_standard(&restricted.id, &file.id, &recipients(&["u1"]))
            .await,
        Err(EngineError::NotAuthorized(_))
    ));
    assert!(matches!(
        h.engine.delete_file(&restricted.id, &file.id).await,
        Err(EngineError::NotAuthorized(_))
    ));
}

#[tokio::test]
async fn delete_requires_ownership_admin_or_level1() {
    let h = Harness::new();
    let owner = h.seed_user("u1", "alice", Role::Level2).await;
    let peer = h.seed_user("u2", "bob", Role::Level2).await;
    let admin = h.seed_admin("a1", "root").await;

    let file = h.seed_file("f1", "plan.pdf", &owner).await;
    assert!(matches!(
        h.engine.delete_file(&peer.id, &file.id).await,
        Err(EngineError::NotAuthorized(_))
    ));
    h.engine.delete_file(&admin.id, &file.id).await.unwrap();
    assert!(h.engine.store().get_file(&file.id).await.unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_fanout_snapshots_the_directory() {
    let h = Harness::new();
    let a1 = h.seed_admin("a1", "root1").await;
    let a2 = h.seed_admin("a2", "root2").await;
    let a3 = h.seed_admin("a3", "root3").await;
    h.seed_user("u1", "alice", Role::Level1).await;

    let batch = h
        .engine
        .notify(NotifyTarget::Admins, "storage at capacity")
        .await
        .unwrap();
    assert_eq!(batch.len(), 3);

    // One record per admin, shared message, distinct ids.
    let mut ids: Vec<&str> = batch.iter().map(|n| n.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert!(batch.iter().all(|n| n.message == "storage at capacity"));

    for admin in [&a1, &a2, &a3] {
        assert_eq!(h.engine.notifications_for(&admin.id).await.unwrap().len(), 1);
    }

    // An admin added after dispatch gets nothing.
    let late = h.seed_admin("a4", "root4").await;
    assert!(h.engine.notifications_for(&late.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn notifying_an_unknown_user_is_a_noop() {
    let h = Harness::new();
    let batch = h
        .engine
        .notify(NotifyTarget::User(UserId::from("ghost")), "hello?")
        .await
        .unwrap();
    assert!(batch.is_empty());
}

#[tokio::test]
async fn read_state_and_hard_deletion() {
    let h = Harness::new();
    let user = h.seed_user("u1", "alice", Role::Level1).await;
    h.engine
        .notify(NotifyTarget::User(user.id.clone()), "one")
        .await
        .unwrap();
    h.engine
        .notify(NotifyTarget::User(user.id.clone()), "two")
        .await
        .unwrap();

    assert_eq!(h.engine.unread_count(&user.id).await.unwrap(), 2);

    let inbox = h.engine.notifications_for(&user.id).await.unwrap();
    h.engine
        .mark_notification_read(&user.id, &inbox[0].id)
        .await
        .unwrap();
    assert_eq!(h.engine.unread_count(&user.id).await.unwrap(), 1);

    h.engine.delete_notification(&inbox[1].id).await.unwrap();
    assert_eq!(h.engine.notifications_for(&user.id).await.unwrap().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────
// Workflow Sequencer
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sequencer_last_write_wins() {
    let h = Harness::new();
    h.engine.enqueue_follow_up(FollowUp::OpenShare {
        file_id: "f1".into(),
    });
    h.engine.enqueue_follow_up(FollowUp::OpenShare {
        file_id: "f2".into(),
    });

    assert_eq!(
        h.engine.dialog_settled(),
        Some(FollowUp::OpenShare {
            file_id: "f2".into()
        })
    );
    assert_eq!(h.engine.dialog_settled(), None);
}

#[tokio::test]
async fn securing_after_analysis_queues_the_share_dialog() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    let file = h.seed_file("f1", "patients.csv", &admin).await;

    h.analyzer.script_report(
        "patients.csv",
        smartcrypt_analysis::ThreatReport {
            threat_level: ThreatLevel::High,
            summary: "Likely patient records.".into(),
            potential_threats: vec!["PHI exposure".into()],
            recommendations: vec!["Encrypt before sharing.".into()],
        },
    );

    let report = h.engine.analyze_file(&admin.id, &file.id).await.unwrap();
    assert!(report.threat_level.is_elevated());

    h.engine.request_share_after_analysis(&file.id).await.unwrap();
    assert_eq!(
        h.engine.dialog_settled(),
        Some(FollowUp::OpenShare {
            file_id: file.id.clone()
        })
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Threat Analysis
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_analysis_substitutes_the_failsafe_critical_report() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    let file = h.seed_file("f1", "broken.bin", &admin).await;
    h.analyzer.script_failure("broken.bin", "upstream timeout");

    let report = h.engine.analyze_file(&admin.id, &file.id).await.unwrap();
    assert_eq!(report.threat_level, ThreatLevel::Critical);

    // The actor is still told the analysis completed.
    let inbox = h.engine.notifications_for(&admin.id).await.unwrap();
    assert!(inbox.iter().any(|n| n.message.contains("complete")));
}

#[tokio::test]
async fn analysis_is_refused_on_encrypted_files() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    h.seed_user("u2", "bob", Role::Level3).await;
    let file = h.seed_file("f1", "plan.pdf", &admin).await;
    h.engine
        .share_standard(&admin.id, &file.id, &recipients(&["u2"]))
        .await
        .unwrap();

    assert!(matches!(
        h.engine.analyze_file(&admin.id, &file.id).await,
        Err(EngineError::NotAuthorized(_))
    ));
}

#[tokio::test]
async fn reentrant_analysis_of_the_same_file_is_rejected_while_pending() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    let file = h.seed_file("f1", "slow.bin", &admin).await;
    h.analyzer.set_latency(Duration::from_millis(200));

    let engine = Arc::new(h.engine);
    let background = {
        let engine = Arc::clone(&engine);
        let actor = admin.id.clone();
        let target = file.id.clone();
        tokio::spawn(async move { engine.analyze_file(&actor, &target).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = engine.analyze_file(&admin.id, &file.id).await;
    assert!(matches!(second, Err(EngineError::AnalysisPending(_))));

    background.await.unwrap().unwrap();

    // Once the first completes, the file is analyzable again.
    h.analyzer.set_latency(Duration::ZERO);
    engine.analyze_file(&admin.id, &file.id).await.unwrap();
}

// ─────────────────────────────────────────────────────────────────────────
// Cancellable Timers
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dropped_upload_applies_no_mutation() {
    let h = Harness::with_config(EngineConfig {
        upload_delay: Duration::from_millis(250),
        decrypt_delay: Duration::ZERO,
    });
    let user = h.seed_user("u1", "alice", Role::Level1).await;

    let upload = h
        .engine
        .upload_file(&user.id, "slow.txt", Bytes::from_static(b"x"), None);
    let result = tokio::time::timeout(Duration::from_millis(20), upload).await;
    assert!(result.is_err(), "upload should still be sleeping");

    // The future was dropped before the delay elapsed: nothing persisted.
    assert!(h.engine.files().await.unwrap().is_empty());
    assert!(h.engine.activity_log().await.unwrap().is_empty());
}

#[tokio::test]
async fn completed_upload_persists_and_logs() {
    let h = Harness::new();
    let user = h.seed_user("u1", "alice", Role::Level1).await;

    let file = h
        .engine
        .upload_file(&user.id, "report.pdf", Bytes::from_static(b"pdf"), None)
        .await
        .unwrap();
    assert_eq!(file.mime_type, "application/pdf");

    let files = h.engine.files().await.unwrap();
    assert_eq!(files.len(), 1);

    let log = h.engine.activity_log().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, smartcrypt_core::ActivityKind::Upload);
}

// ─────────────────────────────────────────────────────────────────────────
// Accounts & User Management
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_checks_role_and_password() {
    let h = Harness::new();
    h.seed_user("u1", "Alice", Role::Level2).await;

    let good = h
        .engine
        .login(&Credentials {
            username: "alice".into(),
            password: Some("pw".into()),
            role: Role::Level2,
        })
        .await
        .unwrap();
    assert!(good.is_some());

    let wrong_role = h
        .engine
        .login(&Credentials {
            username: "alice".into(),
            password: Some("pw".into()),
            role: Role::Level1,
        })
        .await
        .unwrap();
    assert!(wrong_role.is_none());

    let wrong_password = h
        .engine
        .login(&Credentials {
            username: "alice".into(),
            password: Some("nope".into()),
            role: Role::Level2,
        })
        .await
        .unwrap();
    assert!(wrong_password.is_none());

    // Exactly one Login entry was recorded.
    let logins = h
        .engine
        .activity_log()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.kind == smartcrypt_core::ActivityKind::Login)
        .count();
    assert_eq!(logins, 1);
}

#[tokio::test]
async fn legacy_passwordless_accounts_log_in_except_admins() {
    let h = Harness::new();
    let mut legacy = User::builder("u1", "olduser").role(Role::Level3).build();
    legacy.password = None;
    h.engine.store().insert_user(&legacy).await.unwrap();

    let mut legacy_admin = User::builder("a1", "oldadmin").role(Role::Admin).build();
    legacy_admin.password = None;
    h.engine.store().insert_user(&legacy_admin).await.unwrap();

    assert!(h
        .engine
        .login(&Credentials {
            username: "olduser".into(),
            password: None,
            role: Role::Level3,
        })
        .await
        .unwrap()
        .is_some());

    assert!(h
        .engine
        .login(&Credentials {
            username: "oldadmin".into(),
            password: None,
            role: Role::Admin,
        })
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn add_user_rejects_duplicates_and_derives_attributes() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;

    let created = h
        .engine
        .add_user(
            &admin.id,
            NewUser {
                user_id: "S1".into(),
                username: "alice".into(),
                password: "pw".into(),
                role: Role::Level2,
                role_name: Some("Researcher".into()),
                department: Some("Data Science".into()),
            },
        )
        .await
        .unwrap();
    assert!(created.attributes.contains("userID:s1"));
    assert!(created.attributes.contains("department:data-science"));

    let dup_name = h
        .engine
        .add_user(
            &admin.id,
            NewUser {
                user_id: "S2".into(),
                username: "ALICE".into(),
                password: "pw".into(),
                role: Role::Level3,
                role_name: None,
                department: None,
            },
        )
        .await;
    assert!(matches!(
        dup_name,
        Err(EngineError::Validation(ValidationError::DuplicateUsername(_)))
    ));

    let dup_id = h
        .engine
        .add_user(
            &admin.id,
            NewUser {
                user_id: "S1".into(),
                username: "bob".into(),
                password: "pw".into(),
                role: Role::Level3,
                role_name: None,
                department: None,
            },
        )
        .await;
    assert!(matches!(
        dup_id,
        Err(EngineError::Validation(ValidationError::DuplicateUserId(_)))
    ));

    // The creating admin was notified.
    let inbox = h.engine.notifications_for(&admin.id).await.unwrap();
    assert!(inbox.iter().any(|n| n.message.contains("alice")));
}

#[tokio::test]
async fn management_listing_never_contains_admins() {
    let h = Harness::new();
    h.seed_admin("a1", "root").await;
    h.seed_user("u1", "alice", Role::Level1).await;
    h.seed_user("u2", "bob", Role::Level4).await;

    let managed = h.engine.managed_users().await.unwrap();
    assert_eq!(managed.len(), 2);
    assert!(managed.iter().all(|u| !u.is_admin()));
}

#[tokio::test]
async fn status_changes_follow_the_management_matrix() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    let manager = h.seed_user("m1", "mia", Role::Level2).await;
    let target = h.seed_user("u1", "alice", Role::Level3).await;

    // Level 2 may suspend but not block.
    let suspended = h
        .engine
        .set_user_status(&manager.id, &target.id, UserStatus::Suspended)
        .await
        .unwrap();
    assert_eq!(suspended.status, UserStatus::Suspended);

    assert!(matches!(
        h.engine
            .set_user_status(&manager.id, &target.id, UserStatus::Blocked)
            .await,
        Err(EngineError::NotAuthorized(_))
    ));

    // Unsuspending takes suspend permission; blocking takes admin.
    h.engine
        .set_user_status(&manager.id, &target.id, UserStatus::Active)
        .await
        .unwrap();
    h.engine
        .set_user_status(&admin.id, &target.id, UserStatus::Blocked)
        .await
        .unwrap();

    // Unblocking is admin-only.
    assert!(matches!(
        h.engine
            .set_user_status(&manager.id, &target.id, UserStatus::Active)
            .await,
        Err(EngineError::NotAuthorized(_))
    ));
}

#[tokio::test]
async fn admins_are_never_management_targets() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    let other_admin = h.seed_admin("a2", "root2").await;

    assert!(matches!(
        h.engine
            .set_user_status(&admin.id, &other_admin.id, UserStatus::Blocked)
            .await,
        Err(EngineError::NotAuthorized(_))
    ));
    assert!(matches!(
        h.engine.delete_user(&admin.id, &other_admin.id).await,
        Err(EngineError::NotAuthorized(_))
    ));
}

#[tokio::test]
async fn deleting_a_user_keeps_their_logs_and_notifications() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    let user = h.seed_user("u1", "alice", Role::Level1).await;

    h.engine
        .login(&Credentials {
            username: "alice".into(),
            password: Some("pw".into()),
            role: Role::Level1,
        })
        .await
        .unwrap();
    h.engine
        .notify(NotifyTarget::User(user.id.clone()), "welcome")
        .await
        .unwrap();

    h.engine.delete_user(&admin.id, &user.id).await.unwrap();

    assert!(h.engine.store().get_user(&user.id).await.unwrap().is_none());
    assert_eq!(h.engine.notifications_for(&user.id).await.unwrap().len(), 1);
    assert!(h
        .engine
        .activity_log()
        .await
        .unwrap()
        .iter()
        .any(|e| e.username == "alice"));
}

// ─────────────────────────────────────────────────────────────────────────
// Help Desk
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn help_requests_reply_and_notify_admins() {
    let h = Harness::new();
    h.seed_admin("a1", "root").await;
    h.seed_admin("a2", "root2").await;
    let user = h.seed_user("u1", "alice", Role::Level3).await;

    let reply = h
        .engine
        .submit_help_request(&user.id, "I lost my decryption key")
        .await
        .unwrap();
    assert!(!reply.is_empty());

    for admin in ["a1", "a2"] {
        let inbox = h
            .engine
            .notifications_for(&UserId::from(admin))
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].message.contains("alice"));
    }
}

#[tokio::test]
async fn empty_help_request_is_rejected() {
    let h = Harness::new();
    let user = h.seed_user("u1", "alice", Role::Level3).await;
    assert!(matches!(
        h.engine.submit_help_request(&user.id, "  ").await,
        Err(EngineError::Validation(ValidationError::EmptyMessage))
    ));
}

#[tokio::test]
async fn assistant_failures_surface_and_skip_the_fanout() {
    let h = Harness::new();
    let admin = h.seed_admin("a1", "root").await;
    let user = h.seed_user("u1", "alice", Role::Level3).await;
    h.assistant.fail_with("service offline");

    assert!(matches!(
        h.engine.submit_help_request(&user.id, "help me").await,
        Err(EngineError::Assistant(_))
    ));
    assert!(h.engine.notifications_for(&admin.id).await.unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────
// SQLite Backend
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_share_flow_over_the_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = smartcrypt_store::SqliteStore::open(dir.path().join("app.db")).unwrap();
    let engine = Engine::new(
        store,
        Arc::new(CannedAnalyzer::new()) as Arc<dyn smartcrypt_analysis::ThreatAnalyzer>,
        Arc::new(CannedAssistant::new("ok")) as Arc<dyn smartcrypt_analysis::SupportAssistant>,
        EngineConfig::immediate(),
    );

    let admin = engine
        .register_admin(smartcrypt::NewAdmin {
            username: "root".into(),
            password: "secret".into(),
            first_name: "Ada".into(),
            last_name: "Admin".into(),
            email: "ada@example.org".into(),
            phone: None,
            organization: "Umbrella".into(),
        })
        .await
        .unwrap();

    let user = engine
        .add_user(
            &admin.id,
            NewUser {
                user_id: "S1".into(),
                username: "alice".into(),
                password: "pw".into(),
                role: Role::Level1,
                role_name: None,
                department: Some("Security".into()),
            },
        )
        .await
        .unwrap();

    let file = engine
        .upload_file(&user.id, "report.pdf", Bytes::from_static(b"pdf"), None)
        .await
        .unwrap();
    let outcome = engine
        .share_standard(&user.id, &file.id, &recipients(&[admin.id.as_str()]))
        .await
        .unwrap();

    let view = engine
        .view_file(&admin.id, &file.id, Some(outcome.key.as_str()))
        .await
        .unwrap();
    assert!(matches!(view, ViewOutcome::Granted { .. }));

    // Two activity entries (upload, share) and one share notification.
    assert_eq!(engine.activity_log().await.unwrap().len(), 2);
    assert_eq!(engine.notifications_for(&admin.id).await.unwrap().len(), 2);

    let stats = engine.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.encrypted_files, 1);
    assert_eq!(stats.total_users, 2);
}

// ─────────────────────────────────────────────────────────────────────────
// Admin Registration
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_registration_validates_fields_and_uniqueness() {
    let h = Harness::new();
    h.seed_user("u1", "alice", Role::Level1).await;

    let registered = h
        .engine
        .register_admin(smartcrypt::NewAdmin {
            username: "root".into(),
            password: "secret".into(),
            first_name: "Ada".into(),
            last_name: "Admin".into(),
            email: "ada@example.org".into(),
            phone: None,
            organization: "Umbrella".into(),
        })
        .await
        .unwrap();
    assert!(registered.is_admin());
    assert!(registered.attributes.contains("role:admin"));
    assert!(registered.attributes.contains("access:all"));

    // Usernames are unique across roles, case-insensitively.
    let taken = h
        .engine
        .register_admin(smartcrypt::NewAdmin {
            username: "ALICE".into(),
            password: "secret".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "x@example.org".into(),
            phone: None,
            organization: "Umbrella".into(),
        })
        .await;
    assert!(matches!(
        taken,
        Err(EngineError::Validation(ValidationError::DuplicateUsername(_)))
    ));

    let incomplete = h
        .engine
        .register_admin(smartcrypt::NewAdmin {
            username: "root2".into(),
            password: "secret".into(),
            first_name: "  ".into(),
            last_name: "B".into(),
            email: "x@example.org".into(),
            phone: None,
            organization: "Umbrella".into(),
        })
        .await;
    assert!(matches!(
        incomplete,
        Err(EngineError::Validation(ValidationError::MissingField(_)))
    ));
}
