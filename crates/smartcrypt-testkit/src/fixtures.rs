//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a zero-latency engine over a
//! memory store with canned collaborators, plus seeding helpers.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;

use smartcrypt::{Engine, EngineConfig};
use smartcrypt_analysis::{CannedAnalyzer, CannedAssistant};
use smartcrypt_core::{mime_type_for, FileItem, Role, User, UserId};
use smartcrypt_store::{MemoryStore, Store};

/// A test fixture with a zero-latency engine, a memory store, and canned
/// collaborators kept accessible for scripting.
pub struct TestFixture {
    pub engine: Engine<MemoryStore>,
    pub analyzer: Arc<CannedAnalyzer>,
    pub assistant: Arc<CannedAssistant>,
}

impl TestFixture {
    /// Create a fixture with default canned collaborators.
    pub fn new() -> Self {
        let analyzer = Arc::new(CannedAnalyzer::new());
        let assistant = Arc::new(CannedAssistant::new(
            "An administrator has been notified.",
        ));
        let engine = Engine::new(
            MemoryStore::new(),
            Arc::clone(&analyzer) as Arc<dyn smartcrypt_analysis::ThreatAnalyzer>,
            Arc::clone(&assistant) as Arc<dyn smartcrypt_analysis::SupportAssistant>,
            EngineConfig::immediate(),
        );
        Self {
            engine,
            analyzer,
            assistant,
        }
    }

    /// Seed a user directly into the store.
    pub async fn seed_user(&self, id: &str, username: &str, role: Role) -> User {
        let user = User::builder(id, username)
            .role(role)
            .password("pw")
            .build();
        self.engine.store().insert_user(&user).await.unwrap();
        user
    }

    /// Seed a user with an explicit attribute set (replacing the derived
    /// ones).
    pub async fn seed_user_with_attributes(
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

    /// Seed an administrator.
    pub async fn seed_admin(&self, id: &str, username: &str) -> User {
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

    /// Seed a plaintext file owned by `owner`.
    pub async fn seed_file(&self, id: &str, filename: &str, owner: &User) -> FileItem {
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

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a recipient set from string ids.
pub fn recipients(ids: &[&str]) -> BTreeSet<UserId> {
    ids.iter().map(|s| UserId::from(*s)).collect()
}
