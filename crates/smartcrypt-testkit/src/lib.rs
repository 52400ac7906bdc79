//! # SmartCrypt Testkit
//!
//! Testing utilities for the SmartCrypt engine.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a zero-latency engine over a memory store with canned
//!   collaborators, plus seeding helpers
//! - **Generators**: proptest strategies for roles, attributes, policies,
//!   and files
//!
//! ## Test Fixtures
//!
//! ```rust
//! use smartcrypt_testkit::fixtures::TestFixture;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let fixture = TestFixture::new();
//! let owner = fixture.seed_user("u1", "alice", smartcrypt_core::Role::Level1).await;
//! let file = fixture.seed_file("f1", "notes.txt", &owner).await;
//! # });
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use smartcrypt_testkit::generators::{attributes, policy, policy_mode};
//!
//! proptest! {
//!     #[test]
//!     fn evaluation_is_total(attrs in attributes(8), p in policy(4), m in policy_mode()) {
//!         let _ = smartcrypt_perms::evaluate(&attrs, &p, m);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{recipients, TestFixture};
pub use generators::{user_from_params, UserParams};
