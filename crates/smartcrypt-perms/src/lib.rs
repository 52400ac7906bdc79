//! # SmartCrypt Permissions
//!
//! Access-control decisions and the encryption lifecycle.
//!
//! ## Overview
//!
//! Three pure pieces:
//!
//! - **Permission matrix** ([`matrix`]): (role, ownership, file state) →
//!   allowed file actions, plus the role-only user-management matrix
//! - **Policy evaluator** ([`policy`]): (attribute set, policy, mode) →
//!   [`Decision`], shared by every consumer
//! - **Lifecycle** ([`lifecycle`]): transitions among Plaintext, Standard,
//!   and Policy encryption, expressed as old-file → new-file reducers,
//!   with key generation in [`keygen`]
//!
//! Nothing here performs I/O; the engine applies the returned values to
//! the store atomically.

pub mod keygen;
pub mod lifecycle;
pub mod matrix;
pub mod policy;

pub use keygen::generate_key;
pub use lifecycle::{share_policy, share_standard, verify_key, ShareOutcome};
pub use matrix::{can_manage, can_perform, manageable_users, FileAction, ManageAction};
pub use policy::{evaluate, evaluate_file, Decision};
