//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use bytes::Bytes;
use proptest::prelude::*;

use smartcrypt_core::{
    mime_type_for, Encryption, FileItem, PolicyMode, Role, User, UserId, UserStatus,
};

/// Generate a role.
pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Admin),
        Just(Role::Level1),
        Just(Role::Level2),
        Just(Role::Level3),
        Just(Role::Level4),
    ]
}

/// Generate a non-admin role.
pub fn assignable_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Level1),
        Just(Role::Level2),
        Just(Role::Level3),
        Just(Role::Level4),
    ]
}

/// Generate an account status.
pub fn user_status() -> impl Strategy<Value = UserStatus> {
    prop_oneof![
        Just(UserStatus::Active),
        Just(UserStatus::Blocked),
        Just(UserStatus::Suspended),
    ]
}

/// Generate a policy mode.
pub fn policy_mode() -> impl Strategy<Value = PolicyMode> {
    prop_oneof![Just(PolicyMode::And), Just(PolicyMode::Or)]
}

/// Generate a bare attribute value.
pub fn attribute_value() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}".prop_map(String::from)
}

/// Generate a `key:value` attribute.
pub fn attribute() -> impl Strategy<Value = String> {
    ("[a-z][a-zA-Z]{0,11}", attribute_value()).prop_map(|(key, value)| format!("{key}:{value}"))
}

/// Generate an attribute set.
pub fn attributes(max: usize) -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(attribute(), 0..=max)
}

/// Generate a comma-separated policy from 1..=max values.
pub fn policy(max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(attribute_value(), 1..=max).prop_map(|values| values.join(", "))
}

/// Generate a filename with a known extension.
pub fn filename() -> impl Strategy<Value = String> {
    ("[a-z]{1,12}", prop_oneof!["txt", "pdf", "png", "docx", "bin"])
        .prop_map(|(stem, ext)| format!("{stem}.{ext}"))
}

/// Parameters for generating a user.
#[derive(Debug, Clone)]
pub struct UserParams {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    pub attributes: BTreeSet<String>,
}

impl Arbitrary for UserParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            "[a-z][a-z0-9]{0,7}",
            "[a-z][a-z0-9.]{2,15}",
            role(),
            user_status(),
            attributes(6),
        )
            .prop_map(|(id, username, role, status, attributes)| UserParams {
                id,
                username,
                role,
                status,
                attributes,
            })
            .boxed()
    }
}

/// Build a user from parameters.
pub fn user_from_params(params: &UserParams) -> User {
    let mut user = User::builder(params.id.as_str(), params.username.clone())
        .role(params.role)
        .build();
    user.status = params.status;
    user.attributes = params.attributes.clone();
    user
}

/// Generate a file owned by the given user id, in any encryption state.
pub fn file_owned_by(owner: &str) -> impl Strategy<Value = FileItem> {
    let owner = owner.to_owned();
    (filename(), encryption()).prop_map(move |(name, encryption)| {
        let mut file = FileItem::new(
            format!("file-{name}"),
            name.clone(),
            1_000,
            "uploader",
            owner.as_str(),
            Bytes::from_static(b"content"),
            mime_type_for(&name),
        );
        file.encryption = encryption;
        file
    })
}

/// Generate an encryption state.
pub fn encryption() -> impl Strategy<Value = Encryption> {
    prop_oneof![
        Just(Encryption::Plaintext),
        (
            "[A-Z]{3,6}-[A-Z]{3,6}-[1-9][0-9]{2}",
            prop::collection::btree_set("[a-z][a-z0-9]{0,5}", 0..4)
        )
            .prop_map(|(key, ids)| Encryption::Standard {
                key: smartcrypt_core::DecryptionKey::new(key),
                shared_with: ids.into_iter().map(UserId::from).collect(),
            }),
        (policy(4), policy_mode()).prop_map(|(policy, mode)| Encryption::Policy {
            policy,
            mode
        }),
    ]
}
