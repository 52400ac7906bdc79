//! User accounts, roles, and statuses.
//!
//! Roles form a privilege order from Admin down to Level 3, with Level 4 as
//! a restricted non-owner role: Level 4 accounts can only receive and
//! download files, never upload, share, or manage anything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A user's role. Closed enumeration: every permission decision matches
/// exhaustively on this, so adding a role is a compile-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Organization administrator.
    Admin,
    /// Highest non-admin privilege level.
    Level1,
    Level2,
    Level3,
    /// Restricted recipient-only role.
    Level4,
}

impl Role {
    /// Display label, matching the labels users pick at login.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Level1 => "Level 1",
            Role::Level2 => "Level 2",
            Role::Level3 => "Level 3",
            Role::Level4 => "Level 4",
        }
    }

    /// Whether this is the administrator role.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Whether this is the restricted recipient-only role.
    pub fn is_restricted(self) -> bool {
        matches!(self, Role::Level4)
    }

    /// Roles assignable through the admin panel (everything but Admin).
    pub fn assignable() -> [Role; 4] {
        [Role::Level1, Role::Level2, Role::Level3, Role::Level4]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Account status. Status changes are the only structural mutation a user
/// record undergoes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Blocked,
    Suspended,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UserStatus::Active => "Active",
            UserStatus::Blocked => "Blocked",
            UserStatus::Suspended => "Suspended",
        })
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier, chosen at creation.
    pub id: UserId,

    /// Login name, unique case-insensitively across all roles.
    pub username: String,

    /// Login secret. `None` marks a legacy passwordless account.
    pub password: Option<String>,

    /// The account's role.
    pub role: Role,

    /// Free-text display label for the role (defaults to the role label).
    pub role_name: String,

    /// Current account status.
    pub status: UserStatus,

    /// Organization, inherited from the creating administrator.
    pub organization: Option<String>,

    /// Department, as entered in the admin panel.
    pub department: Option<String>,

    /// Attribute set in `key:value` form, e.g. `department:security`.
    /// Policy evaluation matches against the value parts.
    pub attributes: BTreeSet<String>,
}

impl User {
    /// Start building a user record.
    pub fn builder(id: impl Into<UserId>, username: impl Into<String>) -> UserBuilder {
        UserBuilder {
            id: id.into(),
            username: username.into(),
            password: None,
            role: Role::Level1,
            role_name: None,
            organization: None,
            department: None,
            extra_attributes: BTreeSet::new(),
        }
    }

    /// Whether this account holds the administrator role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Normalize a raw form value into an attribute value: trimmed, inner
/// whitespace collapsed to `-`, lowercased.
pub fn attribute_value(raw: &str) -> String {
    raw.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Builder for [`User`].
///
/// `build` derives the attribute set from the structured fields under the
/// fixed keys `level`, `department`, `roleName`, and `userID`, the same
/// derivation the admin panel performs.
pub struct UserBuilder {
    id: UserId,
    username: String,
    password: Option<String>,
    role: Role,
    role_name: Option<String>,
    organization: Option<String>,
    department: Option<String>,
    extra_attributes: BTreeSet<String>,
}

impl UserBuilder {
    /// Set the role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the display role name.
    pub fn role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = Some(role_name.into());
        self
    }

    /// Set the organization.
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Set the department.
    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Add a literal `key:value` attribute on top of the derived ones.
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.extra_attributes.insert(attribute.into());
        self
    }

    /// Build the user record, deriving attributes from the form fields.
    pub fn build(self) -> User {
        let mut attributes = BTreeSet::new();
        attributes.insert(format!("level:{}", attribute_value(self.role.label())));
        if let Some(ref department) = self.department {
            if !department.trim().is_empty() {
                attributes.insert(format!("department:{}", attribute_value(department)));
            }
        }
        let role_name = self
            .role_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.role.label().to_owned());
        attributes.insert(format!("roleName:{}", attribute_value(&role_name)));
        attributes.insert(format!("userID:{}", attribute_value(self.id.as_str())));
        attributes.extend(self.extra_attributes);

        User {
            id: self.id,
            username: self.username,
            password: self.password,
            role: self.role,
            role_name,
            status: UserStatus::Active,
            organization: self.organization,
            department: self.department.map(|d| d.trim().to_owned()),
            attributes,
        }
    }
}
