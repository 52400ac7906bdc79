//! Strong identifier types for the SmartCrypt engine.
//!
//! All identifiers are string newtypes to prevent misuse at compile time;
//! a `UserId` cannot be passed where a `FileId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a user account.
    ///
    /// User ids are chosen at creation (e.g. `U12345` from the admin panel)
    /// and are referenced from files, notifications, and share lists.
    UserId
}

string_id! {
    /// Identifier of an uploaded file.
    FileId
}

string_id! {
    /// Identifier of a notification record.
    NotificationId
}

string_id! {
    /// Identifier of an activity-log entry.
    LogId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_types() {
        let user = UserId::from("u1");
        let file = FileId::from("u1");
        // Same underlying text, different types; equality only within a type.
        assert_eq!(user.as_str(), file.as_str());
        assert_eq!(user, UserId::new("u1"));
    }

    #[test]
    fn test_display_and_debug() {
        let id = FileId::new("file-42");
        assert_eq!(format!("{}", id), "file-42");
        assert_eq!(format!("{:?}", id), "FileId(file-42)");
    }

    #[test]
    fn test_serde_transparent() {
        let id = UserId::new("u7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"u7\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
