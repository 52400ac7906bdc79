//! Attribute policy evaluation.
//!
//! A policy is a comma-separated list of bare attribute *values* (not
//! `key:value` pairs), combined under AND or OR. Users hold `key:value`
//! attributes; evaluation matches the value parts only.
//!
//! Evaluation is pure and total. Every consumer — viewing, downloading,
//! and the received-files filter — must go through [`evaluate_file`] so
//! the call sites cannot diverge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use smartcrypt_core::{Encryption, FileItem, PolicyMode, User};

/// Outcome of an access decision. A denial is a normal result the caller
/// renders as a message, never an error or a system fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Granted,
    Denied,
}

impl Decision {
    /// Whether access was granted.
    pub fn is_granted(self) -> bool {
        matches!(self, Decision::Granted)
    }
}

/// Parse a raw policy string into its required values: split on commas,
/// trim, lowercase, drop empties.
fn required_values(policy: &str) -> BTreeSet<String> {
    policy
        .split(',')
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Extract the value parts of a user's `key:value` attributes, normalized.
/// Entries without a `:` contribute nothing.
fn attribute_values(attributes: &BTreeSet<String>) -> BTreeSet<String> {
    attributes
        .iter()
        .filter_map(|attr| attr.split(':').nth(1))
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Evaluate a raw policy against an attribute set.
///
/// An empty or whitespace-only policy always denies: a file cannot carry a
/// vacuous policy that grants universal access.
pub fn evaluate(attributes: &BTreeSet<String>, policy: &str, mode: PolicyMode) -> Decision {
    let required = required_values(policy);
    if required.is_empty() {
        return Decision::Denied;
    }

    let held = attribute_values(attributes);
    let granted = match mode {
        PolicyMode::Or => required.iter().any(|v| held.contains(v)),
        PolicyMode::And => required.iter().all(|v| held.contains(v)),
    };

    if granted {
        Decision::Granted
    } else {
        Decision::Denied
    }
}

/// Evaluate a user against a file's policy.
///
/// Only policy-encrypted files can grant this way; plaintext and
/// standard-encrypted files always answer `Denied` (their access paths do
/// not go through attributes). In particular, once a standard share has
/// overwritten a policy, the old policy no longer applies.
pub fn evaluate_file(user: &User, file: &FileItem) -> Decision {
    match &file.encryption {
        Encryption::Policy { policy, mode } => evaluate(&user.attributes, policy, *mode),
        _ => Decision::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_and_requires_all_values() {
        let holding = attrs(&["level:level1", "department:security"]);
        assert_eq!(
            evaluate(&holding, "level1,security", PolicyMode::And),
            Decision::Granted
        );

        let partial = attrs(&["level:level1"]);
        assert_eq!(
            evaluate(&partial, "level1,security", PolicyMode::And),
            Decision::Denied
        );
    }

    #[test]
    fn test_or_grants_on_any_value() {
        let holding = attrs(&["department:security"]);
        assert_eq!(
            evaluate(&holding, "level1,security", PolicyMode::Or),
            Decision::Granted
        );
        assert_eq!(
            evaluate(&holding, "level1,finance", PolicyMode::Or),
            Decision::Denied
        );
    }

    #[test]
    fn test_empty_policy_always_denies() {
        let holding = attrs(&["department:security"]);
        for mode in [PolicyMode::And, PolicyMode::Or] {
            assert_eq!(evaluate(&holding, "", mode), Decision::Denied);
            assert_eq!(evaluate(&holding, "   ", mode), Decision::Denied);
            assert_eq!(evaluate(&holding, " , , ", mode), Decision::Denied);
        }
    }

    #[test]
    fn test_policy_values_are_normalized() {
        let holding = attrs(&["department:Security"]);
        assert_eq!(
            evaluate(&holding, "  SECURITY  ", PolicyMode::And),
            Decision::Granted
        );
    }

    #[test]
    fn test_attributes_without_colon_contribute_nothing() {
        let holding = attrs(&["security"]);
        assert_eq!(
            evaluate(&holding, "security", PolicyMode::Or),
            Decision::Denied
        );
    }

    #[test]
    fn test_attribute_value_is_second_segment() {
        // "a:b:c" contributes "b", not "b:c".
        let holding = attrs(&["key:b:c"]);
        assert_eq!(evaluate(&holding, "b", PolicyMode::Or), Decision::Granted);
        assert_eq!(evaluate(&holding, "b:c", PolicyMode::Or), Decision::Denied);
    }
}
