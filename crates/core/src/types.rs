use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::LockError;

/// A reservation of one slot in a group by a client identity.
///
/// Identity is the pair `(group, id)`; a `Lock` is never mutated once
/// created, only removed by `Release`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub group: String,
    pub id: String,
    pub created: DateTime<Utc>,
}

impl Lock {
    #[must_use]
    pub fn new(group: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            id: id.into(),
            created: Utc::now(),
        }
    }
}

/// Per-group slot configuration, declared at startup and immutable
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub slots: usize,
}

/// The full set of configured groups, keyed by group name.
pub type Groups = HashMap<String, GroupConfig>;

/// Build the default single-group configuration: `{"default": {slots: 1}}`.
#[must_use]
pub fn default_groups() -> Groups {
    let mut groups = Groups::new();
    groups.insert("default".to_string(), GroupConfig { slots: 1 });
    groups
}

/// Reject any group whose configured slot count is below 1.
pub fn validate_groups(groups: &Groups) -> Result<(), LockError> {
    if groups.values().any(|g| g.slots < 1) {
        return Err(LockError::GroupSlotsOutOfRange);
    }
    Ok(())
}

/// A group name is valid if it matches `^[a-zA-Z0-9.-]+$` and contains no
/// newline. Implemented as a byte scan rather than pulling in `regex` for a
/// single trivial character class.
#[must_use]
pub fn is_valid_group_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_groups_has_one_slot() {
        let groups = default_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["default"].slots, 1);
    }

    #[test]
    fn validate_groups_rejects_zero_slots() {
        let mut groups = Groups::new();
        groups.insert("g".to_string(), GroupConfig { slots: 0 });
        assert!(matches!(
            validate_groups(&groups),
            Err(LockError::GroupSlotsOutOfRange)
        ));
    }

    #[test]
    fn validate_groups_accepts_positive_slots() {
        let groups = default_groups();
        assert!(validate_groups(&groups).is_ok());
    }

    #[test]
    fn group_name_grammar() {
        assert!(is_valid_group_name("default"));
        assert!(is_valid_group_name("web-fleet.1"));
        assert!(!is_valid_group_name("bad group!"));
        assert!(!is_valid_group_name(""));
        assert!(!is_valid_group_name("bad\ngroup"));
    }
}
