//! Operation types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Kind of change observed on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum OperationType {
    /// Entity was persisted as new.
    #[serde(rename = "insert")]
    #[strum(serialize = "insert")]
    Create,
    /// Entity was loaded.
    #[serde(rename = "read")]
    #[strum(serialize = "read")]
    Read,
    /// Entity data was updated.
    #[serde(rename = "update")]
    #[strum(serialize = "update")]
    Update,
    /// Entity was removed.
    #[serde(rename = "delete")]
    #[strum(serialize = "delete")]
    Delete,
    /// A manual snapshot of the entity state.
    #[serde(rename = "snapshot")]
    #[strum(serialize = "snapshot")]
    Snapshot,
}

impl OperationType {
    /// Whether the operation carries the state after the change.
    pub fn has_new_state(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }

    /// Whether the operation carries the state before the change.
    pub fn has_old_state(&self) -> bool {
        !matches!(self, Self::Create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_wire_names() {
        let names: Vec<String> = OperationType::iter().map(|op| op.to_string()).collect();
        assert_eq!(names, ["insert", "read", "update", "delete", "snapshot"]);

        for op in OperationType::iter() {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{op}\""));
            assert_eq!(OperationType::from_str(&op.to_string()).unwrap(), op);
        }
    }

    #[test]
    fn test_state_split() {
        assert!(OperationType::Create.has_new_state());
        assert!(!OperationType::Create.has_old_state());
        assert!(OperationType::Update.has_new_state() && OperationType::Update.has_old_state());
        assert!(!OperationType::Delete.has_new_state());
        assert!(OperationType::Snapshot.has_old_state());
    }
}
