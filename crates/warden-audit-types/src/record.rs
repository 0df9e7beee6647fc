//! Per-entity change records.

use crate::changeset::Changeset;
use crate::entity::{EntityHandle, EntityId};
use crate::operation::OperationType;
use crate::user::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use warden_common_core::{ChangesetId, Timestamp};

/// Old and new value of one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value before the change.
    pub old: Value,
    /// Value after the change.
    pub new: Value,
}

impl FieldChange {
    /// Create a change.
    pub fn new(old: impl Into<Value>, new: impl Into<Value>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// A change with only the new value known.
    pub fn created(new: impl Into<Value>) -> Self {
        Self::new(Value::Null, new)
    }

    /// A change with only the old value known.
    pub fn removed(old: impl Into<Value>) -> Self {
        Self::new(old, Value::Null)
    }
}

/// Field name to change.
pub type StateChange = BTreeMap<String, FieldChange>;

/// Scratch state carried through the pipeline, never serialized.
pub type InternalState = BTreeMap<String, Value>;

/// One change to one entity within a changeset.
#[derive(Debug, Clone, Serialize)]
pub struct EntityRecord {
    changeset_id: ChangesetId,
    operation: OperationType,
    handle: EntityHandle,
    entity_type: String,
    timestamp: Timestamp,
    /// Persistent entity identifier, when known.
    pub id: Option<EntityId>,
    /// Field changes; filters may remove entries.
    pub state_change: StateChange,
    /// Author override. `None` defers to the changeset author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    /// Impersonator override. `None` defers to the changeset impersonator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonator: Option<User>,
    /// Application data, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opaque_data: Option<Value>,
    /// Pipeline scratch state.
    #[serde(skip)]
    pub internal_state: InternalState,
}

impl EntityRecord {
    pub(crate) fn new(
        changeset_id: ChangesetId,
        operation: OperationType,
        handle: EntityHandle,
        entity_type: String,
        id: Option<EntityId>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            changeset_id,
            operation,
            handle,
            entity_type,
            timestamp,
            id,
            state_change: StateChange::new(),
            author: None,
            impersonator: None,
            opaque_data: None,
            internal_state: InternalState::new(),
        }
    }

    /// Owning changeset.
    pub fn changeset_id(&self) -> ChangesetId {
        self.changeset_id
    }

    /// Operation recorded.
    pub fn operation(&self) -> OperationType {
        self.operation
    }

    /// Entity handle.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Concrete entity type name.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Time of the last notification for this record.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Refresh the record timestamp. An entity-supplied time wins; otherwise
    /// the timestamp moves strictly forward.
    pub fn touch(&mut self, entity_time: Option<Timestamp>) {
        self.timestamp = entity_time.unwrap_or_else(|| self.timestamp.advanced());
    }

    /// Record or overwrite a field change.
    pub fn set_change(&mut self, field: impl Into<String>, change: FieldChange) {
        self.state_change.insert(field.into(), change);
    }

    /// Author of this record, falling back to the changeset author.
    pub fn effective_author<'a>(&'a self, changeset: &'a Changeset) -> Option<&'a User> {
        self.author.as_ref().or(changeset.author.as_ref())
    }

    /// Impersonator of this record, falling back to the changeset impersonator.
    pub fn effective_impersonator<'a>(&'a self, changeset: &'a Changeset) -> Option<&'a User> {
        self.impersonator.as_ref().or(changeset.impersonator.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Trigger;
    use serde_json::json;

    fn record() -> EntityRecord {
        EntityRecord::new(
            ChangesetId::new(),
            OperationType::Update,
            EntityHandle::from_raw(1),
            "Invoice".into(),
            Some(EntityId::from(10u64)),
            Timestamp::now(),
        )
    }

    #[test]
    fn test_touch_moves_forward() {
        let mut record = record();
        let before = record.timestamp();
        record.touch(None);
        assert!(record.timestamp() > before);
    }

    #[test]
    fn test_touch_prefers_entity_time() {
        let mut record = record();
        let queued_at = record.timestamp();
        record.touch(None);
        record.touch(Some(queued_at));
        assert_eq!(record.timestamp(), queued_at);
    }

    #[test]
    fn test_effective_author_falls_back() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        changeset.author = Some(User::new("alice"));
        let mut record = record();

        assert_eq!(record.effective_author(&changeset), Some(&User::new("alice")));
        record.author = Some(User::new("bob"));
        assert_eq!(record.effective_author(&changeset), Some(&User::new("bob")));
        assert_eq!(record.effective_impersonator(&changeset), None);
    }

    #[test]
    fn test_internal_state_not_serialized() {
        let mut record = record();
        record.set_change("total", FieldChange::new(10, 20));
        record.internal_state.insert("marker".into(), json!(true));

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("internal_state").is_none());
        assert_eq!(value["state_change"]["total"], json!({ "old": 10, "new": 20 }));
        assert_eq!(value["operation"], "update");
    }
}
