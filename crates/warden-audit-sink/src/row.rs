//! Flat audit rows, one per entity record.

use crate::error::SinkError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use warden_audit_types::{
    Changeset, ChangesetId, EntityRecord, OperationType, Timestamp, TriggerContext, User,
};
use warden_common_core::RowId;

/// Field values on one side of a change.
pub type StateSnapshot = BTreeMap<String, Value>;

/// A storage-ready view of one record of a sealed changeset.
///
/// Authorship is resolved against the changeset, so a record override wins
/// over the changeset-wide author. Which state sides are present depends on
/// the operation: inserts carry only the new state, updates both, every
/// other operation only the old state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    /// Row identifier.
    pub id: RowId,
    /// Changeset the record belongs to.
    pub changeset_id: ChangesetId,
    /// When the changeset was sealed.
    pub changeset_timestamp: Timestamp,
    /// What happened to the entity.
    pub operation: OperationType,
    /// Audited type name.
    pub entity_type: String,
    /// Entity id, when the entity has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Resolved author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    /// Resolved impersonator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonator: Option<User>,
    /// Trigger context of the changeset.
    pub action: TriggerContext,
    /// When the record was taken.
    pub timestamp: Timestamp,
    /// State before the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_state: Option<StateSnapshot>,
    /// State after the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<StateSnapshot>,
    /// Caller-supplied payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opaque_data: Option<Value>,
}

impl AuditRow {
    /// Flatten a sealed changeset.
    pub fn from_changeset(changeset: &Changeset) -> Result<Vec<Self>, SinkError> {
        let changeset_timestamp = match changeset.timestamp() {
            Some(ts) if changeset.is_sealed() => ts,
            _ => {
                return Err(SinkError::Unsealed {
                    changeset: changeset.id(),
                })
            }
        };
        let action = changeset.trigger.action();

        Ok(changeset
            .records()
            .map(|record| Self::from_record(changeset, changeset_timestamp, &action, record))
            .collect())
    }

    fn from_record(
        changeset: &Changeset,
        changeset_timestamp: Timestamp,
        action: &TriggerContext,
        record: &EntityRecord,
    ) -> Self {
        let operation = record.operation();
        let old_state = operation.has_old_state().then(|| {
            record
                .state_change
                .iter()
                .map(|(field, change)| (field.clone(), change.old.clone()))
                .collect()
        });
        let new_state = operation.has_new_state().then(|| {
            record
                .state_change
                .iter()
                .map(|(field, change)| (field.clone(), change.new.clone()))
                .collect()
        });

        Self {
            id: RowId::new(),
            changeset_id: changeset.id(),
            changeset_timestamp,
            operation,
            entity_type: record.entity_type().to_string(),
            entity_id: record.id.as_ref().map(|id| id.to_audit_string()),
            author: record.effective_author(changeset).cloned(),
            impersonator: record.effective_impersonator(changeset).cloned(),
            action: action.clone(),
            timestamp: record.timestamp(),
            old_state,
            new_state,
            opaque_data: record.opaque_data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use warden_audit_types::{EntityHandle, EntityId, FieldChange, Trigger};

    fn sealed(operation: OperationType) -> Changeset {
        let mut changeset = Changeset::new(Trigger::Http {
            request_id: Some("req-1".into()),
            ip: Some("10.0.0.1".into()),
        })
        .with_author(Some(User::new("42")));
        let record = changeset
            .create_record(
                operation,
                EntityHandle::from_raw(1),
                "Invoice",
                Some(EntityId::from(7u64)),
                Timestamp::now(),
            )
            .unwrap();
        record.set_change("total", FieldChange::new(10, 12));
        changeset.seal().unwrap();
        changeset
    }

    #[test]
    fn test_unsealed_changeset_is_refused() {
        let changeset = Changeset::new(Trigger::Opaque);
        assert!(matches!(
            AuditRow::from_changeset(&changeset),
            Err(SinkError::Unsealed { .. })
        ));
    }

    #[test]
    fn test_insert_has_new_state_only() {
        let rows = AuditRow::from_changeset(&sealed(OperationType::Create)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].old_state, None);
        assert_eq!(rows[0].new_state, Some(StateSnapshot::from([("total".into(), json!(12))])));
    }

    #[test]
    fn test_update_has_both_states() {
        let rows = AuditRow::from_changeset(&sealed(OperationType::Update)).unwrap();
        assert_eq!(rows[0].old_state, Some(StateSnapshot::from([("total".into(), json!(10))])));
        assert_eq!(rows[0].new_state, Some(StateSnapshot::from([("total".into(), json!(12))])));
    }

    #[test]
    fn test_delete_has_old_state_only() {
        let rows = AuditRow::from_changeset(&sealed(OperationType::Delete)).unwrap();
        assert_eq!(rows[0].old_state, Some(StateSnapshot::from([("total".into(), json!(10))])));
        assert_eq!(rows[0].new_state, None);
    }

    #[test]
    fn test_row_resolves_author_and_action() {
        let changeset = sealed(OperationType::Update);
        let row = &AuditRow::from_changeset(&changeset).unwrap()[0];

        assert_eq!(row.changeset_id, changeset.id());
        assert_eq!(Some(row.changeset_timestamp), changeset.timestamp());
        assert_eq!(row.entity_type, "Invoice");
        assert_eq!(row.entity_id.as_deref(), Some("7"));
        assert_eq!(row.author, Some(User::new("42")));
        assert_eq!(row.action.get("source"), Some(&json!("http")));
        assert_eq!(row.action.get("reqId"), Some(&json!("req-1")));
    }

    #[test]
    fn test_record_author_overrides_changeset() {
        let mut changeset = sealed(OperationType::Update);
        for record in changeset.records_mut() {
            record.author = Some(User::new("7").with_kind("service"));
        }
        let row = &AuditRow::from_changeset(&changeset).unwrap()[0];
        assert_eq!(row.author, Some(User::new("7").with_kind("service")));
    }

    #[test]
    fn test_serialized_row_skips_absent_sides() {
        let row = &AuditRow::from_changeset(&sealed(OperationType::Create)).unwrap()[0];
        let value = serde_json::to_value(row).unwrap();
        assert_eq!(value["operation"], json!("insert"));
        assert!(value.get("old_state").is_none());
        assert_eq!(value["new_state"]["total"], json!(12));
    }
}
