//! Changesets.

use crate::entity::{EntityHandle, EntityId};
use crate::operation::OperationType;
use crate::record::EntityRecord;
use crate::trigger::Trigger;
use crate::user::User;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use warden_common_core::{ChangesetId, Timestamp};

/// Changeset invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangesetError {
    #[error("record ({operation}, {handle}) is already registered in changeset {changeset}")]
    DuplicateRecord {
        changeset: ChangesetId,
        operation: OperationType,
        handle: EntityHandle,
    },

    #[error("record ({operation}, {handle}) does not exist in changeset {changeset}")]
    MissingRecord {
        changeset: ChangesetId,
        operation: OperationType,
        handle: EntityHandle,
    },

    #[error("changeset {changeset} is already sealed")]
    AlreadySealed { changeset: ChangesetId },
}

/// Key of a record within its changeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    /// Operation.
    pub operation: OperationType,
    /// Entity handle.
    pub handle: EntityHandle,
}

impl RecordKey {
    /// Create a key.
    pub fn new(operation: OperationType, handle: EntityHandle) -> Self {
        Self { operation, handle }
    }
}

/// One logical transaction's batch of audited changes.
#[derive(Debug, Clone, Serialize)]
pub struct Changeset {
    id: ChangesetId,
    timestamp: Option<Timestamp>,
    /// What started the transaction.
    pub trigger: Trigger,
    /// Who made the changes.
    pub author: Option<User>,
    /// Who acted on behalf of the author, if anyone.
    pub impersonator: Option<User>,
    #[serde(serialize_with = "serialize_records")]
    records: BTreeMap<RecordKey, EntityRecord>,
    #[serde(skip)]
    sealed: bool,
}

fn serialize_records<S: Serializer>(
    records: &BTreeMap<RecordKey, EntityRecord>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(records.len()))?;
    for record in records.values() {
        seq.serialize_element(record)?;
    }
    seq.end()
}

impl Changeset {
    /// Create an open, empty changeset with a fresh id.
    pub fn new(trigger: Trigger) -> Self {
        Self {
            id: ChangesetId::new(),
            timestamp: None,
            trigger,
            author: None,
            impersonator: None,
            records: BTreeMap::new(),
            sealed: false,
        }
    }

    /// Set the author.
    pub fn with_author(mut self, author: Option<User>) -> Self {
        self.author = author;
        self
    }

    /// Set the impersonator.
    pub fn with_impersonator(mut self, impersonator: Option<User>) -> Self {
        self.impersonator = impersonator;
        self
    }

    /// Stable identifier.
    pub fn id(&self) -> ChangesetId {
        self.id
    }

    /// Seal time, absent until the changeset is flushed.
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }

    /// Stamp the seal time.
    pub fn stamp(&mut self, timestamp: Timestamp) {
        self.timestamp = Some(timestamp);
    }

    /// Whether the changeset has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Seal the changeset; happens at most once.
    pub fn seal(&mut self) -> Result<(), ChangesetError> {
        if self.sealed {
            return Err(ChangesetError::AlreadySealed { changeset: self.id });
        }
        self.timestamp.get_or_insert_with(Timestamp::now);
        self.sealed = true;
        Ok(())
    }

    /// Create a record and register it under `(operation, handle)`.
    pub fn create_record(
        &mut self,
        operation: OperationType,
        handle: EntityHandle,
        entity_type: impl Into<String>,
        id: Option<EntityId>,
        timestamp: Timestamp,
    ) -> Result<&mut EntityRecord, ChangesetError> {
        use std::collections::btree_map::Entry;

        match self.records.entry(RecordKey::new(operation, handle)) {
            Entry::Occupied(_) => Err(ChangesetError::DuplicateRecord {
                changeset: self.id,
                operation,
                handle,
            }),
            Entry::Vacant(slot) => Ok(slot.insert(EntityRecord::new(
                self.id,
                operation,
                handle,
                entity_type.into(),
                id,
                timestamp,
            ))),
        }
    }

    /// Record for `(operation, handle)`.
    pub fn record(&self, operation: OperationType, handle: EntityHandle) -> Option<&EntityRecord> {
        self.records.get(&RecordKey::new(operation, handle))
    }

    /// Mutable record for `(operation, handle)`.
    pub fn record_mut(
        &mut self,
        operation: OperationType,
        handle: EntityHandle,
    ) -> Option<&mut EntityRecord> {
        self.records.get_mut(&RecordKey::new(operation, handle))
    }

    /// Remove and return a record.
    pub fn remove_record(
        &mut self,
        operation: OperationType,
        handle: EntityHandle,
    ) -> Result<EntityRecord, ChangesetError> {
        self.records
            .remove(&RecordKey::new(operation, handle))
            .ok_or(ChangesetError::MissingRecord {
                changeset: self.id,
                operation,
                handle,
            })
    }

    /// Drop every record for which `keep` returns false.
    pub fn retain_records(&mut self, mut keep: impl FnMut(&EntityRecord) -> bool) {
        self.records.retain(|_, record| keep(record));
    }

    /// All records. Order carries no meaning.
    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }

    /// All records, mutably.
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut EntityRecord> {
        self.records.values_mut()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldChange;
    use proptest::prelude::*;
    use serde_json::json;

    fn handle(raw: u64) -> EntityHandle {
        EntityHandle::from_raw(raw)
    }

    #[test]
    fn test_new_changeset_is_open_and_empty() {
        let changeset = Changeset::new(Trigger::Opaque);
        assert!(changeset.is_empty());
        assert!(!changeset.is_sealed());
        assert!(changeset.timestamp().is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Changeset::new(Trigger::Opaque).id(), Changeset::new(Trigger::Opaque).id());
    }

    #[test]
    fn test_create_registers_record() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        let id = changeset.id();
        let record = changeset
            .create_record(OperationType::Create, handle(1), "Invoice", None, Timestamp::now())
            .unwrap();
        assert_eq!(record.changeset_id(), id);

        assert_eq!(changeset.len(), 1);
        assert!(changeset.record(OperationType::Create, handle(1)).is_some());
        assert!(changeset.record(OperationType::Update, handle(1)).is_none());
    }

    #[test]
    fn test_duplicate_record_fails() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        changeset
            .create_record(OperationType::Update, handle(1), "Invoice", None, Timestamp::now())
            .unwrap();
        let err = changeset
            .create_record(OperationType::Update, handle(1), "Invoice", None, Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, ChangesetError::DuplicateRecord { .. }));

        // Same handle under another operation is a distinct record.
        assert!(changeset
            .create_record(OperationType::Delete, handle(1), "Invoice", None, Timestamp::now())
            .is_ok());
    }

    #[test]
    fn test_remove_missing_record_fails() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        let err = changeset.remove_record(OperationType::Read, handle(9)).unwrap_err();
        assert!(matches!(err, ChangesetError::MissingRecord { operation: OperationType::Read, .. }));
    }

    #[test]
    fn test_remove_returns_record() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        changeset
            .create_record(OperationType::Read, handle(2), "Customer", None, Timestamp::now())
            .unwrap();
        let removed = changeset.remove_record(OperationType::Read, handle(2)).unwrap();
        assert_eq!(removed.entity_type(), "Customer");
        assert!(changeset.is_empty());
    }

    #[test]
    fn test_seal_only_once() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        changeset.seal().unwrap();
        assert!(changeset.is_sealed());
        assert!(changeset.timestamp().is_some());
        assert!(matches!(changeset.seal(), Err(ChangesetError::AlreadySealed { .. })));
    }

    #[test]
    fn test_seal_keeps_stamped_time() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        let stamped = Timestamp::now();
        changeset.stamp(stamped);
        changeset.seal().unwrap();
        assert_eq!(changeset.timestamp(), Some(stamped));
    }

    #[test]
    fn test_serializes_records_as_list() {
        let mut changeset = Changeset::new(Trigger::Opaque).with_author(Some(User::new("alice")));
        changeset
            .create_record(OperationType::Update, handle(1), "Invoice", None, Timestamp::now())
            .unwrap()
            .set_change("total", FieldChange::new(1, 2));

        let value = serde_json::to_value(&changeset).unwrap();
        assert_eq!(value["trigger"], json!({ "source": "opaque" }));
        assert_eq!(value["author"]["id"], "alice");
        assert_eq!(value["records"].as_array().unwrap().len(), 1);
        assert!(value.get("sealed").is_none());
    }

    proptest! {
        #[test]
        fn test_one_record_per_key(keys in proptest::collection::vec((0u8..5, 0u64..8), 0..40)) {
            let ops = [
                OperationType::Create,
                OperationType::Read,
                OperationType::Update,
                OperationType::Delete,
                OperationType::Snapshot,
            ];
            let mut changeset = Changeset::new(Trigger::Opaque);
            let mut distinct = std::collections::HashSet::new();

            for (op, raw) in keys {
                let operation = ops[op as usize];
                let result = changeset.create_record(operation, handle(raw), "T", None, Timestamp::now());
                prop_assert_eq!(result.is_ok(), distinct.insert((op, raw)));
            }
            prop_assert_eq!(changeset.len(), distinct.len());
        }
    }
}
