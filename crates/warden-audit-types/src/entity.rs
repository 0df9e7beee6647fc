//! Entity identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use warden_common_core::Timestamp;

/// Opaque identity token of an in-memory entity.
///
/// Handles are allocated by the unit of work and are unrelated to business
/// keys: two handles never refer to the same entity within one pipeline.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Wrap a raw handle value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({})", self.0)
    }
}

/// Persistent identifier of an entity, if known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Single-column identifier.
    Scalar(Value),
    /// Composite identifier, id field name to value.
    Composite(BTreeMap<String, Value>),
}

impl EntityId {
    /// Build an id from named id fields. A single field collapses to a
    /// scalar; no fields at all yields `None`.
    pub fn from_fields<I, K>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut fields: BTreeMap<String, Value> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        match fields.len() {
            0 => None,
            1 => fields.pop_first().map(|(_, value)| Self::Scalar(value)),
            _ => Some(Self::Composite(fields)),
        }
    }

    /// String form stored in audit rows: scalars verbatim, composites as JSON.
    pub fn to_audit_string(&self) -> String {
        match self {
            Self::Scalar(Value::String(s)) => s.clone(),
            Self::Scalar(value) => value.to_string(),
            Self::Composite(fields) => {
                serde_json::to_string(fields).unwrap_or_else(|_| format!("{fields:?}"))
            }
        }
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::Scalar(Value::from(id))
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Scalar(Value::from(id))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Scalar(Value::from(id))
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::Scalar(Value::from(id))
    }
}

/// An entity the producer reports changes for.
pub trait Auditable {
    /// Handle assigned by the unit of work.
    fn handle(&self) -> EntityHandle;

    /// Persistent identifier, when already assigned.
    fn entity_id(&self) -> Option<EntityId> {
        None
    }

    /// Time of the change as known by the entity itself, e.g. when updates
    /// arrive through a queue long after they happened.
    fn audit_timestamp(&self) -> Option<Timestamp> {
        None
    }
}
