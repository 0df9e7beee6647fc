use warden_audit_types::{Auditable, EntityHandle, EntityId, Timestamp};

/// Minimal [`Auditable`] for pipeline tests.
#[derive(Debug, Clone)]
pub struct TestEntity {
    /// Identity within the unit of work.
    pub handle: EntityHandle,
    /// Persistent id, once assigned.
    pub id: Option<EntityId>,
    /// Last modification time.
    pub timestamp: Option<Timestamp>,
}

impl TestEntity {
    /// Entity with a handle and no id.
    pub fn new(handle: EntityHandle) -> Self {
        Self {
            handle,
            id: None,
            timestamp: None,
        }
    }

    /// Set the persistent id.
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Report an own audit timestamp.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl Auditable for TestEntity {
    fn handle(&self) -> EntityHandle {
        self.handle
    }

    fn entity_id(&self) -> Option<EntityId> {
        self.id.clone()
    }

    fn audit_timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }
}
