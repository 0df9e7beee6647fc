//! In-memory sink.

use crate::{AuditSink, SinkError};
use parking_lot::Mutex;
use warden_audit_types::Changeset;

/// Keeps a copy of every committed changeset.
#[derive(Debug, Default)]
pub struct MemorySink {
    changesets: Mutex<Vec<Changeset>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of the changesets received so far.
    pub fn changesets(&self) -> Vec<Changeset> {
        self.changesets.lock().clone()
    }

    /// Most recent changeset.
    pub fn last(&self) -> Option<Changeset> {
        self.changesets.lock().last().cloned()
    }

    /// Remove and return everything received so far.
    pub fn take(&self) -> Vec<Changeset> {
        std::mem::take(&mut *self.changesets.lock())
    }

    /// Number of changesets received.
    pub fn len(&self) -> usize {
        self.changesets.lock().len()
    }

    /// Whether nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.changesets.lock().is_empty()
    }
}

impl AuditSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn commit_audit(&self, changeset: &Changeset) -> Result<(), SinkError> {
        self.changesets.lock().push(changeset.clone());
        Ok(())
    }
}
