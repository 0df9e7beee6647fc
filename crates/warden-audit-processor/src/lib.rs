//! Audit decision engine for Warden.
//!
//! An [`AuditProcessor`] answers two questions for the unit of work: is an
//! operation on a type audited at all, and should a finished changeset be
//! sealed and delivered. [`FilteredProcessor`] answers both from a
//! [`FilterProvider`](warden_audit_filter::FilterProvider), caching verdicts
//! per cycle in a [`CycleCache`] and indefinitely in its own L2 store.

mod cache;
mod error;
mod filtered;

pub use cache::CycleCache;
pub use error::ProcessorError;
pub use filtered::FilteredProcessor;

use warden_audit_types::{Changeset, OperationType};

/// Decides what gets audited.
pub trait AuditProcessor: Send + Sync {
    /// Early check whether `operation` on `entity_type` is audited.
    fn is_type_auditable(
        &self,
        cycle: &mut CycleCache,
        operation: OperationType,
        entity_type: &str,
    ) -> Result<bool, ProcessorError>;

    /// Last chance to edit the changeset. Returns true when the changeset
    /// was sealed and should go to the sinks. The cycle's type verdicts are
    /// cleared before returning, whatever the outcome.
    fn seal_changeset(
        &self,
        cycle: &mut CycleCache,
        changeset: &mut Changeset,
    ) -> Result<bool, ProcessorError>;
}
