//! Filter capabilities.

use crate::error::FilterError;
use crate::vote::{Verdict, Vote};
use warden_audit_types::{Changeset, OperationType};

/// Behaviour shared by every filter.
pub trait Filter: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the filter's decisive answers hold for every future changeset,
    /// so the processor may cache them indefinitely.
    fn cacheable(&self) -> bool {
        false
    }
}

/// Votes on whether an operation on an entity type is audited at all.
pub trait TypeFilter: Filter {
    /// Vote for `(operation, entity_type)`.
    fn vote_type(&self, operation: OperationType, entity_type: &str) -> Result<Vote, FilterError>;
}

/// Votes on whether a single field of a record is kept.
pub trait FieldFilter: Filter {
    /// Vote for `field` of `entity_type` under `operation`.
    fn vote_field(
        &self,
        operation: OperationType,
        entity_type: &str,
        field: &str,
    ) -> Result<Vote, FilterError>;
}

/// Inspects a whole changeset right before it is sealed. May edit records.
pub trait ChangesetFilter: Filter {
    /// Accept or reject the changeset.
    fn on_audit(&self, changeset: &mut Changeset) -> Result<Verdict, FilterError>;
}
