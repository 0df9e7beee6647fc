//! Processor errors.

use thiserror::Error;
use warden_audit_filter::FilterError;
use warden_audit_types::ChangesetError;

/// Error while deciding on a changeset.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("changeset error: {0}")]
    Changeset(#[from] ChangesetError),
}
