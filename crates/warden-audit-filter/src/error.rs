//! Filter errors.

use thiserror::Error;
use warden_audit_types::ChangesetError;

/// Error raised by a filter while voting.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter {filter} failed: {message}")]
    Failed { filter: String, message: String },

    #[error(transparent)]
    Changeset(#[from] ChangesetError),

    #[error(transparent)]
    Other(#[from] warden_common_core::Error),
}

impl FilterError {
    /// Create a failure attributed to a filter.
    pub fn failed(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

/// Error compiling a match list into a lookup index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("an entry needs a type, at least one field, or both")]
    EmptyEntry,

    #[error("empty type name in type list")]
    EmptyTypeName,

    #[error("empty field name listed for type \"{type_name}\"")]
    EmptyFieldName { type_name: String },
}
