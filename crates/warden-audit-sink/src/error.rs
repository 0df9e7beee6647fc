//! Sink errors.

use thiserror::Error;
use warden_audit_types::ChangesetId;

/// Error delivering a changeset.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("changeset {changeset} was not sealed")]
    Unsealed { changeset: ChangesetId },

    #[error("sink {sink} failed: {message}")]
    Failed { sink: String, message: String },

    #[error(transparent)]
    Other(#[from] warden_common_core::Error),
}

impl SinkError {
    /// Create a failure attributed to a sink.
    pub fn failed(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            sink: sink.into(),
            message: message.into(),
        }
    }
}
