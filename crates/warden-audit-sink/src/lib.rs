//! Delivery of sealed changesets.
//!
//! A sink is the last step of a flush. It receives a shared reference to a
//! sealed [`Changeset`] and persists or forwards it. Sinks are synchronous;
//! an error aborts the flush and reaches the caller of `flush()`.

mod chain;
mod error;
mod json_lines;
mod log;
mod memory;
mod row;

pub use chain::ChainSink;
pub use error::SinkError;
pub use json_lines::JsonLinesSink;
pub use log::LogSink;
pub use memory::MemorySink;
pub use row::{AuditRow, StateSnapshot};

use warden_audit_types::Changeset;

/// Terminal delivery target for a sealed changeset.
pub trait AuditSink: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Deliver a sealed changeset.
    fn commit_audit(&self, changeset: &Changeset) -> Result<(), SinkError>;
}

impl<S: AuditSink + ?Sized> AuditSink for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn commit_audit(&self, changeset: &Changeset) -> Result<(), SinkError> {
        (**self).commit_audit(changeset)
    }
}
