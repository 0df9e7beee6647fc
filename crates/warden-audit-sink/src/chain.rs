//! Fan-out to several sinks.

use crate::{AuditSink, SinkError};
use tracing::error;
use warden_audit_types::Changeset;

/// Commits to each sink in order, stopping at the first failure.
#[derive(Default)]
pub struct ChainSink {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl ChainSink {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink.
    pub fn with<S: AuditSink + 'static>(mut self, sink: S) -> Self {
        self.push(sink);
        self
    }

    /// Append a sink.
    pub fn push<S: AuditSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    /// Number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are chained.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Extend<Box<dyn AuditSink>> for ChainSink {
    fn extend<I: IntoIterator<Item = Box<dyn AuditSink>>>(&mut self, sinks: I) {
        self.sinks.extend(sinks);
    }
}

impl AuditSink for ChainSink {
    fn name(&self) -> &str {
        "chain"
    }

    fn commit_audit(&self, changeset: &Changeset) -> Result<(), SinkError> {
        for sink in &self.sinks {
            if let Err(e) = sink.commit_audit(changeset) {
                error!(
                    sink = sink.name(),
                    changeset = %changeset.id(),
                    error = %e,
                    "Sink failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChainSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|sink| sink.name()))
            .finish()
    }
}
