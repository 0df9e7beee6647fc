//! Sink emitting audit rows as structured log events.

use crate::row::AuditRow;
use crate::{AuditSink, SinkError};
use tracing::info;
use warden_audit_types::Changeset;

/// Logs one INFO event per row with `event_type = "audit"`.
///
/// State sides are JSON-encoded so log aggregators can index them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AuditSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn commit_audit(&self, changeset: &Changeset) -> Result<(), SinkError> {
        for row in AuditRow::from_changeset(changeset)? {
            let old_state = row.old_state.as_ref().map(serde_json::to_string).transpose()?;
            let new_state = row.new_state.as_ref().map(serde_json::to_string).transpose()?;
            let author = row.author.as_ref().map(ToString::to_string);
            let impersonator = row.impersonator.as_ref().map(ToString::to_string);
            info!(
                event_type = "audit",
                row = %row.id,
                changeset = %row.changeset_id,
                operation = %row.operation,
                entity_type = %row.entity_type,
                entity_id = row.entity_id.as_deref(),
                author = author.as_deref(),
                impersonator = impersonator.as_deref(),
                source = row.action.get("source").and_then(|v| v.as_str()),
                old_state = old_state.as_deref(),
                new_state = new_state.as_deref(),
                "audit"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_audit_types::{EntityHandle, FieldChange, OperationType, Timestamp, Trigger};

    #[test]
    fn test_logs_sealed_changeset() {
        let mut changeset = Changeset::new(Trigger::Opaque);
        changeset
            .create_record(OperationType::Update, EntityHandle::from_raw(1), "Invoice", None, Timestamp::now())
            .unwrap()
            .set_change("total", FieldChange::new(1, 2));
        changeset.seal().unwrap();

        assert!(LogSink.commit_audit(&changeset).is_ok());
    }

    #[test]
    fn test_refuses_unsealed_changeset() {
        let changeset = Changeset::new(Trigger::Opaque);
        assert!(matches!(
            LogSink.commit_audit(&changeset),
            Err(SinkError::Unsealed { .. })
        ));
    }
}
