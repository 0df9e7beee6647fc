//! JSON Lines sink.

use crate::row::AuditRow;
use crate::{AuditSink, SinkError};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;
use warden_audit_types::Changeset;

/// Writes one JSON-encoded [`AuditRow`] per line.
///
/// The writer is flushed after every changeset.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Append to the file at `path`, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), "Opened audit log");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Write rows to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> AuditSink for JsonLinesSink<W> {
    fn name(&self) -> &str {
        "json_lines"
    }

    fn commit_audit(&self, changeset: &Changeset) -> Result<(), SinkError> {
        let rows = AuditRow::from_changeset(changeset)?;
        let mut writer = self.writer.lock();
        for row in &rows {
            serde_json::to_writer(&mut *writer, row)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}
