//! Unit of work: accumulates one transaction's changes and flushes them.

use crate::error::FlushError;
use crate::factory::ChangesetFactory;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use warden_audit_processor::{AuditProcessor, CycleCache, ProcessorError};
use warden_audit_sink::AuditSink;
use warden_audit_types::{Auditable, Changeset, EntityHandle, EntityRecord, OperationType, Timestamp};

/// Exclusive access to a record of the open changeset.
///
/// The unit of work stays locked while the guard lives; drop it before
/// notifying, flushing or resetting again.
pub type RecordGuard<'a> = MappedMutexGuard<'a, EntityRecord>;

/// Read access to the open changeset. Same locking rule as [`RecordGuard`].
pub type ChangesetGuard<'a> = MappedMutexGuard<'a, Changeset>;

#[derive(Default)]
struct State {
    changeset: Option<Changeset>,
    cycle: CycleCache,
    /// Bumped whenever the cycle ends, so stale cache entries computed
    /// outside the lock are not merged into the next cycle.
    generation: u64,
    flushing: bool,
}

impl State {
    fn end_cycle(&mut self) {
        self.changeset = None;
        self.cycle.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Owns the open changeset of a logical transaction.
///
/// Producers report changes through the `on_*` methods and call
/// [`flush`](Self::flush) at the transaction boundary. The internal lock is
/// never held while the processor or the sink runs, so a sink may call back
/// into the unit of work: such notifications are dropped and return `None`.
pub struct UnitOfWork {
    processor: Arc<dyn AuditProcessor>,
    sink: Arc<dyn AuditSink>,
    factory: Arc<dyn ChangesetFactory>,
    state: Mutex<State>,
    next_handle: AtomicU64,
}

impl UnitOfWork {
    /// Unit of work routing changes through `processor` into `sink`.
    pub fn new(
        processor: Arc<dyn AuditProcessor>,
        sink: Arc<dyn AuditSink>,
        factory: Arc<dyn ChangesetFactory>,
    ) -> Self {
        Self {
            processor,
            sink,
            factory,
            state: Mutex::new(State::default()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Allocate a handle for an entity tracked by this unit of work.
    pub fn allocate_handle(&self) -> EntityHandle {
        EntityHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Report an insert.
    pub fn on_create<E: Auditable + ?Sized>(
        &self,
        entity: &E,
        entity_type: &str,
    ) -> Result<Option<RecordGuard<'_>>, ProcessorError> {
        self.notify(OperationType::Create, entity, entity_type)
    }

    /// Report a load.
    pub fn on_read<E: Auditable + ?Sized>(
        &self,
        entity: &E,
        entity_type: &str,
    ) -> Result<Option<RecordGuard<'_>>, ProcessorError> {
        self.notify(OperationType::Read, entity, entity_type)
    }

    /// Report an update.
    pub fn on_update<E: Auditable + ?Sized>(
        &self,
        entity: &E,
        entity_type: &str,
    ) -> Result<Option<RecordGuard<'_>>, ProcessorError> {
        self.notify(OperationType::Update, entity, entity_type)
    }

    /// Report a delete.
    pub fn on_delete<E: Auditable + ?Sized>(
        &self,
        entity: &E,
        entity_type: &str,
    ) -> Result<Option<RecordGuard<'_>>, ProcessorError> {
        self.notify(OperationType::Delete, entity, entity_type)
    }

    /// Report a change. Returns the record to fill in, or `None` when the
    /// type is not audited for `operation` or a flush is in progress.
    pub fn notify<E: Auditable + ?Sized>(
        &self,
        operation: OperationType,
        entity: &E,
        entity_type: &str,
    ) -> Result<Option<RecordGuard<'_>>, ProcessorError> {
        let (mut cycle, generation) = {
            let mut state = self.state.lock();
            if state.flushing {
                debug!(%operation, entity_type, "Dropping notification during flush");
                return Ok(None);
            }
            (std::mem::take(&mut state.cycle), state.generation)
        };

        let auditable = self.processor.is_type_auditable(&mut cycle, operation, entity_type);

        let mut state = self.state.lock();
        if state.generation == generation {
            state.cycle.absorb(cycle);
        }
        if !auditable? || state.flushing {
            return Ok(None);
        }

        let handle = entity.handle();
        let entity_time = entity.audit_timestamp();
        let changeset = state.changeset.get_or_insert_with(|| {
            let changeset = self.factory.create_changeset();
            debug!(changeset = %changeset.id(), "Opened changeset");
            changeset
        });

        match changeset.record_mut(operation, handle) {
            Some(record) => {
                record.touch(entity_time);
                if record.id.is_none() {
                    record.id = entity.entity_id();
                }
            }
            None => {
                changeset.create_record(
                    operation,
                    handle,
                    entity_type,
                    entity.entity_id(),
                    entity_time.unwrap_or_else(Timestamp::now),
                )?;
            }
        }

        Ok(MutexGuard::try_map(state, |state| {
            state.changeset.as_mut()?.record_mut(operation, handle)
        })
        .ok())
    }

    /// The open changeset, if any.
    pub fn changeset(&self) -> Option<ChangesetGuard<'_>> {
        MutexGuard::try_map(self.state.lock(), |state| state.changeset.as_mut()).ok()
    }

    /// Whether a changeset is open.
    pub fn has_changeset(&self) -> bool {
        self.state.lock().changeset.is_some()
    }

    /// Whether a flush is running.
    pub fn is_flushing(&self) -> bool {
        self.state.lock().flushing
    }

    /// Seal and deliver the open changeset.
    ///
    /// Returns whether a changeset reached the sink. The unit of work is
    /// idle afterwards whatever the outcome. Calls made while a flush is
    /// already running return `Ok(false)`.
    pub fn flush(&self) -> Result<bool, FlushError> {
        let (mut changeset, mut cycle) = {
            let mut state = self.state.lock();
            if state.flushing {
                debug!("Ignoring nested flush");
                return Ok(false);
            }
            let Some(changeset) = state.changeset.take() else {
                return Ok(false);
            };
            state.flushing = true;
            (changeset, std::mem::take(&mut state.cycle))
        };

        let _cycle = CycleEnd(&self.state);
        self.deliver(&mut cycle, &mut changeset)
    }

    fn deliver(&self, cycle: &mut CycleCache, changeset: &mut Changeset) -> Result<bool, FlushError> {
        changeset.stamp(Timestamp::now());

        if !self.processor.seal_changeset(cycle, changeset)? {
            debug!(changeset = %changeset.id(), "Changeset discarded");
            return Ok(false);
        }

        self.sink.commit_audit(changeset)?;
        info!(
            changeset = %changeset.id(),
            records = changeset.len(),
            sink = self.sink.name(),
            "Changeset delivered"
        );
        Ok(true)
    }

    /// Discard the open changeset without delivering it.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if let Some(changeset) = &state.changeset {
            debug!(changeset = %changeset.id(), records = changeset.len(), "Changeset reset");
        }
        state.end_cycle();
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("UnitOfWork")
            .field("changeset", &state.changeset.as_ref().map(|c| c.id()))
            .field("flushing", &state.flushing)
            .field("sink", &self.sink.name())
            .finish_non_exhaustive()
    }
}

/// Returns the unit of work to idle when a flush ends, including by panic.
struct CycleEnd<'a>(&'a Mutex<State>);

impl Drop for CycleEnd<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.flushing = false;
        state.end_cycle();
    }
}
