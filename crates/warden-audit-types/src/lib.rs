//! Changeset and record types for Warden.
//!
//! A [`Changeset`] collects every [`EntityRecord`] produced within one
//! logical transaction, keyed by operation and [`EntityHandle`]. It is sealed
//! exactly once before sinks see it.

mod changeset;
mod entity;
mod operation;
mod record;
mod trigger;
mod user;

pub use changeset::{Changeset, ChangesetError, RecordKey};
pub use entity::{Auditable, EntityHandle, EntityId};
pub use operation::OperationType;
pub use record::{EntityRecord, FieldChange, InternalState, StateChange};
pub use trigger::{Trigger, TriggerContext};
pub use user::User;

pub use warden_common_core::{ChangesetId, Timestamp};
