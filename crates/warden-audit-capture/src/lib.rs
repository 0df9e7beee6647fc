//! Change capture for Warden.
//!
//! [`UnitOfWork`] is what producers talk to: they report entity changes as
//! they happen and flush at the end of the transaction. [`PipelineBuilder`]
//! wires a unit of work from configuration.

mod error;
mod factory;
mod pipeline;
mod unit;

pub use error::{FlushError, PipelineError};
pub use factory::{
    ChangesetContext, ChangesetFactory, ContextChangesetFactory, SystemChangesetFactory,
};
pub use pipeline::PipelineBuilder;
pub use unit::{ChangesetGuard, RecordGuard, UnitOfWork};
