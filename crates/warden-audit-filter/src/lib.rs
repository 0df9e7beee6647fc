//! Audit filters for Warden.
//!
//! Filters vote on whether a type, a field, or a whole changeset is audited.
//! Type and field filters answer with a three-valued [`Vote`]; changeset
//! filters accept or reject with a [`Verdict`]. The [`FilterProvider`] hands
//! the processor each chain ordered by priority.

mod config;
mod error;
mod filter;
mod index;
mod match_field;
mod match_type;
mod pause;
mod provider;
mod vote;

pub use config::{EXCLUDE_PRIORITY, INCLUDE_PRIORITY, ONLY_PRIORITY};
pub use error::{FilterError, IndexError};
pub use filter::{ChangesetFilter, FieldFilter, Filter, TypeFilter};
pub use index::{FieldIndex, TypeIndex};
pub use match_field::MatchFieldFilter;
pub use match_type::{MatchPolicy, MatchTypeFilter};
pub use pause::PauseFilter;
pub use provider::{FilterEntry, FilterProvider, FilterProviderBuilder};
pub use vote::{Verdict, Vote};
