//! List-driven field filter.

use crate::error::FilterError;
use crate::filter::{FieldFilter, Filter};
use crate::index::FieldIndex;
use crate::match_type::MatchPolicy;
use crate::vote::Vote;
use warden_audit_types::OperationType;

/// Votes on fields found in a [`FieldIndex`]. Always cacheable.
#[derive(Debug, Clone)]
pub struct MatchFieldFilter {
    name: String,
    index: FieldIndex,
    policy: MatchPolicy,
}

impl MatchFieldFilter {
    /// Create a filter over a compiled index.
    pub fn new(name: impl Into<String>, policy: MatchPolicy, index: FieldIndex) -> Self {
        Self {
            name: name.into(),
            index,
            policy,
        }
    }
}

impl Filter for MatchFieldFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn cacheable(&self) -> bool {
        true
    }
}

impl FieldFilter for MatchFieldFilter {
    fn vote_field(
        &self,
        _operation: OperationType,
        entity_type: &str,
        field: &str,
    ) -> Result<Vote, FilterError> {
        Ok(self.policy.vote(self.index.matches(entity_type, field)))
    }
}
