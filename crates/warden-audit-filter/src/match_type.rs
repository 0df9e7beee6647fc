//! List-driven type filter.

use crate::error::FilterError;
use crate::filter::{Filter, TypeFilter};
use crate::index::TypeIndex;
use crate::vote::Vote;
use warden_audit_types::OperationType;

/// How a match filter votes on listed and unlisted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Approve listed, deny everything else.
    OnlyInclude,
    /// Deny listed, approve everything else.
    OnlyExclude,
    /// Approve listed, abstain otherwise.
    Include,
    /// Deny listed, abstain otherwise.
    Exclude,
}

impl MatchPolicy {
    /// Votes as `(on_match, on_non_match)`.
    pub fn votes(self) -> (Vote, Vote) {
        match self {
            Self::OnlyInclude => (Vote::Approve, Vote::Deny),
            Self::OnlyExclude => (Vote::Deny, Vote::Approve),
            Self::Include => (Vote::Approve, Vote::Abstain),
            Self::Exclude => (Vote::Deny, Vote::Abstain),
        }
    }

    /// Vote for a lookup result.
    pub fn vote(self, matched: bool) -> Vote {
        let (on_match, on_non_match) = self.votes();
        if matched {
            on_match
        } else {
            on_non_match
        }
    }
}

/// Votes on entity types found in a [`TypeIndex`]. Always cacheable.
#[derive(Debug, Clone)]
pub struct MatchTypeFilter {
    name: String,
    index: TypeIndex,
    policy: MatchPolicy,
}

impl MatchTypeFilter {
    /// Create a filter over a compiled index.
    pub fn new(name: impl Into<String>, policy: MatchPolicy, index: TypeIndex) -> Self {
        Self {
            name: name.into(),
            index,
            policy,
        }
    }
}

impl Filter for MatchTypeFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn cacheable(&self) -> bool {
        true
    }
}

impl TypeFilter for MatchTypeFilter {
    fn vote_type(&self, _operation: OperationType, entity_type: &str) -> Result<Vote, FilterError> {
        Ok(self.policy.vote(self.index.contains(entity_type)))
    }
}
