//! Filter answers.

use strum::Display;

/// Answer of a type or field filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Vote {
    /// Audit it.
    Approve,
    /// Do not audit it.
    Deny,
    /// No opinion; defer to the next filter.
    Abstain,
}

impl Vote {
    /// The decision carried by the vote, `None` for abstain.
    pub fn decision(self) -> Option<bool> {
        match self {
            Self::Approve => Some(true),
            Self::Deny => Some(false),
            Self::Abstain => None,
        }
    }
}

impl From<bool> for Vote {
    fn from(audit: bool) -> Self {
        if audit {
            Self::Approve
        } else {
            Self::Deny
        }
    }
}

impl From<Option<bool>> for Vote {
    fn from(decision: Option<bool>) -> Self {
        decision.map_or(Self::Abstain, Self::from)
    }
}

/// Answer of a changeset filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Verdict {
    /// Keep the changeset.
    Accept,
    /// Discard the changeset.
    Reject,
}

impl Verdict {
    /// Whether the changeset is kept.
    pub fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl From<bool> for Verdict {
    fn from(accept: bool) -> Self {
        if accept {
            Self::Accept
        } else {
            Self::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Vote::from(Some(true)), Vote::Approve);
        assert_eq!(Vote::from(None), Vote::Abstain);
        assert_eq!(Vote::Deny.decision(), Some(false));
        assert!(!Verdict::from(false).is_accept());
        assert_eq!(Vote::Abstain.to_string(), "abstain");
    }

    fn vote() -> impl Strategy<Value = Vote> {
        prop_oneof![Just(Vote::Approve), Just(Vote::Deny), Just(Vote::Abstain)]
    }

    proptest! {
        #[test]
        fn test_abstains_never_change_first_decision(
            votes in proptest::collection::vec(vote(), 0..20),
            at in 0usize..20,
        ) {
            let first = |votes: &[Vote]| votes.iter().find_map(|v| v.decision());
            let mut padded = votes.clone();
            padded.insert(at.min(votes.len()), Vote::Abstain);
            prop_assert_eq!(first(votes.as_slice()), first(padded.as_slice()));
        }
    }
}
