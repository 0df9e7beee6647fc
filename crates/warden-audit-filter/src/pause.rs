//! Temporarily stop auditing.

use crate::error::FilterError;
use crate::filter::{ChangesetFilter, Filter, TypeFilter};
use crate::vote::{Verdict, Vote};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::warn;
use warden_audit_types::{Changeset, OperationType};

/// Suspends auditing while paused.
///
/// Register the same instance as a type filter and a changeset filter,
/// ideally at the highest priority. While paused every type vote is a deny
/// and is counted, and the next changeset is rejected with a warning naming
/// how many notifications were missed. Not cacheable.
#[derive(Debug, Default)]
pub struct PauseFilter {
    paused: AtomicBool,
    captures: AtomicUsize,
    reason: Mutex<Option<String>>,
}

impl PauseFilter {
    /// Create an active (not paused) filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop auditing until [`resume`](Self::resume) is called.
    pub fn pause(&self, reason: Option<&str>) {
        *self.reason.lock() = reason.map(str::to_string);
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume auditing and reset the missed-notification counter.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.captures.store(0, Ordering::SeqCst);
        *self.reason.lock() = None;
    }

    /// Whether auditing is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Notifications denied since the pause or the last rejected changeset.
    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl Filter for PauseFilter {
    fn name(&self) -> &str {
        "pause"
    }
}

impl TypeFilter for PauseFilter {
    fn vote_type(&self, _operation: OperationType, _entity_type: &str) -> Result<Vote, FilterError> {
        if !self.is_paused() {
            return Ok(Vote::Abstain);
        }
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(Vote::Deny)
    }
}

impl ChangesetFilter for PauseFilter {
    fn on_audit(&self, changeset: &mut Changeset) -> Result<Verdict, FilterError> {
        if !self.is_paused() {
            return Ok(Verdict::Accept);
        }

        let missed = self.captures.swap(0, Ordering::SeqCst);
        if missed > 0 {
            let reason = self.reason.lock().clone();
            warn!(
                changeset = %changeset.id(),
                missed,
                reason = reason.as_deref().unwrap_or("no reason specified"),
                "Audit is paused, discarding changeset"
            );
        }
        Ok(Verdict::Reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_audit_types::Trigger;

    #[test]
    fn test_active_filter_is_transparent() {
        let filter = PauseFilter::new();
        assert_eq!(filter.vote_type(OperationType::Create, "Invoice").unwrap(), Vote::Abstain);
        assert_eq!(filter.captures(), 0);

        let mut changeset = Changeset::new(Trigger::Opaque);
        assert_eq!(filter.on_audit(&mut changeset).unwrap(), Verdict::Accept);
    }

    #[test]
    fn test_paused_filter_denies_and_counts() {
        let filter = PauseFilter::new();
        filter.pause(Some("bulk import"));

        assert_eq!(filter.vote_type(OperationType::Create, "Invoice").unwrap(), Vote::Deny);
        assert_eq!(filter.vote_type(OperationType::Update, "Invoice").unwrap(), Vote::Deny);
        assert_eq!(filter.captures(), 2);

        let mut changeset = Changeset::new(Trigger::Opaque);
        assert_eq!(filter.on_audit(&mut changeset).unwrap(), Verdict::Reject);
        assert_eq!(filter.captures(), 0);
    }

    #[test]
    fn test_resume_resets() {
        let filter = PauseFilter::new();
        filter.pause(None);
        filter.vote_type(OperationType::Read, "Invoice").unwrap();
        filter.resume();

        assert!(!filter.is_paused());
        assert_eq!(filter.captures(), 0);
        assert!(!filter.cacheable());
    }
}
