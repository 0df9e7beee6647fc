//! Filters with scripted answers that count their calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use warden_audit_filter::{
    ChangesetFilter, FieldFilter, Filter, FilterError, TypeFilter, Verdict, Vote,
};
use warden_audit_types::{Changeset, OperationType};

type TypeScript = Box<dyn Fn(OperationType, &str) -> Vote + Send + Sync>;
type FieldScript = Box<dyn Fn(OperationType, &str, &str) -> Vote + Send + Sync>;
type ChangesetScript = Box<dyn Fn(&mut Changeset) -> Verdict + Send + Sync>;

/// Type filter answering from a closure.
pub struct ScriptedTypeFilter {
    name: String,
    cacheable: bool,
    calls: AtomicUsize,
    script: TypeScript,
}

impl ScriptedTypeFilter {
    /// Filter voting with `script`.
    pub fn new<F>(name: &str, script: F) -> Self
    where
        F: Fn(OperationType, &str) -> Vote + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            cacheable: false,
            calls: AtomicUsize::new(0),
            script: Box::new(script),
        }
    }

    /// Filter always voting `vote`.
    pub fn constant(name: &str, vote: Vote) -> Self {
        Self::new(name, move |_, _| vote)
    }

    /// Declare the filter cacheable.
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Number of votes cast.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Filter for ScriptedTypeFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn cacheable(&self) -> bool {
        self.cacheable
    }
}

impl TypeFilter for ScriptedTypeFilter {
    fn vote_type(&self, operation: OperationType, entity_type: &str) -> Result<Vote, FilterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.script)(operation, entity_type))
    }
}

/// Field filter answering from a closure.
pub struct ScriptedFieldFilter {
    name: String,
    cacheable: bool,
    calls: AtomicUsize,
    script: FieldScript,
}

impl ScriptedFieldFilter {
    /// Filter voting with `script`.
    pub fn new<F>(name: &str, script: F) -> Self
    where
        F: Fn(OperationType, &str, &str) -> Vote + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            cacheable: false,
            calls: AtomicUsize::new(0),
            script: Box::new(script),
        }
    }

    /// Filter voting `vote` on `field` and abstaining on every other field.
    pub fn on_field(name: &str, field: &'static str, vote: Vote) -> Self {
        Self::new(name, move |_, _, f| if f == field { vote } else { Vote::Abstain })
    }

    /// Declare the filter cacheable.
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Number of votes cast.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Filter for ScriptedFieldFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn cacheable(&self) -> bool {
        self.cacheable
    }
}

impl FieldFilter for ScriptedFieldFilter {
    fn vote_field(
        &self,
        operation: OperationType,
        entity_type: &str,
        field: &str,
    ) -> Result<Vote, FilterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.script)(operation, entity_type, field))
    }
}

/// Changeset filter answering from a closure.
pub struct ScriptedChangesetFilter {
    name: String,
    calls: AtomicUsize,
    script: ChangesetScript,
}

impl ScriptedChangesetFilter {
    /// Filter deciding with `script`.
    pub fn new<F>(name: &str, script: F) -> Self
    where
        F: Fn(&mut Changeset) -> Verdict + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            script: Box::new(script),
        }
    }

    /// Filter always answering `verdict`.
    pub fn constant(name: &str, verdict: Verdict) -> Self {
        Self::new(name, move |_| verdict)
    }

    /// Number of changesets seen.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Filter for ScriptedChangesetFilter {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ChangesetFilter for ScriptedChangesetFilter {
    fn on_audit(&self, changeset: &mut Changeset) -> Result<Verdict, FilterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.script)(changeset))
    }
}

/// Filter failing on every call.
#[derive(Debug, Default)]
pub struct FailingFilter;

impl Filter for FailingFilter {
    fn name(&self) -> &str {
        "failing"
    }
}

impl TypeFilter for FailingFilter {
    fn vote_type(&self, _: OperationType, _: &str) -> Result<Vote, FilterError> {
        Err(FilterError::failed("failing", "type vote"))
    }
}

impl FieldFilter for FailingFilter {
    fn vote_field(&self, _: OperationType, _: &str, _: &str) -> Result<Vote, FilterError> {
        Err(FilterError::failed("failing", "field vote"))
    }
}

impl ChangesetFilter for FailingFilter {
    fn on_audit(&self, _: &mut Changeset) -> Result<Verdict, FilterError> {
        Err(FilterError::failed("failing", "changeset vote"))
    }
}
