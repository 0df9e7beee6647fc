//! Filter-driven processor.

use crate::cache::CycleCache;
use crate::error::ProcessorError;
use crate::AuditProcessor;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use warden_audit_filter::{ChangesetFilter, FieldFilter, Filter, FilterEntry, FilterProvider, TypeFilter, Vote};
use warden_audit_types::{Changeset, ChangesetError, OperationType};
use warden_common_config::{EmptyChangesetPolicy, FilterDefaults};

/// Operation, then entity type, then value.
type ByType<V> = HashMap<OperationType, HashMap<String, V>>;

/// Field verdicts keyed by operation, entity type and field.
type FieldVerdicts<V> = ByType<HashMap<String, V>>;

fn lookup<'a, V>(map: &'a ByType<V>, operation: OperationType, entity_type: &str) -> Option<&'a V> {
    map.get(&operation).and_then(|types| types.get(entity_type))
}

fn lookup_field<V: Copy>(
    map: &FieldVerdicts<V>,
    operation: OperationType,
    entity_type: &str,
    field: &str,
) -> Option<V> {
    lookup(map, operation, entity_type)
        .and_then(|fields| fields.get(field))
        .copied()
}

fn store_field<V>(map: &mut FieldVerdicts<V>, operation: OperationType, entity_type: &str, field: &str, value: V) {
    map.entry(operation)
        .or_default()
        .entry(entity_type.to_string())
        .or_default()
        .insert(field.to_string(), value);
}

/// Processor consulting the filter chains of a [`FilterProvider`].
///
/// Type verdicts are looked up in the cycle cache, then in the L2 cache, then
/// by walking the type filters until one is decisive. A decisive answer is
/// promoted to L2 only when every filter consulted for it is cacheable. L2
/// lives as long as the processor and is shared by every unit of work using
/// it.
pub struct FilteredProcessor {
    provider: Arc<FilterProvider>,
    defaults: FilterDefaults,
    empty_changeset: EmptyChangesetPolicy,
    l2_types: RwLock<ByType<bool>>,
    l2_fields: RwLock<FieldVerdicts<bool>>,
}

impl FilteredProcessor {
    /// Create a processor with the given tie-breaker defaults.
    pub fn new(provider: Arc<FilterProvider>, defaults: FilterDefaults) -> Self {
        Self {
            provider,
            defaults,
            empty_changeset: EmptyChangesetPolicy::default(),
            l2_types: RwLock::new(HashMap::new()),
            l2_fields: RwLock::new(HashMap::new()),
        }
    }

    /// Choose what happens to changesets left without records.
    pub fn with_empty_changeset(mut self, policy: EmptyChangesetPolicy) -> Self {
        self.empty_changeset = policy;
        self
    }

    /// Filters in use.
    pub fn provider(&self) -> &Arc<FilterProvider> {
        &self.provider
    }

    /// L2 type verdict, if cached.
    pub fn cached_type(&self, operation: OperationType, entity_type: &str) -> Option<bool> {
        lookup(&*self.l2_types.read(), operation, entity_type).copied()
    }

    /// L2 field verdict, if cached.
    pub fn cached_field(&self, operation: OperationType, entity_type: &str, field: &str) -> Option<bool> {
        lookup_field(&*self.l2_fields.read(), operation, entity_type, field)
    }

    /// Drop every L2 verdict.
    pub fn clear_cache(&self) {
        self.l2_types.write().clear();
        self.l2_fields.write().clear();
    }

    fn walk_type_filters(
        &self,
        operation: OperationType,
        entity_type: &str,
    ) -> Result<Option<bool>, ProcessorError> {
        // Any non-cacheable filter consulted keeps the answer out of L2.
        let mut cacheable = true;
        for entry in self.provider.type_filters() {
            cacheable &= entry.cacheable;
            let Some(decision) = entry.filter.vote_type(operation, entity_type)?.decision() else {
                continue;
            };

            trace!(
                %operation,
                entity_type,
                decision,
                filter = entry.filter.name(),
                "Type decided"
            );
            if cacheable {
                self.l2_types
                    .write()
                    .entry(operation)
                    .or_default()
                    .insert(entity_type.to_string(), decision);
            }
            return Ok(Some(decision));
        }
        Ok(None)
    }

    fn seal(&self, changeset: &mut Changeset) -> Result<bool, ProcessorError> {
        if changeset.is_sealed() {
            return Err(ChangesetError::AlreadySealed {
                changeset: changeset.id(),
            }
            .into());
        }

        self.filter_fields(changeset)?;

        for entry in self.provider.changeset_filters() {
            if !entry.filter.on_audit(changeset)?.is_accept() {
                debug!(
                    changeset = %changeset.id(),
                    filter = entry.filter.name(),
                    "Changeset rejected"
                );
                return Ok(false);
            }
        }

        if changeset.is_empty() && self.empty_changeset == EmptyChangesetPolicy::Discard {
            debug!(changeset = %changeset.id(), "Discarding empty changeset");
            return Ok(false);
        }

        changeset.seal()?;
        Ok(true)
    }

    /// Drop fields the field filters deny. Skipped entirely when no field
    /// filter is registered.
    fn filter_fields(&self, changeset: &mut Changeset) -> Result<(), ProcessorError> {
        if !self.provider.has_field_filters() {
            return Ok(());
        }

        let filters = self.provider.field_filters();
        let mut cycle: FieldVerdicts<Option<bool>> = HashMap::new();

        for record in changeset.records_mut() {
            let operation = record.operation();
            let entity_type = record.entity_type().to_string();
            let fields: Vec<String> = record.state_change.keys().cloned().collect();

            for field in fields {
                if !self.field_decision(filters, &mut cycle, operation, &entity_type, &field)? {
                    record.state_change.remove(&field);
                }
            }
        }
        Ok(())
    }

    fn field_decision(
        &self,
        filters: &[FilterEntry<dyn FieldFilter>],
        cycle: &mut FieldVerdicts<Option<bool>>,
        operation: OperationType,
        entity_type: &str,
        field: &str,
    ) -> Result<bool, ProcessorError> {
        if let Some(decision) = lookup_field(cycle, operation, entity_type, field) {
            return Ok(decision.unwrap_or(self.defaults.audit_field));
        }
        if let Some(decision) = self.cached_field(operation, entity_type, field) {
            return Ok(decision);
        }

        // Every filter votes; a single deny drops the field.
        let mut approved = false;
        let mut denied = false;
        let mut all_cacheable = true;
        for entry in filters {
            all_cacheable &= entry.cacheable;
            match entry.filter.vote_field(operation, entity_type, field)? {
                Vote::Approve => approved = true,
                Vote::Deny => denied = true,
                Vote::Abstain => {}
            }
        }

        let outcome = if denied {
            Some(false)
        } else if approved {
            Some(true)
        } else {
            None
        };

        store_field(cycle, operation, entity_type, field, outcome);
        if let (Some(decision), true) = (outcome, all_cacheable) {
            store_field(&mut *self.l2_fields.write(), operation, entity_type, field, decision);
        }

        Ok(outcome.unwrap_or(self.defaults.audit_field))
    }
}

impl AuditProcessor for FilteredProcessor {
    fn is_type_auditable(
        &self,
        cycle: &mut CycleCache,
        operation: OperationType,
        entity_type: &str,
    ) -> Result<bool, ProcessorError> {
        if let Some(decision) = cycle.get(operation, entity_type) {
            return Ok(decision.unwrap_or(self.defaults.audit_type));
        }
        if let Some(decision) = self.cached_type(operation, entity_type) {
            return Ok(decision);
        }

        let decision = self.walk_type_filters(operation, entity_type)?;
        cycle.insert(operation, entity_type, decision);
        Ok(decision.unwrap_or(self.defaults.audit_type))
    }

    fn seal_changeset(
        &self,
        cycle: &mut CycleCache,
        changeset: &mut Changeset,
    ) -> Result<bool, ProcessorError> {
        let sealed = self.seal(changeset);
        cycle.clear();
        sealed
    }
}
