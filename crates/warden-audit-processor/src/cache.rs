//! Per-cycle verdict cache.

use std::collections::HashMap;
use warden_audit_types::OperationType;

/// Type verdicts valid for one unit-of-work cycle.
///
/// Stores the outcome of each filter walk, including "no opinion", which is
/// answered with the configured default without walking the filters again.
#[derive(Debug, Clone, Default)]
pub struct CycleCache {
    types: HashMap<OperationType, HashMap<String, Option<bool>>>,
}

impl CycleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached walk outcome: `None` when not cached, `Some(None)` when the
    /// filters had no opinion.
    pub fn get(&self, operation: OperationType, entity_type: &str) -> Option<Option<bool>> {
        self.types
            .get(&operation)
            .and_then(|types| types.get(entity_type))
            .copied()
    }

    /// Store a walk outcome.
    pub fn insert(&mut self, operation: OperationType, entity_type: &str, decision: Option<bool>) {
        self.types
            .entry(operation)
            .or_default()
            .insert(entity_type.to_string(), decision);
    }

    /// Add entries from another cache, keeping existing ones.
    pub fn absorb(&mut self, other: CycleCache) {
        for (operation, types) in other.types {
            let target = self.types.entry(operation).or_default();
            for (entity_type, decision) in types {
                target.entry(entity_type).or_insert(decision);
            }
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.types.clear();
    }

    /// Number of cached verdicts.
    pub fn len(&self) -> usize {
        self.types.values().map(HashMap::len).sum()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_distinguishes_missing_from_no_opinion() {
        let mut cache = CycleCache::new();
        assert_eq!(cache.get(OperationType::Create, "Invoice"), None);

        cache.insert(OperationType::Create, "Invoice", None);
        assert_eq!(cache.get(OperationType::Create, "Invoice"), Some(None));
        assert_eq!(cache.get(OperationType::Update, "Invoice"), None);
    }

    #[test]
    fn test_absorb_keeps_existing() {
        let mut cache = CycleCache::new();
        cache.insert(OperationType::Read, "Invoice", Some(true));

        let mut other = CycleCache::new();
        other.insert(OperationType::Read, "Invoice", Some(false));
        other.insert(OperationType::Read, "Customer", Some(false));
        cache.absorb(other);

        assert_eq!(cache.get(OperationType::Read, "Invoice"), Some(Some(true)));
        assert_eq!(cache.get(OperationType::Read, "Customer"), Some(Some(false)));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    proptest! {
        #[test]
        fn test_len_counts_distinct_keys(
            entries in prop::collection::vec((0usize..3, "[A-C]", any::<Option<bool>>()), 0..20)
        ) {
            let operations = [OperationType::Create, OperationType::Read, OperationType::Delete];
            let mut cache = CycleCache::new();
            let mut keys = HashSet::new();
            for (op, entity_type, decision) in &entries {
                cache.insert(operations[*op], entity_type, *decision);
                keys.insert((*op, entity_type.clone()));
            }
            prop_assert_eq!(cache.len(), keys.len());
        }
    }
}
