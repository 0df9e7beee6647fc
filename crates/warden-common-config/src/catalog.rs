//! Known entity types and their fields.

use std::collections::{BTreeMap, BTreeSet};

/// Catalog of auditable types used to catch typos in filter lists.
///
/// Validation only consults the catalog when one is supplied to the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCatalog {
    types: BTreeMap<String, BTreeSet<String>>,
}

impl TypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type with its fields.
    pub fn with_type<I, S>(mut self, type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(type_name, fields);
        self
    }

    /// Register a type with its fields, merging with any earlier entry.
    pub fn register<I, S>(&mut self, type_name: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types
            .entry(type_name.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
    }

    /// Whether the type is known.
    pub fn contains_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Whether the field is known for the type.
    pub fn contains_field(&self, type_name: &str, field: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|fields| fields.contains(field))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
