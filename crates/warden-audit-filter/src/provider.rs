//! Ordered, lazily materialised filter chains.

use crate::filter::{ChangesetFilter, FieldFilter, Filter, TypeFilter};
use std::cmp::Reverse;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

type Factory<T> = Box<dyn Fn() -> Arc<T> + Send + Sync>;

enum Slot<T: ?Sized> {
    Ready(Arc<T>),
    Lazy(Factory<T>),
}

struct Registration<T: ?Sized> {
    priority: i32,
    slot: Slot<T>,
}

/// A materialised filter with its classification.
pub struct FilterEntry<T: ?Sized> {
    /// The filter.
    pub filter: Arc<T>,
    /// Priority it was registered with.
    pub priority: i32,
    /// Whether its decisive answers may be cached indefinitely.
    pub cacheable: bool,
}

impl<T: ?Sized> fmt::Debug for FilterEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEntry")
            .field("priority", &self.priority)
            .field("cacheable", &self.cacheable)
            .finish_non_exhaustive()
    }
}

/// One filter chain: registrations sorted by priority, materialised once.
struct Chain<T: ?Sized> {
    registrations: Vec<Registration<T>>,
    materialized: OnceLock<Vec<FilterEntry<T>>>,
}

impl<T: ?Sized + Filter> Chain<T> {
    fn new(mut registrations: Vec<Registration<T>>) -> Self {
        // Stable: equal priorities keep registration order.
        registrations.sort_by_key(|r| Reverse(r.priority));
        Self {
            registrations,
            materialized: OnceLock::new(),
        }
    }

    fn entries(&self, kind: &'static str) -> &[FilterEntry<T>] {
        self.materialized.get_or_init(|| {
            let entries: Vec<FilterEntry<T>> = self
                .registrations
                .iter()
                .map(|registration| {
                    let filter = match &registration.slot {
                        Slot::Ready(filter) => Arc::clone(filter),
                        Slot::Lazy(factory) => factory(),
                    };
                    FilterEntry {
                        cacheable: filter.cacheable(),
                        priority: registration.priority,
                        filter,
                    }
                })
                .collect();
            debug!(
                kind,
                filters = entries.len(),
                cacheable = entries.iter().filter(|e| e.cacheable).count(),
                "Materialized filter chain"
            );
            entries
        })
    }

    fn len(&self) -> usize {
        self.registrations.len()
    }

    fn is_materialized(&self) -> bool {
        self.materialized.get().is_some()
    }
}

/// Provides the type, field and changeset filter chains of a pipeline.
///
/// Each chain is ordered highest priority first and built on first use,
/// exactly once. Lazy registrations are not constructed before then.
pub struct FilterProvider {
    types: Chain<dyn TypeFilter>,
    fields: Chain<dyn FieldFilter>,
    changesets: Chain<dyn ChangesetFilter>,
}

impl FilterProvider {
    /// Start building a provider.
    pub fn builder() -> FilterProviderBuilder {
        FilterProviderBuilder::default()
    }

    /// An empty provider: every decision falls to the defaults.
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Type filters, highest priority first.
    pub fn type_filters(&self) -> &[FilterEntry<dyn TypeFilter>] {
        self.types.entries("type")
    }

    /// Field filters, highest priority first.
    pub fn field_filters(&self) -> &[FilterEntry<dyn FieldFilter>] {
        self.fields.entries("field")
    }

    /// Changeset filters, highest priority first.
    pub fn changeset_filters(&self) -> &[FilterEntry<dyn ChangesetFilter>] {
        self.changesets.entries("changeset")
    }

    /// Whether any field filter is registered. Does not materialise anything.
    pub fn has_field_filters(&self) -> bool {
        self.fields.len() > 0
    }

    /// Whether the field chain has been built.
    pub fn field_filters_materialized(&self) -> bool {
        self.fields.is_materialized()
    }
}

impl fmt::Debug for FilterProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterProvider")
            .field("type_filters", &self.types.len())
            .field("field_filters", &self.fields.len())
            .field("changeset_filters", &self.changesets.len())
            .finish()
    }
}

/// Builder for [`FilterProvider`].
#[derive(Default)]
pub struct FilterProviderBuilder {
    types: Vec<Registration<dyn TypeFilter>>,
    fields: Vec<Registration<dyn FieldFilter>>,
    changesets: Vec<Registration<dyn ChangesetFilter>>,
}

impl FilterProviderBuilder {
    /// Register a type filter.
    pub fn type_filter(mut self, filter: Arc<dyn TypeFilter>, priority: i32) -> Self {
        self.types.push(Registration {
            priority,
            slot: Slot::Ready(filter),
        });
        self
    }

    /// Register a type filter built on first use.
    pub fn lazy_type_filter<F>(mut self, priority: i32, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn TypeFilter> + Send + Sync + 'static,
    {
        self.types.push(Registration {
            priority,
            slot: Slot::Lazy(Box::new(factory)),
        });
        self
    }

    /// Register a field filter.
    pub fn field_filter(mut self, filter: Arc<dyn FieldFilter>, priority: i32) -> Self {
        self.fields.push(Registration {
            priority,
            slot: Slot::Ready(filter),
        });
        self
    }

    /// Register a field filter built on first use.
    pub fn lazy_field_filter<F>(mut self, priority: i32, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn FieldFilter> + Send + Sync + 'static,
    {
        self.fields.push(Registration {
            priority,
            slot: Slot::Lazy(Box::new(factory)),
        });
        self
    }

    /// Register a changeset filter.
    pub fn changeset_filter(mut self, filter: Arc<dyn ChangesetFilter>, priority: i32) -> Self {
        self.changesets.push(Registration {
            priority,
            slot: Slot::Ready(filter),
        });
        self
    }

    /// Register a changeset filter built on first use.
    pub fn lazy_changeset_filter<F>(mut self, priority: i32, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn ChangesetFilter> + Send + Sync + 'static,
    {
        self.changesets.push(Registration {
            priority,
            slot: Slot::Lazy(Box::new(factory)),
        });
        self
    }

    /// Finish the provider.
    pub fn build(self) -> FilterProvider {
        FilterProvider {
            types: Chain::new(self.types),
            fields: Chain::new(self.fields),
            changesets: Chain::new(self.changesets),
        }
    }
}
