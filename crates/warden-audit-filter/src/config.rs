//! Match filters from pipeline configuration.

use crate::error::IndexError;
use crate::index::{FieldIndex, TypeIndex};
use crate::match_field::MatchFieldFilter;
use crate::match_type::{MatchPolicy, MatchTypeFilter};
use crate::provider::FilterProviderBuilder;
use std::sync::Arc;
use warden_common_config::{FieldLists, FiltersConfig, WILDCARD_TYPE};

/// Priority of `exclude_types` / `exclude_fields`.
pub const EXCLUDE_PRIORITY: i32 = 520;
/// Priority of `include_types` / `include_fields`.
pub const INCLUDE_PRIORITY: i32 = 510;
/// Priority of the `only_*` lists.
pub const ONLY_PRIORITY: i32 = 500;

fn field_index(lists: &FieldLists) -> Result<FieldIndex, IndexError> {
    FieldIndex::from_entries(lists.iter().map(|(type_name, fields)| {
        let type_name = if type_name == WILDCARD_TYPE {
            ""
        } else {
            type_name.as_str()
        };
        (type_name, fields.iter().map(String::as_str))
    }))
}

impl FilterProviderBuilder {
    /// Register a match filter for every non-empty list of `config`.
    ///
    /// Exclusions outrank inclusions, which outrank the exclusive `only_*`
    /// lists.
    pub fn with_config(mut self, config: &FiltersConfig) -> Result<Self, IndexError> {
        let type_lists = [
            ("exclude_types", &config.exclude_types, MatchPolicy::Exclude, EXCLUDE_PRIORITY),
            ("include_types", &config.include_types, MatchPolicy::Include, INCLUDE_PRIORITY),
            ("only_include_types", &config.only_include_types, MatchPolicy::OnlyInclude, ONLY_PRIORITY),
            ("only_exclude_types", &config.only_exclude_types, MatchPolicy::OnlyExclude, ONLY_PRIORITY),
        ];
        for (name, list, policy, priority) in type_lists {
            if list.is_empty() {
                continue;
            }
            let index = TypeIndex::from_list(list.iter().map(String::as_str))?;
            self = self.type_filter(Arc::new(MatchTypeFilter::new(name, policy, index)), priority);
        }

        let field_lists = [
            ("exclude_fields", &config.exclude_fields, MatchPolicy::Exclude, EXCLUDE_PRIORITY),
            ("include_fields", &config.include_fields, MatchPolicy::Include, INCLUDE_PRIORITY),
            ("only_include_fields", &config.only_include_fields, MatchPolicy::OnlyInclude, ONLY_PRIORITY),
            ("only_exclude_fields", &config.only_exclude_fields, MatchPolicy::OnlyExclude, ONLY_PRIORITY),
        ];
        for (name, lists, policy, priority) in field_lists {
            if lists.is_empty() {
                continue;
            }
            let index = field_index(lists)?;
            self = self.field_filter(Arc::new(MatchFieldFilter::new(name, policy, index)), priority);
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FieldFilter, Filter};
    use crate::provider::FilterProvider;
    use crate::vote::Vote;
    use pretty_assertions::assert_eq;
    use warden_audit_types::OperationType;

    #[test]
    fn test_only_configured_lists_register_filters() {
        let config = FiltersConfig {
            include_types: vec!["Invoice".into()],
            exclude_types: vec!["Session".into()],
            ..FiltersConfig::default()
        };
        let provider = FilterProvider::builder().with_config(&config).unwrap().build();

        let names: Vec<&str> = provider.type_filters().iter().map(|e| e.filter.name()).collect();
        assert_eq!(names, ["exclude_types", "include_types"]);
        assert!(provider.type_filters().iter().all(|e| e.cacheable));
        assert!(!provider.has_field_filters());
    }

    #[test]
    fn test_wildcard_key_maps_to_any_type() {
        let mut config = FiltersConfig::default();
        config.exclude_fields.insert(WILDCARD_TYPE.into(), vec!["password".into()]);
        let provider = FilterProvider::builder().with_config(&config).unwrap().build();

        let filter = &provider.field_filters()[0].filter;
        assert_eq!(
            filter.vote_field(OperationType::Update, "Customer", "password").unwrap(),
            Vote::Deny
        );
        assert_eq!(
            filter.vote_field(OperationType::Update, "Customer", "_any_").unwrap(),
            Vote::Abstain
        );
    }

    #[test]
    fn test_exclusion_outranks_inclusion() {
        let config = FiltersConfig {
            only_include_types: vec!["Invoice".into()],
            exclude_types: vec!["Invoice".into()],
            ..FiltersConfig::default()
        };
        let provider = FilterProvider::builder().with_config(&config).unwrap().build();
        let priorities: Vec<i32> = provider.type_filters().iter().map(|e| e.priority).collect();
        assert_eq!(priorities, [EXCLUDE_PRIORITY, ONLY_PRIORITY]);
    }
}
