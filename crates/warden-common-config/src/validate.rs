//! Load-time validation of pipeline configuration.

use crate::catalog::TypeCatalog;
use crate::loader::ConfigError;
use crate::types::{FieldLists, FiltersConfig, PipelineConfig, WardenConfig, WILDCARD_TYPE};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn pipeline_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid pipeline name regex"))
}

fn field_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex"))
}

impl WardenConfig {
    /// Validate every pipeline, optionally against a type catalog.
    pub fn validate(&self, catalog: Option<&TypeCatalog>) -> Result<(), ConfigError> {
        for (name, pipeline) in &self.pipelines {
            pipeline.validate(name, catalog)?;
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Validate a single pipeline registered under `name`.
    pub fn validate(&self, name: &str, catalog: Option<&TypeCatalog>) -> Result<(), ConfigError> {
        if !pipeline_name_re().is_match(name) {
            return Err(ConfigError::InvalidPipelineName {
                name: name.to_string(),
            });
        }
        self.filters.validate(name, catalog)
    }
}

impl FiltersConfig {
    fn validate(&self, pipeline: &str, catalog: Option<&TypeCatalog>) -> Result<(), ConfigError> {
        if !self.only_include_types.is_empty() && !self.only_exclude_types.is_empty() {
            return Err(ConfigError::ConflictingLists {
                pipeline: pipeline.to_string(),
                first: "only_include_types",
                second: "only_exclude_types",
            });
        }
        if !self.only_include_fields.is_empty() && !self.only_exclude_fields.is_empty() {
            return Err(ConfigError::ConflictingLists {
                pipeline: pipeline.to_string(),
                first: "only_include_fields",
                second: "only_exclude_fields",
            });
        }

        for (category, types) in self.type_lists() {
            validate_type_list(pipeline, category, types, catalog)?;
        }
        for (category, lists) in self.field_lists() {
            validate_field_lists(pipeline, category, lists, catalog)?;
        }
        Ok(())
    }
}

fn validate_type_name(pipeline: &str, category: &'static str, value: &str) -> Result<(), ConfigError> {
    let malformed = value.is_empty()
        || value == WILDCARD_TYPE
        || value.contains('|')
        || value.chars().any(char::is_whitespace);
    if malformed {
        return Err(ConfigError::InvalidTypeName {
            pipeline: pipeline.to_string(),
            category,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_type_list(
    pipeline: &str,
    category: &'static str,
    types: &[String],
    catalog: Option<&TypeCatalog>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for type_name in types {
        validate_type_name(pipeline, category, type_name)?;

        if !seen.insert(type_name.as_str()) {
            return Err(ConfigError::DuplicateEntry {
                pipeline: pipeline.to_string(),
                category,
                value: type_name.clone(),
            });
        }

        if let Some(catalog) = catalog {
            if !catalog.contains_type(type_name) {
                return Err(ConfigError::UnknownType {
                    pipeline: pipeline.to_string(),
                    category,
                    value: type_name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_field_lists(
    pipeline: &str,
    category: &'static str,
    lists: &FieldLists,
    catalog: Option<&TypeCatalog>,
) -> Result<(), ConfigError> {
    if let Some(type_name) = lists.duplicates().first() {
        return Err(ConfigError::DuplicateEntry {
            pipeline: pipeline.to_string(),
            category,
            value: type_name.clone(),
        });
    }

    for (type_name, fields) in lists {
        let wildcard = type_name == WILDCARD_TYPE;

        if wildcard {
            if fields.is_empty() {
                return Err(ConfigError::MissingWildcardFields {
                    pipeline: pipeline.to_string(),
                    category,
                });
            }
        } else {
            validate_type_name(pipeline, category, type_name)?;
            if let Some(catalog) = catalog {
                if !catalog.contains_type(type_name) {
                    return Err(ConfigError::UnknownType {
                        pipeline: pipeline.to_string(),
                        category,
                        value: type_name.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for field in fields {
            if !field_name_re().is_match(field) {
                return Err(ConfigError::InvalidFieldName {
                    pipeline: pipeline.to_string(),
                    category,
                    type_name: type_name.clone(),
                    value: field.clone(),
                });
            }
            if !seen.insert(field.as_str()) {
                return Err(ConfigError::DuplicateEntry {
                    pipeline: pipeline.to_string(),
                    category,
                    value: format!("{type_name}.{field}"),
                });
            }
            if let (false, Some(catalog)) = (wildcard, catalog) {
                if !catalog.contains_field(type_name, field) {
                    return Err(ConfigError::UnknownField {
                        pipeline: pipeline.to_string(),
                        category,
                        type_name: type_name.clone(),
                        value: field.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn pipeline_with(filters: FiltersConfig) -> PipelineConfig {
        PipelineConfig {
            filters,
            ..PipelineConfig::default()
        }
    }

    #[test_case("default" ; "lowercase")]
    #[test_case("Billing_2" ; "mixed with digits")]
    fn test_valid_pipeline_names(name: &str) {
        assert!(PipelineConfig::default().validate(name, None).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("billing-eu" ; "dash")]
    #[test_case("a b" ; "space")]
    fn test_invalid_pipeline_names(name: &str) {
        let err = PipelineConfig::default().validate(name, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPipelineName { .. }));
    }

    #[test]
    fn test_only_lists_are_exclusive() {
        let filters = FiltersConfig {
            only_include_types: vec!["Invoice".into()],
            only_exclude_types: vec!["Customer".into()],
            ..FiltersConfig::default()
        };
        let err = pipeline_with(filters).validate("default", None).unwrap_err();
        match err {
            ConfigError::ConflictingLists { pipeline, first, .. } => {
                assert_eq!(pipeline, "default");
                assert_eq!(first, "only_include_types");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_type_reports_category_and_value() {
        let filters = FiltersConfig {
            exclude_types: vec!["Invoice".into(), "Invoice".into()],
            ..FiltersConfig::default()
        };
        let err = pipeline_with(filters).validate("billing", None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("billing"));
        assert!(message.contains("exclude_types"));
        assert!(message.contains("Invoice"));
    }

    #[test]
    fn test_wildcard_needs_fields() {
        let mut filters = FiltersConfig::default();
        filters.exclude_fields.insert(WILDCARD_TYPE.into(), vec![]);
        let err = pipeline_with(filters).validate("default", None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingWildcardFields { category: "exclude_fields", .. }));
    }

    #[test]
    fn test_empty_field_list_covers_whole_type() {
        let mut filters = FiltersConfig::default();
        filters.include_fields.insert("Invoice".into(), vec![]);
        assert!(pipeline_with(filters).validate("default", None).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("1st" ; "leading digit")]
    #[test_case("pass word" ; "space")]
    #[test_case("a|b" ; "separator")]
    fn test_invalid_field_names(field: &str) {
        let mut filters = FiltersConfig::default();
        filters.exclude_fields.insert(WILDCARD_TYPE.into(), vec![field.to_string()]);
        let err = pipeline_with(filters).validate("default", None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFieldName { .. }));
    }

    #[test]
    fn test_wildcard_is_not_a_type() {
        let filters = FiltersConfig {
            include_types: vec![WILDCARD_TYPE.into()],
            ..FiltersConfig::default()
        };
        let err = pipeline_with(filters).validate("default", None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTypeName { .. }));
    }

    #[test]
    fn test_catalog_catches_unknown_types_and_fields() {
        let catalog = TypeCatalog::new().with_type("Invoice", ["total", "number"]);

        let filters = FiltersConfig {
            include_types: vec!["Invoce".into()],
            ..FiltersConfig::default()
        };
        let err = pipeline_with(filters).validate("default", Some(&catalog)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownType { .. }));

        let mut filters = FiltersConfig::default();
        filters.exclude_fields.insert("Invoice".into(), vec!["totl".into()]);
        let err = pipeline_with(filters).validate("default", Some(&catalog)).unwrap_err();
        match err {
            ConfigError::UnknownField { type_name, value, .. } => {
                assert_eq!(type_name, "Invoice");
                assert_eq!(value, "totl");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Wildcard fields cannot be checked against a single type.
        let mut filters = FiltersConfig::default();
        filters.exclude_fields.insert(WILDCARD_TYPE.into(), vec!["password".into()]);
        assert!(pipeline_with(filters).validate("default", Some(&catalog)).is_ok());
    }
}
