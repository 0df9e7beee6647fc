//! Configuration types.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::ops::Index;
use std::path::PathBuf;

/// Pseudo type name standing for "any entity type" in field lists.
pub const WILDCARD_TYPE: &str = "_any_";

/// Field lists keyed by type name. An empty list covers every field of the
/// type; the [`WILDCARD_TYPE`] key applies its fields to all types.
///
/// A type key repeated in the configuration file keeps its first list and is
/// reported by [`duplicates`](Self::duplicates) for validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLists {
    lists: BTreeMap<String, Vec<String>>,
    duplicates: Vec<String>,
}

impl FieldLists {
    /// Create empty lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fields of a type, returning the previous list.
    pub fn insert(&mut self, type_name: String, fields: Vec<String>) -> Option<Vec<String>> {
        self.lists.insert(type_name, fields)
    }

    /// Fields listed for a type.
    pub fn get(&self, type_name: &str) -> Option<&Vec<String>> {
        self.lists.get(type_name)
    }

    /// Entries ordered by type name.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.lists.iter()
    }

    /// Number of listed types.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether no type is listed.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Type keys that appeared more than once when deserialized.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

impl Index<&str> for FieldLists {
    type Output = Vec<String>;

    fn index(&self, type_name: &str) -> &Vec<String> {
        &self.lists[type_name]
    }
}

impl<'a> IntoIterator for &'a FieldLists {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.lists.iter()
    }
}

impl Serialize for FieldLists {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.lists.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldLists {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldListsVisitor;

        impl<'de> Visitor<'de> for FieldListsVisitor {
            type Value = FieldLists;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of type names to field lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldLists, A::Error> {
                let mut lists = FieldLists::new();
                while let Some((type_name, fields)) = map.next_entry::<String, Vec<String>>()? {
                    match lists.lists.entry(type_name) {
                        btree_map::Entry::Occupied(entry) => lists.duplicates.push(entry.key().clone()),
                        btree_map::Entry::Vacant(entry) => {
                            entry.insert(fields);
                        }
                    }
                }
                Ok(lists)
            }
        }

        deserializer.deserialize_map(FieldListsVisitor)
    }
}

/// Root configuration: named audit pipelines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Pipelines by name.
    pub pipelines: BTreeMap<String, PipelineConfig>,
}

impl WardenConfig {
    /// Look up a pipeline by name.
    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.get(name)
    }
}

/// One audit pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// What to do with a changeset that holds no records at seal time.
    pub empty_changeset: EmptyChangesetPolicy,
    /// Filter lists and default verdicts.
    pub filters: FiltersConfig,
    /// Destinations, committed in order.
    pub sinks: Vec<SinkConfig>,
}

/// Handling of changesets without records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyChangesetPolicy {
    /// Hand empty changesets to the sinks like any other.
    #[default]
    Deliver,
    /// Drop changesets left without records once filtering is done.
    Discard,
}

/// Tie-breaker verdicts used when every filter abstains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    /// Audit a type nobody voted on.
    pub audit_type: bool,
    /// Audit a field nobody voted on.
    pub audit_field: bool,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            audit_type: true,
            audit_field: true,
        }
    }
}

/// Filter lists of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Default verdicts.
    pub default: FilterDefaults,
    /// Audit only these types; every other type is denied.
    pub only_include_types: Vec<String>,
    /// Never audit these types; every other type is approved.
    pub only_exclude_types: Vec<String>,
    /// Always audit these types, others fall through.
    pub include_types: Vec<String>,
    /// Never audit these types, others fall through.
    pub exclude_types: Vec<String>,
    /// Audit only these fields; every other field is denied.
    pub only_include_fields: FieldLists,
    /// Never audit these fields; every other field is approved.
    pub only_exclude_fields: FieldLists,
    /// Always audit these fields, others fall through.
    pub include_fields: FieldLists,
    /// Never audit these fields, others fall through.
    pub exclude_fields: FieldLists,
}

impl FiltersConfig {
    /// Type lists with their configuration key, in declaration order.
    pub fn type_lists(&self) -> [(&'static str, &Vec<String>); 4] {
        [
            ("only_include_types", &self.only_include_types),
            ("only_exclude_types", &self.only_exclude_types),
            ("include_types", &self.include_types),
            ("exclude_types", &self.exclude_types),
        ]
    }

    /// Field lists with their configuration key, in declaration order.
    pub fn field_lists(&self) -> [(&'static str, &FieldLists); 4] {
        [
            ("only_include_fields", &self.only_include_fields),
            ("only_exclude_fields", &self.only_exclude_fields),
            ("include_fields", &self.include_fields),
            ("exclude_fields", &self.exclude_fields),
        ]
    }
}

/// A configured sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSink", into = "RawSink")]
pub enum SinkConfig {
    /// One `tracing` event per audit row.
    Log,
    /// Append JSON lines to a file.
    JsonLines {
        /// Target file, created when missing.
        path: PathBuf,
    },
}

impl SinkConfig {
    /// Configuration name of the sink kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::JsonLines { .. } => "json_lines",
        }
    }
}

/// Sinks are written either as a bare name (`- log`) or a single-key map
/// (`- json_lines: { path: ... }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSink {
    Name(String),
    JsonLines { json_lines: JsonLinesOptions },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonLinesOptions {
    path: PathBuf,
}

impl TryFrom<RawSink> for SinkConfig {
    type Error = String;

    fn try_from(raw: RawSink) -> Result<Self, Self::Error> {
        match raw {
            RawSink::Name(name) => match name.as_str() {
                "log" => Ok(Self::Log),
                "json_lines" => Err("sink \"json_lines\" requires a path".to_string()),
                other => Err(format!("unknown sink \"{other}\"")),
            },
            RawSink::JsonLines { json_lines } => Ok(Self::JsonLines {
                path: json_lines.path,
            }),
        }
    }
}

impl From<SinkConfig> for RawSink {
    fn from(sink: SinkConfig) -> Self {
        match sink {
            SinkConfig::Log => Self::Name("log".to_string()),
            SinkConfig::JsonLines { path } => Self::JsonLines {
                json_lines: JsonLinesOptions { path },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sinks_parse_from_both_shapes() {
        let yaml = r#"
- log
- json_lines:
    path: /var/log/warden/audit.jsonl
"#;
        let sinks: Vec<SinkConfig> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            sinks,
            vec![
                SinkConfig::Log,
                SinkConfig::JsonLines {
                    path: PathBuf::from("/var/log/warden/audit.jsonl")
                },
            ]
        );
    }

    #[test]
    fn test_unknown_sink_is_rejected() {
        let err = serde_yaml::from_str::<Vec<SinkConfig>>("- kafka").unwrap_err();
        assert!(err.to_string().contains("kafka"));
    }

    #[test]
    fn test_json_lines_without_path_is_rejected() {
        assert!(serde_yaml::from_str::<Vec<SinkConfig>>("- json_lines").is_err());
    }

    #[test]
    fn test_empty_changeset_policy_names() {
        let policy: EmptyChangesetPolicy = serde_yaml::from_str("discard").unwrap();
        assert_eq!(policy, EmptyChangesetPolicy::Discard);
        assert_eq!(serde_yaml::to_string(&EmptyChangesetPolicy::Deliver).unwrap().trim(), "deliver");
    }

    #[test]
    fn test_partial_filters_use_defaults() {
        let yaml = r#"
default:
  audit_field: false
exclude_fields:
  _any_: [password]
"#;
        let filters: FiltersConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(filters.default.audit_type);
        assert!(!filters.default.audit_field);
        assert_eq!(filters.exclude_fields[WILDCARD_TYPE], vec!["password"]);
        assert!(filters.include_fields.is_empty());
        assert!(filters.include_types.is_empty());
    }

    #[test]
    fn test_repeated_type_key_is_recorded() {
        let yaml = r#"
User: [password]
User: [email]
Customer: []
"#;
        let lists: FieldLists = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(lists["User"], vec!["password"]);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists.duplicates(), ["User"]);
    }

    #[test]
    fn test_field_lists_serialize_as_map() {
        let mut lists = FieldLists::new();
        lists.insert("Invoice".into(), vec!["total".into()]);
        let back: FieldLists = serde_yaml::from_str(&serde_yaml::to_string(&lists).unwrap()).unwrap();
        assert_eq!(back, lists);
        assert!(back.duplicates().is_empty());
    }
}
