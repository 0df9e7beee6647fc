//! Constant-time lookup indexes for match filters.

use crate::error::IndexError;
use std::collections::{HashMap, HashSet};

/// Set of entity type names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeIndex {
    types: HashSet<String>,
}

impl TypeIndex {
    /// Compile a list of type names.
    pub fn from_list<I, S>(types: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types = types
            .into_iter()
            .map(|name| {
                let name: String = name.into();
                if name.is_empty() {
                    Err(IndexError::EmptyTypeName)
                } else {
                    Ok(name)
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { types })
    }

    /// Whether the type is listed.
    pub fn contains(&self, entity_type: &str) -> bool {
        self.types.contains(entity_type)
    }

    /// Number of listed types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is listed.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Field matches in three shapes: a bare field of any type, a field scoped
/// to one type, and every field of a type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIndex {
    any_type: HashSet<String>,
    scoped: HashMap<String, HashSet<String>>,
    whole_types: HashSet<String>,
}

impl FieldIndex {
    /// Compile `(type, fields)` entries. An empty type name stands for any
    /// type and needs fields; a type with no fields matches all its fields.
    pub fn from_entries<I, T, F, S>(entries: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (T, F)>,
        T: Into<String>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();

        for (type_name, fields) in entries {
            let type_name = type_name.into();
            let fields: Vec<String> = fields.into_iter().map(Into::into).collect();

            match (type_name.is_empty(), fields.is_empty()) {
                (true, true) => return Err(IndexError::EmptyEntry),
                (false, true) => {
                    index.whole_types.insert(type_name);
                    continue;
                }
                _ => {}
            }

            if fields.iter().any(String::is_empty) {
                return Err(IndexError::EmptyFieldName { type_name });
            }

            if type_name.is_empty() {
                index.any_type.extend(fields);
            } else {
                index.scoped.entry(type_name).or_default().extend(fields);
            }
        }

        Ok(index)
    }

    /// Whether `field` of `entity_type` is matched.
    pub fn matches(&self, entity_type: &str, field: &str) -> bool {
        self.any_type.contains(field)
            || self
                .scoped
                .get(entity_type)
                .is_some_and(|fields| fields.contains(field))
            || self.whole_types.contains(entity_type)
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.any_type.is_empty() && self.scoped.is_empty() && self.whole_types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_index() {
        let index = TypeIndex::from_list(["Invoice", "Customer"]).unwrap();
        assert!(index.contains("Invoice"));
        assert!(!index.contains("invoice"));
        assert_eq!(index.len(), 2);
        assert_eq!(TypeIndex::from_list([""]).unwrap_err(), IndexError::EmptyTypeName);
    }

    #[test]
    fn test_field_key_shapes() {
        let index = FieldIndex::from_entries([
            ("", vec!["password"]),
            ("Invoice", vec!["total"]),
            ("AuditNote", vec![]),
        ])
        .unwrap();

        // bare field applies to every type
        assert!(index.matches("Invoice", "password"));
        assert!(index.matches("Customer", "password"));
        // scoped field only to its type
        assert!(index.matches("Invoice", "total"));
        assert!(!index.matches("Customer", "total"));
        // whole type
        assert!(index.matches("AuditNote", "anything"));
        assert!(!index.matches("Customer", "email"));
    }

    #[test]
    fn test_type_name_is_not_a_field_name() {
        let index = FieldIndex::from_entries([("Invoice", Vec::<String>::new())]).unwrap();
        assert!(!index.matches("Customer", "Invoice"));
    }

    #[test]
    fn test_invalid_entries() {
        assert_eq!(
            FieldIndex::from_entries([("", Vec::<String>::new())]).unwrap_err(),
            IndexError::EmptyEntry
        );
        assert_eq!(
            FieldIndex::from_entries([("Invoice", vec![""])]).unwrap_err(),
            IndexError::EmptyFieldName {
                type_name: "Invoice".into()
            }
        );
    }
}
