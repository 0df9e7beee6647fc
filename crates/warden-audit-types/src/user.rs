//! Audit users.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user as recorded in the audit log. Compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Kind of account, e.g. `system` or an application user type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Stable, permanent identifier.
    pub id: String,
    /// Human-recognisable name such as a login or email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    /// Create a user with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            kind: None,
            id: id.into(),
            name: None,
        }
    }

    /// Set the account kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.name) {
            (Some(kind), Some(name)) => write!(f, "{kind}:{} ({name})", self.id),
            (Some(kind), None) => write!(f, "{kind}:{}", self.id),
            (None, Some(name)) => write!(f, "{} ({name})", self.id),
            (None, None) => f.write_str(&self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        let a = User::new("42").with_kind("customer").with_name("ada");
        let b = User::new("42").with_kind("customer").with_name("ada");
        assert_eq!(a, b);
        assert_ne!(a, User::new("42"));
    }

    #[test]
    fn test_display() {
        assert_eq!(User::new("7").to_string(), "7");
        assert_eq!(User::new("root").with_kind("system").to_string(), "system:root");
        assert_eq!(User::new("7").with_name("bob").to_string(), "7 (bob)");
    }

    #[test]
    fn test_optional_fields_skipped() {
        let json = serde_json::to_value(User::new("7")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "7" }));
    }
}
