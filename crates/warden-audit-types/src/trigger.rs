//! What caused a changeset to begin.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Free-form trigger context.
pub type TriggerContext = Map<String, Value>;

/// Reserved context key holding the trigger's source tag.
const SOURCE_KEY: &str = "source";

/// The subsystem that triggered a changeset.
///
/// Serializes as a flat map of its context with the source tag stored under
/// `source`; a context entry of that name is always overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Trigger {
    /// Command line process.
    Cli {
        /// Host the process ran on.
        host: Option<String>,
        /// Process arguments.
        argv: Vec<String>,
    },
    /// HTTP request.
    Http {
        /// Request correlation id.
        request_id: Option<String>,
        /// Client address.
        ip: Option<String>,
    },
    /// Nothing is known about the origin.
    #[default]
    Opaque,
    /// Application-defined origin.
    Custom {
        /// Source tag.
        source: String,
        /// Arbitrary context.
        context: TriggerContext,
    },
}

impl Trigger {
    /// Create a custom trigger.
    pub fn custom(source: impl Into<String>, context: TriggerContext) -> Self {
        Self::Custom {
            source: source.into(),
            context,
        }
    }

    /// Source tag.
    pub fn source(&self) -> &str {
        match self {
            Self::Cli { .. } => "cli",
            Self::Http { .. } => "http",
            Self::Opaque => "opaque",
            Self::Custom { source, .. } => source,
        }
    }

    /// Context without the source tag.
    pub fn context(&self) -> TriggerContext {
        let mut context = Map::new();
        match self {
            Self::Cli { host, argv } => {
                context.insert("host".into(), host.clone().map_or(Value::Null, Value::String));
                context.insert(
                    "argv".into(),
                    Value::Array(argv.iter().cloned().map(Value::String).collect()),
                );
            }
            Self::Http { request_id, ip } => {
                context.insert("reqId".into(), request_id.clone().map_or(Value::Null, Value::String));
                context.insert("ip".into(), ip.clone().map_or(Value::Null, Value::String));
            }
            Self::Opaque => {}
            Self::Custom { context: custom, .. } => context.clone_from(custom),
        }
        context
    }

    /// Context with the source tag under `source`, as stored with audit rows.
    pub fn action(&self) -> TriggerContext {
        let mut action = self.context();
        action.insert(SOURCE_KEY.into(), Value::String(self.source().to_string()));
        action
    }
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let action = self.action();
        let mut map = serializer.serialize_map(Some(action.len()))?;
        for (key, value) in &action {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_cli_context() {
        let trigger = Trigger::Cli {
            host: Some("worker-1".into()),
            argv: vec!["bin/console".into(), "invoices:close".into()],
        };
        assert_eq!(trigger.source(), "cli");
        assert_eq!(
            serde_json::to_value(&trigger).unwrap(),
            json!({
                "source": "cli",
                "host": "worker-1",
                "argv": ["bin/console", "invoices:close"],
            })
        );
    }

    #[test]
    fn test_http_context_uses_req_id_key() {
        let trigger = Trigger::Http {
            request_id: Some("abc".into()),
            ip: None,
        };
        assert_eq!(
            trigger.action(),
            json!({ "source": "http", "reqId": "abc", "ip": null })
                .as_object()
                .cloned()
                .unwrap()
        );
    }

    #[test]
    fn test_opaque_has_only_source() {
        assert!(Trigger::Opaque.context().is_empty());
        assert_eq!(serde_json::to_value(Trigger::default()).unwrap(), json!({ "source": "opaque" }));
    }

    #[test]
    fn test_source_key_is_reserved() {
        let mut context = TriggerContext::new();
        context.insert("source".into(), json!("spoofed"));
        context.insert("queue".into(), json!("billing"));
        let trigger = Trigger::custom("worker", context);

        let value = serde_json::to_value(&trigger).unwrap();
        assert_eq!(value["source"], "worker");
        assert_eq!(value["queue"], "billing");
        // context() returns the caller's map untouched
        assert_eq!(trigger.context()["source"], "spoofed");
    }
}
