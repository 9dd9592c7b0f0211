//! Declarative endpoint configuration.
//!
//! These are the serde shapes a configuration file deserializes into. The
//! engine consumes them once at startup: rule mappings are compiled into
//! [`crate::rules::RuleSet`]s and action entries are instantiated through the
//! [`crate::registry::ActionRegistry`].

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::registry::ActionSettings;

/// One declared endpoint: a route, acceptance rules, and an ordered action
/// pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Route path, e.g. `/hooks/deploy`. Must be non-empty.
    pub route: String,

    /// Accepted HTTP method. Defaults to `POST`.
    #[serde(default = "default_method")]
    pub method: String,

    /// When true, accepted requests are acknowledged immediately and the
    /// pipeline runs on a detached background task.
    #[serde(default, rename = "async")]
    pub detached: bool,

    /// Header rules: header name → prefix pattern.
    #[serde(default)]
    pub headers: Map<String, Value>,

    /// Body rules: key → prefix pattern or nested rule mapping.
    #[serde(default)]
    pub body: Map<String, Value>,

    /// Ordered action entries, each a single-key `{name: settings}` mapping.
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

fn default_method() -> String {
    "POST".to_string()
}

impl EndpointConfig {
    /// The declared method, `POST` unless overridden.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Flatten the action entries into `(name, settings)` specs, in declared
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidActionSettings`] when an entry's
    /// settings value is neither a mapping nor null.
    pub fn action_specs(&self) -> Result<Vec<ActionSpec>, ConfigurationError> {
        let mut specs = Vec::new();
        for entry in &self.actions {
            for (name, settings) in &entry.0 {
                let settings = match settings {
                    Value::Object(map) => map.clone(),
                    Value::Null => ActionSettings::new(),
                    other => {
                        return Err(ConfigurationError::InvalidActionSettings {
                            name: name.clone(),
                            found: json_type_name(other),
                        });
                    }
                };
                specs.push(ActionSpec {
                    name: name.clone(),
                    settings,
                });
            }
        }
        Ok(specs)
    }
}

/// One action entry as written in configuration: `{<name>: <settings-or-null>}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ActionEntry(pub Map<String, Value>);

/// A flattened, declarative action record: name plus settings mapping.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    /// The registered action name.
    pub name: String,
    /// Settings passed to the action's constructor.
    pub settings: ActionSettings,
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}
