//! Name → constructor table for action variants.
//!
//! The registry is populated by explicit, ordered calls at process startup
//! and is read-only once the server accepts traffic. Both misuses it can
//! detect — registering a name twice, constructing an unregistered name —
//! are configuration-time failures that abort startup.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::action::Action;
use crate::error::ConfigurationError;

/// The declarative settings mapping an action is constructed from.
pub type ActionSettings = Map<String, Value>;

/// A constructor turning a settings mapping into a boxed action.
pub type ActionConstructor =
    Box<dyn Fn(&ActionSettings) -> anyhow::Result<Box<dyn Action>> + Send + Sync>;

/// Process-wide table of action constructors, keyed by declared name.
#[derive(Default)]
pub struct ActionRegistry {
    constructors: BTreeMap<String, ActionConstructor>,
}

impl ActionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateAction`] if `name` is already
    /// registered.
    pub fn register(
        &mut self,
        name: &str,
        constructor: ActionConstructor,
    ) -> Result<(), ConfigurationError> {
        if self.constructors.contains_key(name) {
            return Err(ConfigurationError::DuplicateAction(name.to_string()));
        }
        self.constructors.insert(name.to_string(), constructor);
        Ok(())
    }

    /// Construct an action from its declared name and settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownAction`] (listing every known
    /// name) for an unregistered name, or
    /// [`ConfigurationError::ActionConstruction`] wrapping the cause when the
    /// constructor itself fails.
    pub fn create(
        &self,
        name: &str,
        settings: &ActionSettings,
    ) -> Result<Box<dyn Action>, ConfigurationError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownAction {
                    name: name.to_string(),
                    known: self.known_names(),
                })?;

        constructor(settings).map_err(|cause| ConfigurationError::ActionConstruction {
            name: name.to_string(),
            settings: Value::Object(settings.clone()).to_string(),
            cause,
        })
    }

    /// Every registered name, sorted.
    #[must_use]
    pub fn known_names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::action::Invocation;

    struct NullAction;

    impl Action for NullAction {
        fn name(&self) -> &str {
            "null"
        }

        fn kind(&self) -> &'static str {
            "NullAction"
        }

        fn execute(&self, _invocation: &Invocation<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn null_constructor() -> ActionConstructor {
        Box::new(|_settings| Ok(Box::new(NullAction) as Box<dyn Action>))
    }

    #[test]
    fn register_then_create() {
        let mut registry = ActionRegistry::new();
        registry.register("null", null_constructor()).unwrap();

        let action = registry.create("null", &ActionSettings::new()).unwrap();
        assert_eq!(action.name(), "null");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ActionRegistry::new();
        registry.register("null", null_constructor()).unwrap();

        let err = registry.register("null", null_constructor()).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateAction(ref name) if name == "null"));
    }

    #[test]
    fn unknown_name_lists_known_names() {
        let mut registry = ActionRegistry::new();
        registry.register("log", null_constructor()).unwrap();
        registry.register("eval", null_constructor()).unwrap();

        let err = registry.create("nope", &ActionSettings::new()).unwrap_err();
        match err {
            ConfigurationError::UnknownAction { name, known } => {
                assert_eq!(name, "nope");
                assert_eq!(known, vec!["eval".to_string(), "log".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn constructor_failure_is_wrapped_with_settings() {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                "broken",
                Box::new(|_settings| Err(anyhow::anyhow!("missing required setting: block"))),
            )
            .unwrap();

        let mut settings = ActionSettings::new();
        settings.insert("other".to_string(), Value::Bool(true));
        let err = registry.create("broken", &settings).unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.contains("failed to create action: broken"));
        assert!(rendered.contains("{\"other\":true}"));
        assert!(rendered.contains("missing required setting: block"));
    }
}
