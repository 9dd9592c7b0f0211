//! The `log` action: render a message template and log it.

use anyhow::Result;
use hookpipe_core::registry::{ActionConstructor, ActionSettings};
use hookpipe_core::{Action, Invocation};
use serde::Deserialize;
use serde_json::{Map, Value};

const DEFAULT_MESSAGE: &str = "Processing {{ request.method }} {{ request.path }} ...";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSettings {
    #[serde(default = "default_message")]
    message: String,
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

/// Logs a rendered message for every accepted request.
pub struct LogAction {
    message: String,
}

impl LogAction {
    /// The registry constructor for this variant.
    #[must_use]
    pub fn constructor() -> ActionConstructor {
        Box::new(|settings: &ActionSettings| {
            let settings: LogSettings =
                serde_json::from_value(Value::Object(settings.clone()))?;
            Ok(Box::new(Self {
                message: settings.message,
            }) as Box<dyn Action>)
        })
    }
}

impl Action for LogAction {
    fn name(&self) -> &str {
        "log"
    }

    fn kind(&self) -> &'static str {
        "LogAction"
    }

    fn execute(&self, invocation: &Invocation<'_>) -> Result<()> {
        let message = self.render_template(invocation, &self.message, Map::new())?;
        tracing::info!(action = self.name(), "{message}");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hookpipe_core::{ExecutionContext, RequestSnapshot};
    use serde_json::json;

    fn build(settings: Value) -> Box<dyn Action> {
        let map = settings.as_object().cloned().unwrap_or_default();
        (LogAction::constructor())(&map).unwrap()
    }

    #[test]
    fn default_message_names_method_and_path() {
        let action = build(json!({}));
        let request = RequestSnapshot::new(
            "POST",
            "/hooks/deploy",
            http::HeaderMap::new(),
            Vec::new(),
            None,
        );
        let context = ExecutionContext::new();
        let invocation = Invocation {
            request: &request,
            context: &context,
        };
        assert!(action.run(&invocation).is_ok());
    }

    #[test]
    fn template_error_in_message_fails_the_run() {
        let action = build(json!({"message": "{{ error('bad message') }}"}));
        let request =
            RequestSnapshot::new("POST", "/hook", http::HeaderMap::new(), Vec::new(), None);
        let context = ExecutionContext::new();
        let invocation = Invocation {
            request: &request,
            context: &context,
        };

        let err = action.run(&invocation).unwrap_err();
        assert!(err.message().contains("Failed to invoke LogAction.run"));
        assert!(err.message().contains("bad message"));
    }

    #[test]
    fn unknown_settings_are_rejected_at_construction() {
        let map = json!({"mesage": "typo"}).as_object().cloned().unwrap();
        assert!((LogAction::constructor())(&map).is_err());
    }
}
