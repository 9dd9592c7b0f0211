//! The `eval` action: render a template block for its side effects.
//!
//! Useful for `context.set(...)` assignments consumed by later pipeline
//! steps, and for `error(...)` guards expressed directly in configuration.

use anyhow::Result;
use hookpipe_core::registry::{ActionConstructor, ActionSettings};
use hookpipe_core::{Action, Invocation};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluateSettings {
    block: String,
}

/// Renders a configured template block and logs the result.
pub struct EvaluateAction {
    block: String,
}

impl EvaluateAction {
    /// The registry constructor for this variant.
    #[must_use]
    pub fn constructor() -> ActionConstructor {
        Box::new(|settings: &ActionSettings| {
            let settings: EvaluateSettings =
                serde_json::from_value(Value::Object(settings.clone()))?;
            Ok(Box::new(Self {
                block: settings.block,
            }) as Box<dyn Action>)
        })
    }
}

impl Action for EvaluateAction {
    fn name(&self) -> &str {
        "eval"
    }

    fn kind(&self) -> &'static str {
        "EvaluateAction"
    }

    fn execute(&self, invocation: &Invocation<'_>) -> Result<()> {
        let output = self.render_template(invocation, &self.block, Map::new())?;
        tracing::info!(action = self.name(), "{output}");
        Ok(())
    }
}
