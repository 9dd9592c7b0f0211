//! The `sleep` action: block the pipeline for a configured duration.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use hookpipe_core::registry::{ActionConstructor, ActionSettings};
use hookpipe_core::{Action, Invocation};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SleepSettings {
    seconds: f64,
}

/// Blocks the executing pipeline for a fixed number of seconds.
///
/// On a synchronous endpoint this delays the HTTP response; on a detached
/// endpoint it only delays the remaining pipeline steps.
pub struct SleepAction {
    duration: Duration,
}

impl SleepAction {
    /// The registry constructor for this variant.
    #[must_use]
    pub fn constructor() -> ActionConstructor {
        Box::new(|settings: &ActionSettings| {
            let settings: SleepSettings =
                serde_json::from_value(Value::Object(settings.clone()))?;
            if !settings.seconds.is_finite() || settings.seconds < 0.0 {
                bail!("seconds must be a non-negative number, got {}", settings.seconds);
            }
            Ok(Box::new(Self {
                duration: Duration::from_secs_f64(settings.seconds),
            }) as Box<dyn Action>)
        })
    }
}

impl Action for SleepAction {
    fn name(&self) -> &str {
        "sleep"
    }

    fn kind(&self) -> &'static str {
        "SleepAction"
    }

    fn execute(&self, _invocation: &Invocation<'_>) -> Result<()> {
        tracing::debug!(action = self.name(), seconds = self.duration.as_secs_f64(), "sleeping");
        thread::sleep(self.duration);
        Ok(())
    }
}
