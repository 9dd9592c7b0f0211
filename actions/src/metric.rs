//! The `metrics` action: emit a configured metric per invocation.
//!
//! The metric name and label values are fixed at configuration time; the
//! observed value is a template rendered per invocation (defaulting to `1`),
//! so payload fields can drive gauge and histogram observations.

use anyhow::{bail, Result};
use hookpipe_core::registry::{ActionConstructor, ActionSettings};
use hookpipe_core::{Action, Invocation};
use metrics::Label;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricSettings {
    name: String,
    #[serde(default = "default_kind")]
    kind: MetricKind,
    #[serde(default)]
    labels: Map<String, Value>,
    #[serde(default = "default_value")]
    value: String,
}

const fn default_kind() -> MetricKind {
    MetricKind::Counter
}

fn default_value() -> String {
    "1".to_string()
}

/// Emits one observation of a named metric per invocation.
pub struct MetricAction {
    name: String,
    kind: MetricKind,
    labels: Vec<Label>,
    value: String,
}

impl MetricAction {
    /// The registry constructor for this variant.
    #[must_use]
    pub fn constructor() -> ActionConstructor {
        Box::new(|settings: &ActionSettings| {
            let settings: MetricSettings =
                serde_json::from_value(Value::Object(settings.clone()))?;
            if settings.name.is_empty() {
                bail!("name must not be empty");
            }
            let mut labels = Vec::with_capacity(settings.labels.len());
            for (key, value) in &settings.labels {
                let Value::String(value) = value else {
                    bail!("label \"{key}\" must be a string");
                };
                labels.push(Label::new(key.clone(), value.clone()));
            }
            Ok(Box::new(Self {
                name: settings.name,
                kind: settings.kind,
                labels,
                value: settings.value,
            }) as Box<dyn Action>)
        })
    }
}

impl Action for MetricAction {
    fn name(&self) -> &str {
        "metrics"
    }

    fn kind(&self) -> &'static str {
        "MetricAction"
    }

    fn execute(&self, invocation: &Invocation<'_>) -> Result<()> {
        let rendered = self.render_template(invocation, &self.value, Map::new())?;
        let value: f64 = rendered
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("metric value \"{rendered}\" is not a number"))?;

        match self.kind {
            MetricKind::Counter => {
                if value < 0.0 {
                    bail!("counter increment must not be negative, got {value}");
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                metrics::counter!(self.name.clone(), self.labels.clone()).increment(value as u64);
            }
            MetricKind::Gauge => {
                metrics::gauge!(self.name.clone(), self.labels.clone()).set(value);
            }
            MetricKind::Histogram => {
                metrics::histogram!(self.name.clone(), self.labels.clone()).record(value);
            }
        }
        Ok(())
    }
}
