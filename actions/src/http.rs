//! The `http` action: send a templated outbound HTTP request.

use std::sync::OnceLock;

use anyhow::{bail, Context as _, Result};
use hookpipe_core::registry::{ActionConstructor, ActionSettings};
use hookpipe_core::{Action, Invocation};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HttpSettings {
    target: String,
    #[serde(default = "default_http_method")]
    method: String,
    #[serde(default)]
    headers: Map<String, Value>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default = "default_fail_on_error")]
    fail_on_error: bool,
}

fn default_http_method() -> String {
    "POST".to_string()
}

const fn default_fail_on_error() -> bool {
    true
}

/// Sends an outbound HTTP request built from templated settings.
///
/// `target`, header values and `body` are all templates rendered per
/// invocation. The response is exposed to the optional `output` template as
/// the `response` variable (`response.status`, `response.body`). A
/// non-success status fails the pipeline unless `fail_on_error` is disabled.
pub struct HttpAction {
    target: String,
    method: reqwest::Method,
    headers: Vec<(String, String)>,
    body: Option<String>,
    output: Option<String>,
    fail_on_error: bool,
    // Created on first use, inside the blocking pipeline thread.
    client: OnceLock<reqwest::blocking::Client>,
}

impl HttpAction {
    /// The registry constructor for this variant.
    #[must_use]
    pub fn constructor() -> ActionConstructor {
        Box::new(|settings: &ActionSettings| {
            let settings: HttpSettings =
                serde_json::from_value(Value::Object(settings.clone()))?;
            if settings.target.is_empty() {
                bail!("target must not be empty");
            }
            let method = settings
                .method
                .to_uppercase()
                .parse::<reqwest::Method>()
                .map_err(|_| anyhow::anyhow!("unsupported method \"{}\"", settings.method))?;
            let mut headers = Vec::with_capacity(settings.headers.len());
            for (name, value) in &settings.headers {
                let Value::String(value) = value else {
                    bail!("header \"{name}\" must be a string");
                };
                headers.push((name.clone(), value.clone()));
            }
            Ok(Box::new(Self {
                target: settings.target,
                method,
                headers,
                body: settings.body,
                output: settings.output,
                fail_on_error: settings.fail_on_error,
                client: OnceLock::new(),
            }) as Box<dyn Action>)
        })
    }
}

impl Action for HttpAction {
    fn name(&self) -> &str {
        "http"
    }

    fn kind(&self) -> &'static str {
        "HttpAction"
    }

    fn execute(&self, invocation: &Invocation<'_>) -> Result<()> {
        let target = self.render_template(invocation, &self.target, Map::new())?;

        let client = self.client.get_or_init(reqwest::blocking::Client::new);
        let mut request = client.request(self.method.clone(), &target);
        for (name, value) in &self.headers {
            request = request.header(
                name.as_str(),
                self.render_template(invocation, value, Map::new())?,
            );
        }
        if let Some(body) = &self.body {
            request = request.body(self.render_template(invocation, body, Map::new())?);
        }

        let response = request
            .send()
            .with_context(|| format!("request to {target} failed"))?;
        let status = response.status();
        let body = response.text().unwrap_or_default();

        if self.fail_on_error && !status.is_success() {
            bail!("{target} responded with {status}: {body}");
        }

        match &self.output {
            Some(template) => {
                let mut extras = Map::new();
                extras.insert(
                    "response".to_string(),
                    json!({"status": status.as_u16(), "body": body}),
                );
                let rendered = self.render_template(invocation, template, extras)?;
                tracing::info!(action = self.name(), "{rendered}");
            }
            None => {
                tracing::info!(
                    action = self.name(),
                    target = %target,
                    status = status.as_u16(),
                    "request sent"
                );
            }
        }
        Ok(())
    }
}
