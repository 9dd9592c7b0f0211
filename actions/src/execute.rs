//! The `execute` action: run a configured command and log its output.

use std::process::Command;

use anyhow::{bail, Context as _, Result};
use hookpipe_core::registry::{ActionConstructor, ActionSettings};
use hookpipe_core::{Action, Invocation};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExecuteSettings {
    command: CommandSpec,
    #[serde(default)]
    output: Option<String>,
}

/// A command is either a whitespace-split string or an explicit argv list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandSpec {
    Line(String),
    Argv(Vec<String>),
}

impl CommandSpec {
    fn into_argv(self) -> Vec<String> {
        match self {
            Self::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            Self::Argv(argv) => argv,
        }
    }
}

/// Runs a configured process, fails on spawn errors and non-zero exits.
///
/// Stdout is rendered through the optional `output` template (exposed as the
/// `result` variable) or logged as-is.
pub struct ExecuteAction {
    argv: Vec<String>,
    output: Option<String>,
}

impl ExecuteAction {
    /// The registry constructor for this variant.
    #[must_use]
    pub fn constructor() -> ActionConstructor {
        Box::new(|settings: &ActionSettings| {
            let settings: ExecuteSettings =
                serde_json::from_value(Value::Object(settings.clone()))?;
            let argv = settings.command.into_argv();
            if argv.is_empty() {
                bail!("command must not be empty");
            }
            Ok(Box::new(Self {
                argv,
                output: settings.output,
            }) as Box<dyn Action>)
        })
    }
}

impl Action for ExecuteAction {
    fn name(&self) -> &str {
        "execute"
    }

    fn kind(&self) -> &'static str {
        "ExecuteAction"
    }

    fn execute(&self, invocation: &Invocation<'_>) -> Result<()> {
        let (program, args) = self
            .argv
            .split_first()
            .context("command must not be empty")?;

        let rendered_program = self.render_template(invocation, program, Map::new())?;
        let mut rendered_args = Vec::with_capacity(args.len());
        for arg in args {
            rendered_args.push(self.render_template(invocation, arg, Map::new())?);
        }

        let output = Command::new(&rendered_program)
            .args(&rendered_args)
            .output()
            .with_context(|| format!("failed to spawn \"{rendered_program}\""))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            bail!(
                "command \"{rendered_program}\" exited with {}: {stderr}",
                output.status
            );
        }

        match &self.output {
            Some(template) => {
                let mut extras = Map::new();
                extras.insert("result".to_string(), json!(stdout));
                let rendered = self.render_template(invocation, template, extras)?;
                tracing::info!(action = self.name(), "{rendered}");
            }
            None => tracing::info!(action = self.name(), "{stdout}"),
        }
        Ok(())
    }
}
