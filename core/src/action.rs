//! The capability contract every action variant implements.
//!
//! The engine never special-cases a variant: it constructs actions through
//! the registry, invokes [`Action::run`] in declared order, and treats every
//! failure as the same uniform [`InvocationError`]. Variants are free to fail
//! naturally with any [`anyhow::Error`]; the wrapping happens once, here.

use anyhow::anyhow;
use serde_json::Map;

use crate::context::ExecutionContext;
use crate::error::InvocationError;
use crate::request::RequestSnapshot;
use crate::template::{self, TemplateScope};

/// Everything one action invocation may observe: the request snapshot and
/// the per-execution context store.
///
/// Both fields are borrowed — the dispatcher owns the snapshot and the
/// context for the lifetime of the pipeline, inline or detached.
pub struct Invocation<'a> {
    /// Immutable copy of the triggering request.
    pub request: &'a RequestSnapshot,
    /// Key-value store scoped to this pipeline execution.
    pub context: &'a ExecutionContext,
}

/// A single named, independently configurable side-effecting step in an
/// endpoint's pipeline.
///
/// Implementors provide [`execute`](Self::execute); the engine only ever
/// calls the provided [`run`](Self::run) wrapper, which converts any escaping
/// error into an [`InvocationError`] carrying the variant name and the full
/// cause chain.
pub trait Action: Send + Sync {
    /// The name this variant was registered and configured under, e.g. `log`.
    fn name(&self) -> &str;

    /// The variant type name used in invocation diagnostics, e.g. `LogAction`.
    fn kind(&self) -> &'static str;

    /// Perform the variant's side effect. May fail with any error.
    ///
    /// # Errors
    ///
    /// Whatever the variant raises; the engine wraps it uniformly.
    fn execute(&self, invocation: &Invocation<'_>) -> anyhow::Result<()>;

    /// Invoke the variant with uniform error wrapping.
    ///
    /// # Errors
    ///
    /// Returns an [`InvocationError`] whose message names the variant and
    /// carries the cause chain of the underlying failure.
    fn run(&self, invocation: &Invocation<'_>) -> Result<(), InvocationError> {
        self.execute(invocation)
            .map_err(|cause| InvocationError::wrap(self.kind(), &cause))
    }

    /// Render `text` against the fixed template variable set plus `extras`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed template or when the template invokes the
    /// `error(...)` callback.
    fn render_template(
        &self,
        invocation: &Invocation<'_>,
        text: &str,
        extras: Map<String, serde_json::Value>,
    ) -> anyhow::Result<String> {
        let scope = TemplateScope::new(self.name(), invocation.request, invocation.context, extras);
        template::render(text, &scope)
    }

    /// Build a caller-visible error. An empty message yields the default
    /// `The "<name>" action threw an error`.
    fn signal_error(&self, message: &str) -> anyhow::Error {
        if message.is_empty() {
            anyhow!("The \"{}\" action threw an error", self.name())
        } else {
            anyhow!(message.to_string())
        }
    }
}

impl std::fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use serde_json::json;

    struct FailingAction;

    impl Action for FailingAction {
        fn name(&self) -> &str {
            "failing"
        }

        fn kind(&self) -> &'static str {
            "FailingAction"
        }

        fn execute(&self, _invocation: &Invocation<'_>) -> anyhow::Result<()> {
            Err(anyhow!("disk full").context("could not write output"))
        }
    }

    struct QuietAction;

    impl Action for QuietAction {
        fn name(&self) -> &str {
            "quiet"
        }

        fn kind(&self) -> &'static str {
            "QuietAction"
        }

        fn execute(&self, _invocation: &Invocation<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn invocation_parts() -> (RequestSnapshot, ExecutionContext) {
        (
            RequestSnapshot::new(
                "POST",
                "/hook",
                HeaderMap::new(),
                Vec::new(),
                Some(json!({"event": "push"})),
            ),
            ExecutionContext::new(),
        )
    }

    #[test]
    fn run_wraps_failures_with_variant_name_and_chain() {
        let (request, context) = invocation_parts();
        let invocation = Invocation {
            request: &request,
            context: &context,
        };

        let err = FailingAction.run(&invocation).unwrap_err();
        let message = err.message();
        assert!(message.starts_with("Failed to invoke FailingAction.run:"));
        assert!(message.contains("Reason: could not write output"));
        assert!(message.contains("disk full"));
    }

    #[test]
    fn run_passes_success_through() {
        let (request, context) = invocation_parts();
        let invocation = Invocation {
            request: &request,
            context: &context,
        };
        assert!(QuietAction.run(&invocation).is_ok());
    }

    #[test]
    fn signal_error_defaults_to_naming_the_action() {
        assert_eq!(
            QuietAction.signal_error("").to_string(),
            "The \"quiet\" action threw an error"
        );
        assert_eq!(
            QuietAction.signal_error("boom").to_string(),
            "boom"
        );
    }

    #[test]
    fn render_template_sees_request_variables() {
        let (request, context) = invocation_parts();
        let invocation = Invocation {
            request: &request,
            context: &context,
        };
        let out = QuietAction
            .render_template(&invocation, "{{ request.json.event }}", Map::new())
            .unwrap();
        assert_eq!(out, "push");
    }
}
