//! One configured endpoint and its per-request state machine.
//!
//! A request travels through three checks, each terminal on failure:
//!
//! 1. **payload presence** — body rules declared but no JSON body parsed:
//!    `400 No payload`;
//! 2. **acceptance** — header or body rules unsatisfied: `409 Invalid
//!    payload`;
//! 3. **dispatch** — synchronous endpoints run the pipeline inline and map
//!    a pipeline failure to `500 Internal Server Error`; detached endpoints
//!    launch the pipeline on a background task and acknowledge immediately.
//!
//! Every accepted request is answered `200 OK` with body `OK\n`.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use http::{HeaderMap, Method, StatusCode};
use hookpipe_core::{
    Action, ActionRegistry, ConfigurationError, EndpointConfig, ExecutionContext, Invocation,
    InvocationError, RequestSnapshot, RuleSet,
};
use serde_json::Value;

use crate::metrics::{ActionMetrics, RequestMetrics};

/// A configured route with its acceptance rules and action pipeline.
///
/// Constructed once at startup; the action list is immutable afterwards.
pub struct Endpoint {
    route: String,
    method: Method,
    detached: bool,
    header_rules: RuleSet,
    body_rules: RuleSet,
    actions: Vec<Box<dyn Action>>,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("route", &self.route)
            .field("method", &self.method)
            .field("detached", &self.detached)
            .field("header_rules", &self.header_rules)
            .field("body_rules", &self.body_rules)
            .field(
                "actions",
                &self.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Endpoint {
    /// Build an endpoint from its declaration, constructing every action
    /// through `registry`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for an empty route, an unparseable
    /// method, invalid rules, or any action that fails to construct.
    pub fn from_config(
        config: &EndpointConfig,
        registry: &ActionRegistry,
    ) -> Result<Self, ConfigurationError> {
        if config.route.is_empty() {
            return Err(ConfigurationError::MissingRoute);
        }

        let method = Method::from_bytes(config.method().as_bytes()).map_err(|_| {
            ConfigurationError::InvalidMethod {
                route: config.route.clone(),
                method: config.method().to_string(),
            }
        })?;

        let header_rules = RuleSet::compile_flat(&config.headers)?;
        let body_rules = RuleSet::compile(&config.body)?;

        let mut actions = Vec::new();
        for spec in config.action_specs()? {
            actions.push(registry.create(&spec.name, &spec.settings)?);
        }

        Ok(Self {
            route: config.route.clone(),
            method,
            detached: config.detached,
            header_rules,
            body_rules,
            actions,
        })
    }

    /// The declared route path.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The accepted HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Handle one inbound request, terminal after the returned response.
    pub async fn handle(
        self: Arc<Self>,
        path: String,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, &'static str) {
        let endpoint = Arc::clone(&self);
        let (status, message) = endpoint.dispatch(path, headers, body).await;
        RequestMetrics::record(&self.route, status.as_u16());
        (status, message)
    }

    async fn dispatch(
        self: Arc<Self>,
        path: String,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, &'static str) {
        let json: Option<Value> = serde_json::from_slice(&body).ok();

        if json.is_none() && !self.body_rules.is_empty() {
            return (StatusCode::BAD_REQUEST, "No payload");
        }

        if !self.accept(&headers, json.as_ref().unwrap_or(&Value::Null)) {
            return (StatusCode::CONFLICT, "Invalid payload");
        }

        let snapshot = RequestSnapshot::new(
            self.method.as_str(),
            path,
            headers,
            body.to_vec(),
            json,
        );

        if self.detached {
            // Fire and forget: the pipeline outlives this request and reports
            // no result back. Failures are logged by the task itself.
            let endpoint = Arc::clone(&self);
            drop(tokio::task::spawn_blocking(move || {
                if let Err(err) = endpoint.run_pipeline(&snapshot) {
                    tracing::error!(
                        route = %endpoint.route,
                        error = %err,
                        "detached pipeline failed"
                    );
                }
            }));
        } else {
            let endpoint = Arc::clone(&self);
            let outcome =
                tokio::task::spawn_blocking(move || endpoint.run_pipeline(&snapshot)).await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(route = %self.route, error = %err, "pipeline failed");
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                }
                Err(join_error) => {
                    tracing::error!(
                        route = %self.route,
                        error = %join_error,
                        "pipeline task panicked"
                    );
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                }
            }
        }

        (StatusCode::OK, "OK\n")
    }

    /// Whether the declared header and body rules accept this request.
    fn accept(&self, headers: &HeaderMap, body: &Value) -> bool {
        self.header_rules.matches_headers(headers) && self.body_rules.matches_body(body)
    }

    /// Run the action pipeline in declared order, stopping at the first
    /// failure. Each step is timed whether it succeeds or fails.
    fn run_pipeline(&self, request: &RequestSnapshot) -> Result<(), InvocationError> {
        let context = ExecutionContext::new();
        let invocation = Invocation {
            request,
            context: &context,
        };

        for (ordinal, action) in self.actions.iter().enumerate() {
            let started = Instant::now();
            let result = action.run(&invocation);
            ActionMetrics::record(
                &self.route,
                self.method.as_str(),
                action.name(),
                ordinal,
                started.elapsed(),
            );
            result?;
        }
        Ok(())
    }
}
