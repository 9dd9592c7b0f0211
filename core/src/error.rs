//! The two error kinds of the engine.
//!
//! [`ConfigurationError`] is raised only while the system is being built
//! (registry misuse, bad endpoint declarations) and aborts startup.
//! [`InvocationError`] is raised only while an action pipeline is running and
//! is what the dispatcher logs and maps to an HTTP status.

use std::fmt::Write as _;

use thiserror::Error;

/// Errors raised while constructing endpoints and actions.
///
/// These surface before the server accepts any traffic; they are never
/// produced during request handling.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// An endpoint declaration had an empty route.
    #[error("an endpoint must have its route defined")]
    MissingRoute,

    /// A second constructor was registered under an existing name.
    #[error("action already registered: {0}")]
    DuplicateAction(String),

    /// An action name was looked up that no constructor was registered for.
    #[error("unknown action: {name} (registered: {})", .known.join(", "))]
    UnknownAction {
        /// The name that was requested.
        name: String,
        /// Every name the registry currently knows, sorted.
        known: Vec<String>,
    },

    /// A registered constructor itself failed.
    #[error("failed to create action: {name} (settings = {settings})\n  reason: {cause:#}")]
    ActionConstruction {
        /// Declared action name.
        name: String,
        /// The settings mapping the constructor was called with, rendered as JSON.
        settings: String,
        /// Underlying constructor failure.
        #[source]
        cause: anyhow::Error,
    },

    /// An action entry carried settings that were not a mapping.
    #[error("settings for action \"{name}\" must be a mapping, got {found}")]
    InvalidActionSettings {
        /// Declared action name.
        name: String,
        /// JSON type of the offending settings value.
        found: &'static str,
    },

    /// A rule leaf failed to compile as a regular expression.
    #[error("invalid pattern at \"{path}\": {cause}")]
    InvalidPattern {
        /// Dotted path of the rule inside the rule set.
        path: String,
        /// The regex compile error.
        #[source]
        cause: regex::Error,
    },

    /// A rule node was neither a string pattern nor a nested mapping.
    #[error("rule at \"{path}\" must be a pattern string or a nested mapping")]
    InvalidRule {
        /// Dotted path of the rule inside the rule set.
        path: String,
    },

    /// A header rule was a nested mapping; header rules must be flat patterns.
    #[error("header rule \"{name}\" must be a pattern string")]
    InvalidHeaderRule {
        /// The offending header name.
        name: String,
    },

    /// The declared HTTP method is not a method axum can route.
    #[error("endpoint {route} declares unsupported method \"{method}\"")]
    InvalidMethod {
        /// Route of the endpoint.
        route: String,
        /// The declared method string.
        method: String,
    },
}

/// Error raised by a running action.
///
/// Every failure escaping an action's body is wrapped into this single
/// human-readable diagnostic, so the dispatcher can log and propagate all
/// variants identically. The message carries the variant's type name, the
/// proximate cause, and the full source chain, indented.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct InvocationError {
    message: String,
}

impl InvocationError {
    /// Wrap a caller-supplied message, as `signal_error` and the template
    /// `error()` callback do.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap a failure escaping `<variant>.run` with its full cause chain.
    #[must_use]
    pub fn wrap(variant: &str, cause: &anyhow::Error) -> Self {
        let mut trace = String::new();
        for entry in cause.chain() {
            let _ = writeln!(trace, "  {entry}");
        }
        Self {
            message: format!(
                "Failed to invoke {variant}.run:\n  Reason: {cause}\nCause:\n{trace}"
            ),
        }
    }

    /// The full diagnostic string.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
