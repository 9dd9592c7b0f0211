//! # hookpipe actions
//!
//! The built-in action variants shipped with hookpipe, each implementing the
//! [`hookpipe_core::Action`] contract:
//!
//! | name | effect |
//! |---|---|
//! | `log` | log a rendered message |
//! | `execute` | run a configured process |
//! | `github-verify` | verify the GitHub HMAC body signature |
//! | `sleep` | block the pipeline for a fixed duration |
//! | `metrics` | emit one observation of a configured metric |
//! | `http` | send a templated outbound HTTP request |
//! | `eval` | render a template block for its side effects |
//!
//! Registration happens through one explicit, ordered startup call,
//! [`register_builtin_actions`] — there is no import-time magic, so the
//! registered set is deterministic and testable.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod eval;
pub mod execute;
pub mod github_verify;
pub mod http;
pub mod log;
pub mod metric;
pub mod sleep;

pub use eval::EvaluateAction;
pub use execute::ExecuteAction;
pub use github_verify::GithubVerifyAction;
pub use http::HttpAction;
pub use log::LogAction;
pub use metric::MetricAction;
pub use sleep::SleepAction;

use hookpipe_core::{ActionRegistry, ConfigurationError};

/// Register every built-in variant into `registry`, in a fixed order.
///
/// Called once at process startup, before any endpoint is constructed.
///
/// # Errors
///
/// Returns [`ConfigurationError::DuplicateAction`] if any of the built-in
/// names is already taken, e.g. when called twice.
pub fn register_builtin_actions(registry: &mut ActionRegistry) -> Result<(), ConfigurationError> {
    registry.register("log", LogAction::constructor())?;
    registry.register("execute", ExecuteAction::constructor())?;
    registry.register("github-verify", GithubVerifyAction::constructor())?;
    registry.register("sleep", SleepAction::constructor())?;
    registry.register("metrics", MetricAction::constructor())?;
    registry.register("http", HttpAction::constructor())?;
    registry.register("eval", EvaluateAction::constructor())?;
    Ok(())
}
