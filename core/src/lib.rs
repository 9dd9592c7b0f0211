//! # hookpipe core
//!
//! Request-validation and action-dispatch primitives for the hookpipe
//! webhook receiver.
//!
//! Endpoints are declared in data: a route, the accepted method, header and
//! body acceptance rules, and an ordered pipeline of named actions. This
//! crate provides everything below the HTTP layer:
//!
//! - **[`action`]** — the capability contract every action variant
//!   implements, with uniform error wrapping in the provided `run()`.
//! - **[`registry`]** — the explicit name → constructor table populated at
//!   startup.
//! - **[`rules`]** — compiled prefix-pattern rule trees for header and body
//!   acceptance, recursive for nested objects and element-wise for lists.
//! - **[`template`]** — the small `{{ ... }}` templating language actions
//!   render output with.
//! - **[`context`]** / **[`request`]** — the per-execution key-value store
//!   and the owned request snapshot a pipeline (inline or detached) runs
//!   against.
//! - **[`config`]** — serde shapes for endpoint declarations.
//! - **[`error`]** — the two-kind error taxonomy: configuration-time
//!   failures that abort startup, invocation-time failures that the
//!   dispatcher logs and maps to an HTTP status.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod request;
pub mod rules;
pub mod template;

pub use action::{Action, Invocation};
pub use config::{ActionEntry, ActionSpec, EndpointConfig};
pub use context::ExecutionContext;
pub use error::{ConfigurationError, InvocationError};
pub use registry::{ActionConstructor, ActionRegistry, ActionSettings};
pub use request::RequestSnapshot;
pub use rules::{MatchRule, PrefixPattern, RuleSet};
