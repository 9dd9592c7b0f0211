//! # hookpipe web
//!
//! Axum integration for the hookpipe webhook receiver: turns a table of
//! configured [`Endpoint`]s into a [`Router`] whose handlers run the
//! request-validation and action-dispatch engine.
//!
//! # Response contract
//!
//! | condition | status | body |
//! |---|---|---|
//! | body rules declared, no JSON payload | 400 | `No payload` |
//! | header/body rule mismatch | 409 | `Invalid payload` |
//! | synchronous pipeline failure | 500 | `Internal Server Error` |
//! | accepted (inline success or detached launch) | 200 | `OK\n` |
//!
//! No internal error detail crosses the wire; diagnostics go to the
//! server-side log.
//!
//! # Delivery semantics
//!
//! Endpoints declared `async` acknowledge accepted requests immediately and
//! run their pipeline on a detached task. This is at-most-once with no
//! confirmation: there is no queue, no bound on in-flight pipelines, no
//! cancellation, and failures are logged and discarded.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod endpoint;
pub mod metrics;

pub use endpoint::Endpoint;
pub use metrics::register_metrics;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::OriginalUri;
use axum::routing::{on, MethodFilter};
use axum::Router;
use hookpipe_core::ConfigurationError;
use http::HeaderMap;

/// Build a router serving every configured endpoint.
///
/// Each endpoint claims its declared route and method; requests with the
/// right route but the wrong method get axum's `405 Method Not Allowed`.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidMethod`] for a method axum cannot
/// route.
pub fn build_router(endpoints: Vec<Endpoint>) -> Result<Router, ConfigurationError> {
    let mut router = Router::new();
    for endpoint in endpoints {
        let endpoint = Arc::new(endpoint);
        let filter = MethodFilter::try_from(endpoint.method().clone()).map_err(|_| {
            ConfigurationError::InvalidMethod {
                route: endpoint.route().to_string(),
                method: endpoint.method().to_string(),
            }
        })?;

        tracing::info!(
            route = %endpoint.route(),
            method = %endpoint.method(),
            "registering endpoint"
        );

        let handler_endpoint = Arc::clone(&endpoint);
        let handler = move |OriginalUri(uri): OriginalUri, headers: HeaderMap, body: Bytes| {
            let endpoint = Arc::clone(&handler_endpoint);
            endpoint.handle(uri.path().to_string(), headers, body)
        };

        router = router.route(endpoint.route(), on(filter, handler));
    }
    Ok(router)
}
