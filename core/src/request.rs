//! Owned snapshot of an inbound request.
//!
//! The dispatcher captures one [`RequestSnapshot`] per accepted request and
//! hands it to the action pipeline. Because the snapshot owns its data it can
//! be moved onto a detached execution unit that outlives the triggering
//! request, and actions on that path observe exactly the values the inline
//! path would.

use http::HeaderMap;
use serde_json::Value;

/// Immutable copy of the parts of a request that actions may consume.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: String,
    path: String,
    headers: HeaderMap,
    raw_body: Vec<u8>,
    json: Option<Value>,
}

impl RequestSnapshot {
    /// Capture a snapshot from already-parsed request parts.
    ///
    /// `json` is `None` when the transport layer could not parse the body as
    /// JSON (absent body, wrong content type, malformed document).
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: HeaderMap,
        raw_body: Vec<u8>,
        json: Option<Value>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers,
            raw_body,
            json,
        }
    }

    /// The request method, e.g. `POST`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path, e.g. `/hooks/deploy`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A single header value, if present and valid UTF-8. Lookup is
    /// case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The unparsed body bytes, as received on the wire.
    #[must_use]
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// The parsed JSON body, if the transport layer produced one.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }
}
