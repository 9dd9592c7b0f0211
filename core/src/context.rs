//! Per-execution key-value storage for template rendering.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

/// Key-value store scoped to one pipeline execution.
///
/// Templates read entries through the `context` variable and write them with
/// `context.set(...)`. Each execution — the inline run of a synchronous
/// endpoint, or one detached background pipeline — owns exactly one instance,
/// so values set by one request can never be observed by another.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    values: Mutex<HashMap<String, Value>>,
}

impl ExecutionContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `name`, replacing any previous value.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(name.into(), value);
        }
    }

    /// Fetch a copy of the value stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.lock().ok().and_then(|values| values.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_round_trips() {
        let ctx = ExecutionContext::new();
        ctx.set("commit", json!("abc123"));
        assert_eq!(ctx.get("commit"), Some(json!("abc123")));
    }

    #[test]
    fn get_of_unset_name_is_none() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn set_replaces_previous_value() {
        let ctx = ExecutionContext::new();
        ctx.set("n", json!(1));
        ctx.set("n", json!(2));
        assert_eq!(ctx.get("n"), Some(json!(2)));
    }
}
