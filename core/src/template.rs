//! The small templating language actions render output with.
//!
//! Templates are plain text with `{{ ... }}` expressions. An expression is
//! one of:
//!
//! - a dotted lookup into the fixed variable set — `request.method`,
//!   `request.path`, `request.headers.<name>`, `request.json.<path>`,
//!   `timestamp` (epoch seconds at render time), `datetime` (formatted
//!   render time), `context.<name>`, or any extra variable the action
//!   supplied;
//! - a quoted string literal;
//! - `context.set('name', <expression>)`, which stores a value in the
//!   per-execution context and renders as nothing;
//! - `error()` or `error('message')`, which aborts rendering with a
//!   caller-visible error (the default message names the action).
//!
//! Rendering is synchronous and has no side effect beyond `context.set` and
//! the error callback. An unresolvable lookup renders as the empty string.

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use serde_json::{Map, Number, Value};

use crate::context::ExecutionContext;
use crate::request::RequestSnapshot;

/// The variable set one render call evaluates against.
pub struct TemplateScope<'a> {
    action_name: &'a str,
    request: &'a RequestSnapshot,
    context: &'a ExecutionContext,
    extras: Map<String, Value>,
}

impl<'a> TemplateScope<'a> {
    /// Build a scope for one action invocation.
    #[must_use]
    pub const fn new(
        action_name: &'a str,
        request: &'a RequestSnapshot,
        context: &'a ExecutionContext,
        extras: Map<String, Value>,
    ) -> Self {
        Self {
            action_name,
            request,
            context,
            extras,
        }
    }
}

/// Render `template` against `scope`.
///
/// # Errors
///
/// Fails on an unterminated or malformed expression, or when the template
/// invokes the `error(...)` callback.
pub fn render(template: &str, scope: &TemplateScope<'_>) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let (text, tail) = rest.split_at(start);
        output.push_str(text);
        let tail = &tail[2..];
        let end = tail
            .find("}}")
            .ok_or_else(|| anyhow!("unterminated template expression"))?;
        let (expr, remainder) = tail.split_at(end);
        output.push_str(&eval(expr.trim(), scope)?);
        rest = &remainder[2..];
    }
    output.push_str(rest);
    Ok(output)
}

fn eval(expr: &str, scope: &TemplateScope<'_>) -> Result<String> {
    if expr.is_empty() {
        bail!("empty template expression");
    }
    if let Some(args) = call_args(expr, "error") {
        let message = match parse_args(args)?.as_slice() {
            [] => format!("The \"{}\" action threw an error", scope.action_name),
            [message] => value_to_text(&evaluate_argument(message, scope)),
            _ => bail!("error() takes at most one argument"),
        };
        bail!(message);
    }
    if let Some(args) = call_args(expr, "context.set") {
        let args = parse_args(args)?;
        let [name, value] = args.as_slice() else {
            bail!("context.set() takes exactly two arguments");
        };
        let Value::String(name) = evaluate_argument(name, scope) else {
            bail!("context.set() requires a string name");
        };
        scope.context.set(name, evaluate_argument(value, scope));
        return Ok(String::new());
    }
    Ok(value_to_text(&evaluate_argument(expr, scope)))
}

/// The argument list of `name(...)`, if `expr` is a call of that shape.
fn call_args<'e>(expr: &'e str, name: &str) -> Option<&'e str> {
    expr.strip_prefix(name)
        .and_then(|rest| rest.trim_start().strip_prefix('('))
        .and_then(|rest| rest.trim_end().strip_suffix(')'))
}

/// Split an argument list on commas that are not inside quotes.
fn parse_args(input: &str) -> Result<Vec<&str>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth_quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in trimmed.char_indices() {
        match (ch, depth_quote) {
            ('\'' | '"', None) => depth_quote = Some(ch),
            (close, Some(open)) if close == open => depth_quote = None,
            (',', None) => {
                args.push(trimmed[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth_quote.is_some() {
        bail!("unterminated string literal in template arguments");
    }
    args.push(trimmed[start..].trim());
    Ok(args)
}

/// Evaluate a literal or dotted-path argument to a JSON value.
fn evaluate_argument(expr: &str, scope: &TemplateScope<'_>) -> Value {
    if let Some(literal) = string_literal(expr) {
        return Value::String(literal.to_string());
    }
    if let Ok(number) = expr.parse::<i64>() {
        return Value::Number(Number::from(number));
    }
    if let Ok(number) = expr.parse::<f64>() {
        if let Some(number) = Number::from_f64(number) {
            return Value::Number(number);
        }
    }
    resolve_path(expr, scope).unwrap_or(Value::Null)
}

fn string_literal(expr: &str) -> Option<&str> {
    let inner = expr
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .or_else(|| expr.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')))?;
    Some(inner)
}

fn resolve_path(path: &str, scope: &TemplateScope<'_>) -> Option<Value> {
    let mut segments = path.split('.');
    let head = segments.next()?;
    match head {
        "timestamp" => Some(Value::Number(Number::from(Utc::now().timestamp()))),
        "datetime" => Some(Value::String(
            Utc::now().format("%a %b %e %H:%M:%S %Y").to_string(),
        )),
        "request" => resolve_request(segments, scope.request),
        "context" => {
            let name = segments.next()?;
            walk(&scope.context.get(name)?, segments).cloned()
        }
        extra => walk(scope.extras.get(extra)?, segments).cloned(),
    }
}

fn resolve_request<'p>(
    mut segments: impl Iterator<Item = &'p str>,
    request: &RequestSnapshot,
) -> Option<Value> {
    match segments.next() {
        None => Some(Value::String(format!(
            "{} {}",
            request.method(),
            request.path()
        ))),
        Some("method") => Some(Value::String(request.method().to_string())),
        Some("path") => Some(Value::String(request.path().to_string())),
        Some("headers") => {
            let name = segments.next()?;
            request
                .header(name)
                .map(|value| Value::String(value.to_string()))
        }
        Some("json") => walk(request.json()?, segments).cloned(),
        Some(_) => None,
    }
}

/// Descend into a JSON value along the remaining path segments. Numeric
/// segments index into arrays.
fn walk<'v, 'p>(
    mut value: &'v Value,
    segments: impl Iterator<Item = &'p str>,
) -> Option<&'v Value> {
    for segment in segments {
        value = match value {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

/// Render a JSON value into template output: strings bare, null empty,
/// everything else as compact JSON.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use serde_json::json;

    fn snapshot() -> RequestSnapshot {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-GitHub-Event",
            http::header::HeaderValue::from_static("push"),
        );
        RequestSnapshot::new(
            "POST",
            "/hooks/ci",
            headers,
            Vec::new(),
            Some(json!({
                "repository": {"name": "hookpipe"},
                "commits": [{"id": "abc123"}],
            })),
        )
    }

    fn render_with(template: &str, extras: Map<String, Value>) -> Result<String> {
        let request = snapshot();
        let context = ExecutionContext::new();
        context.set("build", json!("42"));
        let scope = TemplateScope::new("log", &request, &context, extras);
        render(template, &scope)
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render_with("no expressions here", Map::new()).unwrap(), "no expressions here");
    }

    #[test]
    fn request_fields_interpolate() {
        let out = render_with("{{ request.method }} {{ request.path }}", Map::new()).unwrap();
        assert_eq!(out, "POST /hooks/ci");
    }

    #[test]
    fn request_renders_as_method_and_path() {
        assert_eq!(render_with("{{ request }}", Map::new()).unwrap(), "POST /hooks/ci");
    }

    #[test]
    fn header_and_json_paths_resolve() {
        let out = render_with(
            "{{ request.headers.x-github-event }}:{{ request.json.repository.name }}",
            Map::new(),
        )
        .unwrap();
        assert_eq!(out, "push:hookpipe");
    }

    #[test]
    fn array_segments_index_numerically() {
        let out = render_with("{{ request.json.commits.0.id }}", Map::new()).unwrap();
        assert_eq!(out, "abc123");
    }

    #[test]
    fn unresolvable_lookup_renders_empty() {
        assert_eq!(render_with("[{{ request.json.missing }}]", Map::new()).unwrap(), "[]");
    }

    #[test]
    fn context_reads_and_writes() {
        let request = snapshot();
        let context = ExecutionContext::new();
        let scope = TemplateScope::new("eval", &request, &context, Map::new());

        let out = render("{{ context.set('sha', request.json.commits.0.id) }}ok", &scope).unwrap();
        assert_eq!(out, "ok");
        assert_eq!(context.get("sha"), Some(json!("abc123")));

        let out = render("sha={{ context.sha }}", &scope).unwrap();
        assert_eq!(out, "sha=abc123");
    }

    #[test]
    fn extras_shadow_nothing_and_resolve() {
        let mut extras = Map::new();
        extras.insert("result".to_string(), json!({"status": 201}));
        let out = render_with("status={{ result.status }}", extras).unwrap();
        assert_eq!(out, "status=201");
    }

    #[test]
    fn error_callback_uses_default_message() {
        let err = render_with("{{ error() }}", Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "The \"log\" action threw an error");
    }

    #[test]
    fn error_callback_uses_given_message() {
        let err = render_with("{{ error('signature mismatch') }}", Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "signature mismatch");
    }

    #[test]
    fn unterminated_expression_fails() {
        assert!(render_with("{{ request.method", Map::new()).is_err());
    }

    #[test]
    fn timestamp_is_numeric() {
        let out = render_with("{{ timestamp }}", Map::new()).unwrap();
        assert!(out.parse::<i64>().is_ok());
    }
}
