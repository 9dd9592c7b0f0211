//! Declarative acceptance rules for inbound requests.
//!
//! A rule set is a tree of prefix-anchored regular expressions: a leaf
//! constrains one value, an internal node recurses into a nested JSON object,
//! and a rule applied to a list value is checked against every element. Rules
//! are compiled once at endpoint construction; a pattern that fails to
//! compile is a [`ConfigurationError`], never a runtime surprise.
//!
//! Matching semantics, pinned by tests:
//! - patterns are *prefix* matches — anchored at the start of the value but
//!   not required to consume it fully;
//! - only declared keys constrain the request, undeclared payload keys are
//!   ignored;
//! - a declared key absent from the payload is matched as the empty string
//!   (pattern leaf) or the empty object (nested node), so a pattern that
//!   accepts `""` accepts the absent field.

use http::HeaderMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ConfigurationError;

/// A single compiled pattern, anchored at the start of its input.
#[derive(Debug, Clone)]
pub struct PrefixPattern {
    raw: String,
    regex: Regex,
}

impl PrefixPattern {
    /// Compile `pattern`, anchoring it at position zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidPattern`] when the pattern is not
    /// a valid regular expression; `path` names the offending rule.
    pub fn compile(pattern: &str, path: &str) -> Result<Self, ConfigurationError> {
        // The non-capturing group keeps top-level alternations anchored.
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|cause| {
            ConfigurationError::InvalidPattern {
                path: path.to_string(),
                cause,
            }
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Whether `value` starts with a match of this pattern.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The pattern as declared in configuration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// One node of a rule tree.
#[derive(Debug, Clone)]
pub enum MatchRule {
    /// Leaf: the value must prefix-match this pattern.
    Pattern(PrefixPattern),
    /// Node: the value must be an object satisfying the nested rules.
    Object(RuleSet),
}

/// An ordered set of `(key, rule)` pairs, applied to a JSON object.
///
/// Iteration order is the declared configuration order, which keeps matcher
/// diagnostics deterministic.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<(String, MatchRule)>,
}

impl RuleSet {
    /// Compile a rule set from its configuration mapping.
    ///
    /// String values become pattern leaves, nested mappings recurse; anything
    /// else is rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for an invalid pattern or a rule
    /// value of an unsupported type.
    pub fn compile(declared: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        Self::compile_at(declared, "")
    }

    fn compile_at(declared: &Map<String, Value>, prefix: &str) -> Result<Self, ConfigurationError> {
        let mut rules = Vec::with_capacity(declared.len());
        for (key, value) in declared {
            let path = join_path(prefix, key);
            let rule = match value {
                Value::String(pattern) => MatchRule::Pattern(PrefixPattern::compile(pattern, &path)?),
                Value::Object(nested) => MatchRule::Object(Self::compile_at(nested, &path)?),
                _ => return Err(ConfigurationError::InvalidRule { path }),
            };
            rules.push((key.clone(), rule));
        }
        Ok(Self { rules })
    }

    /// Compile a flat rule set where every rule must be a pattern leaf.
    ///
    /// Header rules have no nesting; declaring a mapping for a header is a
    /// configuration mistake caught here rather than at request time.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for an invalid pattern or a non-string
    /// rule value.
    pub fn compile_flat(declared: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        let mut rules = Vec::with_capacity(declared.len());
        for (key, value) in declared {
            let Value::String(pattern) = value else {
                return Err(ConfigurationError::InvalidHeaderRule { name: key.clone() });
            };
            rules.push((
                key.clone(),
                MatchRule::Pattern(PrefixPattern::compile(pattern, key)?),
            ));
        }
        Ok(Self { rules })
    }

    /// Whether this set declares no rules. An empty set accepts anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check every declared header rule against `headers`.
    ///
    /// An absent header is matched as the empty string. Undeclared headers
    /// are ignored.
    #[must_use]
    pub fn matches_headers(&self, headers: &HeaderMap) -> bool {
        for (key, rule) in &self.rules {
            let MatchRule::Pattern(pattern) = rule else {
                // compile_flat rejects nested header rules up front.
                return false;
            };
            let value = headers
                .get(key.as_str())
                .and_then(|value| value.to_str().ok())
                .unwrap_or("");
            if !pattern.is_match(value) {
                tracing::warn!(
                    header = %key,
                    value = %value,
                    pattern = %pattern.as_str(),
                    "failed to validate header"
                );
                return false;
            }
        }
        true
    }

    /// Check the rule tree against a JSON body.
    ///
    /// Anything that is not an object at the root is matched as if it were
    /// the empty object, which only an all-empty-accepting rule set passes.
    #[must_use]
    pub fn matches_body(&self, body: &Value) -> bool {
        let empty = Map::new();
        let data = body.as_object().unwrap_or(&empty);
        self.accept_object(data, "")
    }

    fn accept_object(&self, data: &Map<String, Value>, prefix: &str) -> bool {
        for (key, rule) in &self.rules {
            let path = join_path(prefix, key);
            let value = data.get(key);
            let accepted = match value {
                // A list value is matched element-wise; every element must pass.
                Some(Value::Array(items)) => items
                    .iter()
                    .enumerate()
                    .all(|(idx, item)| rule.check(Some(item), &format!("{path}[{idx}]"))),
                other => rule.check(other, &path),
            };
            if !accepted {
                return false;
            }
        }
        true
    }
}

impl MatchRule {
    /// Apply one rule to one value. `None` means the key was absent from the
    /// payload and triggers the empty-string / empty-object default.
    fn check(&self, value: Option<&Value>, path: &str) -> bool {
        match self {
            Self::Object(nested) => match value {
                Some(Value::Object(map)) => nested.accept_object(map, path),
                None => nested.accept_object(&Map::new(), path),
                Some(other) => {
                    tracing::warn!(
                        path = %path,
                        value = %render_value(other),
                        "failed to validate: expected a nested object"
                    );
                    false
                }
            },
            Self::Pattern(pattern) => {
                let text = value.map_or_else(String::new, render_value);
                if pattern.is_match(&text) {
                    true
                } else {
                    tracing::warn!(
                        path = %path,
                        value = %text,
                        pattern = %pattern.as_str(),
                        "failed to validate body field"
                    );
                    false
                }
            }
        }
    }
}

/// Render a JSON value the way configuration authors see it on the wire:
/// strings bare, everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Extend a dotted diagnostic path. The leading separator is stripped so the
/// root level reads `event`, not `.event`.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use serde_json::json;

    fn ruleset(declared: Value) -> RuleSet {
        let map = declared.as_object().expect("rule fixture must be an object");
        RuleSet::compile(map).expect("rule fixture must compile")
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                http::header::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn prefix_match_does_not_require_full_consumption() {
        let rules = ruleset(json!({"event": "pu"}));
        assert!(rules.matches_body(&json!({"event": "push"})));
        assert!(!rules.matches_body(&json!({"event": "repush"})));
    }

    #[test]
    fn anchored_pattern_with_alternation_stays_anchored() {
        let rules = ruleset(json!({"event": "push|pull"}));
        assert!(rules.matches_body(&json!({"event": "pull_request"})));
        assert!(!rules.matches_body(&json!({"event": "git-push"})));
    }

    #[test]
    fn undeclared_payload_keys_are_ignored() {
        let rules = ruleset(json!({"event": "^push$"}));
        assert!(rules.matches_body(&json!({"event": "push", "ref": "main"})));
    }

    #[test]
    fn nested_rules_recurse() {
        let rules = ruleset(json!({"a": {"b": "^x"}}));
        assert!(rules.matches_body(&json!({"a": {"b": "xyz"}})));
        assert!(!rules.matches_body(&json!({"a": {"b": "yzz"}})));
        assert!(!rules.matches_body(&json!({"a": "not-an-object"})));
    }

    #[test]
    fn list_values_match_element_wise() {
        let rules = ruleset(json!({"items": "^ok"}));
        assert!(rules.matches_body(&json!({"items": ["ok1", "ok2"]})));
        assert!(!rules.matches_body(&json!({"items": ["ok1", "bad"]})));
    }

    #[test]
    fn list_of_objects_matches_each_element() {
        let rules = ruleset(json!({"commits": {"id": "^[0-9a-f]+$"}}));
        assert!(rules.matches_body(&json!({"commits": [{"id": "ab12"}, {"id": "34cd"}]})));
        assert!(!rules.matches_body(&json!({"commits": [{"id": "ab12"}, {"id": "oops!"}]})));
    }

    #[test]
    fn absent_string_field_matches_as_empty_string() {
        // The declared-but-absent default is load-bearing: patterns that
        // accept "" accept the missing field.
        let permissive = ruleset(json!({"optional": ".*"}));
        assert!(permissive.matches_body(&json!({})));

        let strict = ruleset(json!({"required": ".+"}));
        assert!(!strict.matches_body(&json!({})));
    }

    #[test]
    fn absent_object_field_matches_as_empty_object() {
        let permissive = ruleset(json!({"meta": {"tag": ".*"}}));
        assert!(permissive.matches_body(&json!({})));

        let strict = ruleset(json!({"meta": {"tag": ".+"}}));
        assert!(!strict.matches_body(&json!({})));
    }

    #[test]
    fn empty_ruleset_accepts_any_body() {
        let rules = ruleset(json!({}));
        assert!(rules.matches_body(&json!({"anything": "goes"})));
        assert!(rules.matches_body(&Value::Null));
    }

    #[test]
    fn non_string_scalars_match_their_json_rendering() {
        let rules = ruleset(json!({"count": "^42$", "flag": "^true$"}));
        assert!(rules.matches_body(&json!({"count": 42, "flag": true})));
        assert!(!rules.matches_body(&json!({"count": 43, "flag": true})));
    }

    #[test]
    fn header_rules_prefix_match_declared_headers() {
        let declared = json!({"X-GitHub-Event": "^push$"});
        let rules = RuleSet::compile_flat(declared.as_object().unwrap()).unwrap();

        assert!(rules.matches_headers(&headers(&[("x-github-event", "push")])));
        assert!(!rules.matches_headers(&headers(&[("x-github-event", "pull_request")])));
        // Absent header matches as "".
        assert!(!rules.matches_headers(&headers(&[])));
    }

    #[test]
    fn undeclared_headers_do_not_affect_acceptance() {
        let declared = json!({"X-Token": "^secret"});
        let rules = RuleSet::compile_flat(declared.as_object().unwrap()).unwrap();
        assert!(rules.matches_headers(&headers(&[
            ("x-token", "secret-1"),
            ("user-agent", "GitHub-Hookshot/abc"),
        ])));
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let declared = json!({"event": "["});
        let err = RuleSet::compile(declared.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPattern { ref path, .. } if path == "event"));
    }

    #[test]
    fn non_string_rule_leaf_is_a_configuration_error() {
        let declared = json!({"event": 42});
        let err = RuleSet::compile(declared.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidRule { ref path } if path == "event"));
    }

    #[test]
    fn nested_header_rule_is_a_configuration_error() {
        let declared = json!({"X-Meta": {"a": "b"}});
        let err = RuleSet::compile_flat(declared.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidHeaderRule { ref name } if name == "X-Meta"));
    }
}
