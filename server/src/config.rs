//! Configuration file loading for the server binary.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use hookpipe_core::EndpointConfig;
use serde::Deserialize;

/// The whole configuration file: a list of endpoint declarations.
///
/// ```json
/// {
///   "endpoints": [
///     {
///       "route": "/hooks/ci",
///       "method": "POST",
///       "body": {"event": "^push$"},
///       "actions": [{"log": {"message": "push on {{ request.json.ref }}"}}]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Every declared endpoint, in file order.
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl ServerConfig {
    /// Load and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse as a
    /// configuration document.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read configuration file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("could not parse configuration file {}", path.display()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn full_configuration_parses() {
        let config: ServerConfig = serde_json::from_str(
            r#"{
                "endpoints": [
                    {
                        "route": "/hooks/ci",
                        "body": {"event": "^push$"},
                        "async": true,
                        "actions": [
                            {"github-verify": {"secret": "s3cret"}},
                            {"log": {"message": "push received"}}
                        ]
                    },
                    {"route": "/hooks/ping"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.endpoints.len(), 2);
        let first = config.endpoints.first().unwrap();
        assert!(first.detached);
        assert_eq!(first.action_specs().unwrap().len(), 2);
    }

    #[test]
    fn empty_document_means_no_endpoints() {
        let config: ServerConfig = serde_json::from_str("{}").unwrap();
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        assert!(serde_json::from_str::<ServerConfig>(r#"{"endpoint": []}"#).is_err());
    }
}
