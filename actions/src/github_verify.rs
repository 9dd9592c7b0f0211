//! The `github-verify` action: HMAC signature verification for GitHub hooks.
//!
//! GitHub signs deliveries with `X-Hub-Signature-256: sha256=<hmac-hex>`
//! computed over the raw request body. This action recomputes the digest
//! with the configured secret and fails the pipeline when the header is
//! absent, malformed, or does not match. Place it first in a pipeline to
//! gate every later action on an authentic sender.

use anyhow::{bail, Result};
use hmac::{Hmac, Mac};
use hookpipe_core::registry::{ActionConstructor, ActionSettings};
use hookpipe_core::{Action, Invocation};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
const SIGNATURE_PREFIX: &str = "sha256=";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GithubVerifySettings {
    secret: String,
}

/// Verifies the GitHub HMAC signature of the raw request body.
pub struct GithubVerifyAction {
    secret: Vec<u8>,
}

impl GithubVerifyAction {
    /// The registry constructor for this variant.
    #[must_use]
    pub fn constructor() -> ActionConstructor {
        Box::new(|settings: &ActionSettings| {
            let settings: GithubVerifySettings =
                serde_json::from_value(Value::Object(settings.clone()))?;
            if settings.secret.is_empty() {
                bail!("secret must not be empty");
            }
            Ok(Box::new(Self {
                secret: settings.secret.into_bytes(),
            }) as Box<dyn Action>)
        })
    }

    fn expected_signature(&self, body: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| anyhow::anyhow!("invalid HMAC key length"))?;
        mac.update(body);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl Action for GithubVerifyAction {
    fn name(&self) -> &str {
        "github-verify"
    }

    fn kind(&self) -> &'static str {
        "GithubVerifyAction"
    }

    fn execute(&self, invocation: &Invocation<'_>) -> Result<()> {
        let Some(header) = invocation.request.header(SIGNATURE_HEADER) else {
            bail!("the {SIGNATURE_HEADER} header is missing");
        };
        let Some(encoded) = header.strip_prefix(SIGNATURE_PREFIX) else {
            bail!("the {SIGNATURE_HEADER} header is not a sha256 signature");
        };
        let Ok(claimed) = hex::decode(encoded) else {
            bail!("the {SIGNATURE_HEADER} header is not valid hex");
        };

        let expected = self.expected_signature(invocation.request.raw_body())?;
        if expected.as_slice().ct_eq(claimed.as_slice()).into() {
            tracing::debug!(action = self.name(), "signature verified");
            Ok(())
        } else {
            Err(self.signal_error("the request signature does not match"))
        }
    }
}
