use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use ocppnet_core::error::{OcppNetError, Result};
use ocppnet_core::protocol::{Action, MAX_MESSAGE_ID_LEN};

use crate::forwarding::ForwardingResult;
use crate::policy::compile_rules;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub version: u32,

    pub node: NodeSection,

    #[serde(default)]
    pub forwarding: ForwardingSection,
}

impl NodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(OcppNetError::UnsupportedVersion);
        }

        self.node.validate()?;
        self.forwarding.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSection {
    /// Networking node identity, appended to the network path of relayed requests.
    pub id: String,

    /// Default destination for requests from connected peers.
    #[serde(default = "default_upstream")]
    pub upstream: String,

    #[serde(default = "default_forwarding")]
    pub default_forwarding: ForwardingResult,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl NodeSection {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(OcppNetError::BadConfig("node.id must not be empty".into()));
        }
        if self.id.len() > MAX_MESSAGE_ID_LEN {
            return Err(OcppNetError::BadConfig(format!(
                "node.id must be at most {MAX_MESSAGE_ID_LEN} characters"
            )));
        }
        if self.upstream.trim().is_empty() {
            return Err(OcppNetError::BadConfig("node.upstream must not be empty".into()));
        }
        if !(1000..=300000).contains(&self.request_timeout_ms) {
            return Err(OcppNetError::BadConfig(
                "node.request_timeout_ms must be between 1000 and 300000".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_upstream() -> String {
    "CSMS".into()
}
fn default_forwarding() -> ForwardingResult {
    ForwardingResult::Forward
}
fn default_request_timeout_ms() -> u64 {
    30000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardingSection {
    /// `Action:forward|reject|drop` or `*:...`.
    #[serde(default)]
    pub rules: Vec<String>,

    /// Message types to register. Defaults to the whole catalogue.
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,
}

impl Default for ForwardingSection {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            messages: default_messages(),
        }
    }
}

impl ForwardingSection {
    pub fn validate(&self) -> Result<()> {
        compile_rules(&self.rules)?;
        self.actions()?;
        Ok(())
    }

    /// Parsed `messages`, deduplicated, in listed order.
    pub fn actions(&self) -> Result<Vec<Action>> {
        let mut out = Vec::with_capacity(self.messages.len());
        for m in &self.messages {
            let action = Action::from_str(m)
                .map_err(|_| OcppNetError::BadConfig(format!("unknown message type: {m}")))?;
            if !out.contains(&action) {
                out.push(action);
            }
        }
        Ok(out)
    }
}

fn default_messages() -> Vec<String> {
    Action::ALL.iter().map(|a| a.as_str().to_string()).collect()
}
