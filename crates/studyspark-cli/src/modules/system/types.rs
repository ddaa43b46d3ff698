use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use studyspark_core::RetryPolicy;

use crate::modules::auth::SessionContext;

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct CliConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub base_delay_ms: Option<u64>,
}

impl RetryConfig {
    pub fn policy(&self, base_delay_override: Option<u64>) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay_ms: base_delay_override
                .or(self.base_delay_ms)
                .unwrap_or(defaults.base_delay_ms),
            ..defaults
        }
    }
}

/// Where session cookies are kept between invocations.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionStore {
    /// OS keyring entry keyed by backend URL.
    #[default]
    Keyring,
    /// `session.json` itself, readable by the owner only.
    File,
}

/// Contents of `session.json`. Cookie lines are only present for the file
/// store; with the keyring store the file carries metadata alone.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StoredSession {
    pub api_url: String,
    #[serde(default)]
    pub store: SessionStore,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub saved_at: Option<String>,
}

pub struct CommandContext<'a> {
    pub session: &'a SessionContext,
    pub api_url: &'a str,
}
