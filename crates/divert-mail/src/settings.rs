//! Diversion settings read from the host configuration

use divert_core::{ConfigScope, ConfigStore, EnvConfigStore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENABLED_PATH: &str = "amazonses/configuration_option/enabled";
pub const ACCESS_KEY_PATH: &str = "amazonses/configuration_option/accesskey";
pub const SECRET_KEY_PATH: &str = "amazonses/configuration_option/secretkey";
pub const REGION_PATH: &str = "amazonses/configuration_option/host";
pub const TIMEOUT_PATH: &str = "amazonses/configuration_option/timeout";
pub const ENDPOINT_PATH: &str = "amazonses/configuration_option/endpoint";

/// Snapshot of the diversion settings for one send
///
/// `encrypted_secret_key` is the value as stored; it is only decrypted by the
/// credential resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfiguration {
    pub enabled: bool,
    pub access_key: String,
    pub encrypted_secret_key: String,
    /// AWS region the SES client is scoped to
    pub region: String,
    /// Upper bound for the provider call, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_timeout_secs: Option<u64>,
    /// Custom SES endpoint (LocalStack or another SES-compatible service)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl MailConfiguration {
    /// Read the settings for `scope`.
    ///
    /// Loading never fails: missing values come back empty and are rejected by
    /// [`MailConfiguration::validate`] only when diversion is attempted.
    pub fn load(store: &dyn ConfigStore, scope: &ConfigScope) -> Self {
        let text = |path: &str| {
            store
                .value(path, scope)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        let optional = |path: &str| Some(text(path)).filter(|v| !v.is_empty());

        Self {
            enabled: store.is_set_flag(ENABLED_PATH, scope),
            access_key: text(ACCESS_KEY_PATH),
            encrypted_secret_key: text(SECRET_KEY_PATH),
            region: text(REGION_PATH),
            dispatch_timeout_secs: optional(TIMEOUT_PATH).and_then(|v| v.parse().ok()),
            endpoint_url: optional(ENDPOINT_PATH),
        }
    }

    /// Check that everything a provider client needs is present
    pub fn validate(&self) -> Result<(), crate::DivertError> {
        let missing: Vec<&str> = [
            ("access key", self.access_key.is_empty()),
            ("secret key", self.encrypted_secret_key.is_empty()),
            ("region", self.region.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(crate::DivertError::Configuration(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        if self.region.chars().any(char::is_whitespace) {
            return Err(crate::DivertError::Configuration(format!(
                "invalid region '{}'",
                self.region
            )));
        }

        Ok(())
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Configuration store backed by `DIVERT_*` environment variables
pub fn env_config_store() -> EnvConfigStore {
    EnvConfigStore::new([
        (ENABLED_PATH, "DIVERT_ENABLED"),
        (ACCESS_KEY_PATH, "DIVERT_ACCESS_KEY"),
        (SECRET_KEY_PATH, "DIVERT_SECRET_KEY"),
        (REGION_PATH, "DIVERT_REGION"),
        (TIMEOUT_PATH, "DIVERT_TIMEOUT_SECS"),
        (ENDPOINT_PATH, "DIVERT_ENDPOINT_URL"),
    ])
}
