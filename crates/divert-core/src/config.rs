//! Configuration store boundary
//!
//! The host application owns its configuration. This module only describes how
//! values are looked up: a slash-separated path (for example
//! `amazonses/configuration_option/enabled`) resolved within a [`ConfigScope`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scope a configuration value is resolved in
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "code")]
pub enum ConfigScope {
    /// Installation-wide values
    #[default]
    Default,
    /// Values for a single store / tenant, identified by its code
    Store(String),
}

impl std::fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigScope::Default => write!(f, "default"),
            ConfigScope::Store(code) => write!(f, "store:{}", code),
        }
    }
}

/// Read-only access to the host's configuration
pub trait ConfigStore: Send + Sync {
    /// Raw value stored at `path` for `scope`
    fn value(&self, path: &str, scope: &ConfigScope) -> Option<String>;

    /// Whether the flag at `path` is set for `scope`
    fn is_set_flag(&self, path: &str, scope: &ConfigScope) -> bool {
        self.value(path, scope)
            .map(|v| parse_flag(&v))
            .unwrap_or(false)
    }
}

/// Interpret a stored flag value. Missing and unknown values are unset.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// In-memory configuration with store-to-default fallback
///
/// Values are fixed at construction; lookups never mutate the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    values: HashMap<(ConfigScope, String), String>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, path: &str, value: impl Into<String>) -> Self {
        self.with_scoped_value(ConfigScope::Default, path, value)
    }

    pub fn with_scoped_value(
        mut self,
        scope: ConfigScope,
        path: &str,
        value: impl Into<String>,
    ) -> Self {
        self.values.insert((scope, path.to_string()), value.into());
        self
    }
}

impl ConfigStore for MemoryConfigStore {
    fn value(&self, path: &str, scope: &ConfigScope) -> Option<String> {
        self.values
            .get(&(scope.clone(), path.to_string()))
            .or_else(|| {
                self.values
                    .get(&(ConfigScope::Default, path.to_string()))
            })
            .cloned()
    }
}

/// Configuration read from `DIVERT_*` environment variables
///
/// Paths are mapped through a fixed table; the scope is ignored because the
/// process environment has a single scope.
#[derive(Debug, Clone)]
pub struct EnvConfigStore {
    mappings: Vec<(String, String)>,
}

impl EnvConfigStore {
    /// Map each configuration path to the environment variable holding it
    pub fn new<P, V>(mappings: impl IntoIterator<Item = (P, V)>) -> Self
    where
        P: Into<String>,
        V: Into<String>,
    {
        Self {
            mappings: mappings
                .into_iter()
                .map(|(p, v)| (p.into(), v.into()))
                .collect(),
        }
    }

    fn variable_for(&self, path: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, v)| v.as_str())
    }
}

impl ConfigStore for EnvConfigStore {
    fn value(&self, path: &str, _scope: &ConfigScope) -> Option<String> {
        let variable = self.variable_for(path)?;
        std::env::var(variable).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENABLED: &str = "amazonses/configuration_option/enabled";

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("yes"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("enabled"));
    }

    #[test]
    fn test_memory_store_falls_back_to_default_scope() {
        let store = MemoryConfigStore::new()
            .with_value("amazonses/configuration_option/host", "us-east-1")
            .with_scoped_value(
                ConfigScope::Store("eu".to_string()),
                "amazonses/configuration_option/host",
                "eu-west-1",
            );

        let eu = ConfigScope::Store("eu".to_string());
        let us = ConfigScope::Store("us".to_string());

        assert_eq!(
            store.value("amazonses/configuration_option/host", &eu),
            Some("eu-west-1".to_string())
        );
        assert_eq!(
            store.value("amazonses/configuration_option/host", &us),
            Some("us-east-1".to_string())
        );
        assert_eq!(store.value("missing", &ConfigScope::Default), None);
    }

    #[test]
    fn test_is_set_flag_defaults_to_unset() {
        let store = MemoryConfigStore::new();
        assert!(!store.is_set_flag(ENABLED, &ConfigScope::Default));

        let store = store.with_value(ENABLED, "1");
        assert!(store.is_set_flag(ENABLED, &ConfigScope::Default));
    }

    #[test]
    fn test_store_scope_can_disable_default() {
        let scope = ConfigScope::Store("b2b".to_string());
        let store = MemoryConfigStore::new()
            .with_value(ENABLED, "1")
            .with_scoped_value(scope.clone(), ENABLED, "0");

        assert!(store.is_set_flag(ENABLED, &ConfigScope::Default));
        assert!(!store.is_set_flag(ENABLED, &scope));
    }

    #[test]
    fn test_env_store_reads_mapped_variable() {
        std::env::set_var("DIVERT_CORE_TEST_REGION", "sa-east-1");
        let store = EnvConfigStore::new([(
            "amazonses/configuration_option/host",
            "DIVERT_CORE_TEST_REGION",
        )]);

        assert_eq!(
            store.value("amazonses/configuration_option/host", &ConfigScope::Default),
            Some("sa-east-1".to_string())
        );
        assert_eq!(store.value("unmapped/path", &ConfigScope::Default), None);
    }

    #[test]
    fn test_scope_display_and_serde() {
        assert_eq!(ConfigScope::Default.to_string(), "default");
        assert_eq!(
            ConfigScope::Store("main".to_string()).to_string(),
            "store:main"
        );

        let json = serde_json::to_string(&ConfigScope::Store("main".to_string())).unwrap();
        assert_eq!(json, r#"{"type":"store","code":"main"}"#);
    }
}
