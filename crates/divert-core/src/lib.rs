//! Core primitives shared by the divert crates
//!
//! - [`SecretCipher`]: AES-256-GCM encryption of configuration secrets
//! - [`ConfigStore`]: read-only, scoped access to the host configuration

pub mod config;
mod encryption;

pub use config::{parse_flag, ConfigScope, ConfigStore, EnvConfigStore, MemoryConfigStore};
pub use encryption::SecretCipher;

// Re-export external dependencies
pub use anyhow;
