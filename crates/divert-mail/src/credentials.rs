//! Credential resolution: configuration in, provider client out

use divert_core::SecretCipher;
use std::sync::Arc;
use tracing::debug;

use crate::errors::DivertError;
use crate::providers::{ProviderFactory, ProviderSettings, RawEmailProvider};
use crate::settings::MailConfiguration;

/// Decrypts the secret key stored in configuration
pub trait SecretDecryptor: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<String, DivertError>;
}

impl SecretDecryptor for SecretCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<String, DivertError> {
        self.decrypt_secret(ciphertext)
            .map_err(|e| DivertError::Decryption(e.to_string()))
    }
}

/// Plaintext provider credentials, alive for a single send
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &mask_key(&self.access_key))
            .field("secret_key", &"***")
            .finish()
    }
}

/// Mask a key, showing only the first and last 4 characters
fn mask_key(s: &str) -> String {
    if s.len() <= 8 || !s.is_ascii() {
        "***".to_string()
    } else {
        format!("{}...{}", &s[..4], &s[s.len() - 4..])
    }
}

/// Turns a [`MailConfiguration`] into a ready provider client.
///
/// Nothing is cached: every call decrypts the secret again and builds a new
/// client, so configuration changes apply to the next send.
#[derive(Clone)]
pub struct CredentialResolver {
    decryptor: Arc<dyn SecretDecryptor>,
    factory: Arc<dyn ProviderFactory>,
}

impl CredentialResolver {
    pub fn new(decryptor: Arc<dyn SecretDecryptor>, factory: Arc<dyn ProviderFactory>) -> Self {
        Self { decryptor, factory }
    }

    /// Validate the configuration and decrypt the secret key
    pub fn credentials(&self, config: &MailConfiguration) -> Result<Credentials, DivertError> {
        config.validate()?;

        let secret_key = self.decryptor.decrypt(&config.encrypted_secret_key)?;
        if secret_key.is_empty() {
            return Err(DivertError::Decryption(
                "secret key decrypted to an empty value".to_string(),
            ));
        }

        Ok(Credentials {
            access_key: config.access_key.clone(),
            secret_key,
        })
    }

    /// Build a provider client scoped to the configured region
    pub async fn resolve(
        &self,
        config: &MailConfiguration,
    ) -> Result<Box<dyn RawEmailProvider>, DivertError> {
        let credentials = self.credentials(config)?;

        debug!(
            "Resolving provider client in region {} for access key {}",
            config.region,
            mask_key(&credentials.access_key)
        );

        let settings = ProviderSettings {
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
        };

        self.factory.create(credentials, &settings).await
    }
}
