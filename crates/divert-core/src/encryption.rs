// aes-gcm 0.10 still depends on generic-array 0.14, whose helpers are deprecated
#![allow(deprecated)]

use aes_gcm::{
    aead::{Aead, KeyInit},
    AeadCore, Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::Arc;

const NONCE_LENGTH: usize = 12;
const KEY_LENGTH: usize = 32;

/// Encrypts and decrypts configuration secrets at rest.
///
/// Ciphertexts are base64 strings of `nonce || ciphertext` produced with
/// AES-256-GCM, so the same value can be stored in any string-typed
/// configuration backend.
#[derive(Clone)]
pub struct SecretCipher {
    key: Arc<[u8; KEY_LENGTH]>,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Create a cipher from a raw 32-byte key or a 64-character hex key
    pub fn new(master_key: &str) -> Result<Self> {
        let key_bytes = match master_key.len() {
            KEY_LENGTH => master_key.as_bytes().to_vec(),
            64 => hex::decode(master_key).map_err(|e| anyhow!("Invalid hex key: {}", e))?,
            _ => {
                return Err(anyhow!(
                    "Master key must be exactly 32 bytes or 64 hex characters"
                ))
            }
        };

        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&key_bytes);

        Ok(Self { key: Arc::new(key) })
    }

    /// Derive the key from a passphrase with SHA-256
    pub fn from_password(password: &str) -> Self {
        let digest = Sha256::digest(password.as_bytes());

        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&digest);

        Self { key: Arc::new(key) }
    }

    pub fn encrypt_secret(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new(self.key.as_slice().into());
        let nonce = Aes256Gcm::generate_nonce(&mut aes_gcm::aead::OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| anyhow!("Encryption error: {}", e))?;

        let mut combined = nonce.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// Decrypt a value produced by [`SecretCipher::encrypt_secret`].
    ///
    /// The error never echoes the ciphertext back, since callers log it.
    pub fn decrypt_secret(&self, encoded: &str) -> Result<String> {
        let data = BASE64
            .decode(encoded.trim())
            .map_err(|e| anyhow!("Base64 decode error: {}", e))?;

        if data.len() < NONCE_LENGTH {
            return Err(anyhow!("Invalid encrypted data"));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LENGTH);
        let cipher = Aes256Gcm::new(self.key.as_slice().into());

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| anyhow!("Ciphertext could not be authenticated with this key"))?;

        String::from_utf8(plaintext).map_err(|e| anyhow!("UTF-8 decode failed: {}", e))
    }

    /// Generate a random key as 64 hex characters, suitable for [`SecretCipher::new`]
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LENGTH];
        OsRng.fill_bytes(&mut key);
        hex::encode(key)
    }
}
