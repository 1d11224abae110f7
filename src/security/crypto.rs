//! Per-value AES-256-GCM under the master key.
//!
//! Stored layout: `nonce (12 bytes) || ciphertext || tag`, no AAD. Every
//! encryption draws a fresh nonce from the OS CSPRNG, so encrypting the same
//! value twice produces different ciphertext.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};

use crate::security::keystore::MasterKey;

const NONCE_LEN: usize = 12;

/// Sentinel surfaced in place of a value whose ciphertext fails to
/// authenticate. Non-throwing so one corrupted row cannot abort a list query.
pub const DECRYPTION_FAILED: &str = "[DECRYPTION FAILED]";

/// Field-level cipher handle. Cheap to clone the key into; lives as long as
/// the storage engine.
pub struct ValueCipher {
    cipher: Aes256Gcm,
}

impl ValueCipher {
    pub fn new(key: &MasterKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.as_bytes().into()),
        }
    }

    /// Encrypt a UTF-8 value. Empty input maps to empty output so optional
    /// columns stay NULL-like without a special case at the call site.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow!("AES-256-GCM encryption failed: {}", e))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a stored value. Empty input → empty string; authentication
    /// failure or truncation → [`DECRYPTION_FAILED`].
    pub fn decrypt(&self, data: &[u8]) -> String {
        if data.is_empty() {
            return String::new();
        }
        if data.len() < NONCE_LEN {
            return DECRYPTION_FAILED.to_string();
        }

        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);
        match self.cipher.decrypt(nonce, &data[NONCE_LEN..]) {
            Ok(plain) => String::from_utf8(plain).unwrap_or_else(|_| DECRYPTION_FAILED.to_string()),
            Err(_) => DECRYPTION_FAILED.to_string(),
        }
    }
}
