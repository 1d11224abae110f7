//! Master key lifecycle and at-rest key protection.
//!
//! The 256-bit master key is generated once from the OS CSPRNG and lives for
//! the lifetime of the install at `<app_data>/master.key`. On Windows the file
//! holds the DPAPI-sealed ciphertext of the key; elsewhere sealing is not
//! available and the key is written in the clear, but only when the operator
//! has explicitly opted in (`allow_insecure_keystore`), because a plaintext
//! key file protects nothing.
//!
//! An existing key that fails to unseal is a fatal error. Regenerating the key
//! would orphan every ciphertext already in the store, so we never do it.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const KEY_FILE: &str = "master.key";
const KEY_LEN: usize = 32;

/// Errors from key loading and sealing.
///
/// Implements [`std::error::Error`] via [`thiserror`]; callers that need to
/// distinguish "no sealer on this platform" from "key file is damaged" match
/// on the variant, everything else bubbles through `anyhow`.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error(
        "no OS key-protection primitive on this platform; \
         set allow_insecure_keystore=true to store the key in the clear (test environments only)"
    )]
    SealingUnavailable,

    #[error("failed to unseal master key at {}: {reason}", path.display())]
    UnsealFailed { path: PathBuf, reason: String },

    #[error("master key file {} is corrupt: expected {KEY_LEN} bytes after unsealing, got {got}", path.display())]
    KeyFileCorrupt { path: PathBuf, got: usize },

    #[error("key file I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The AES-256-GCM master key. Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// Two-method seam over the platform's user-scoped data-protection primitive.
pub trait KeySealer: Send + Sync {
    fn seal(&self, key: &[u8]) -> Result<Vec<u8>, KeyStoreError>;
    fn unseal(&self, blob: &[u8]) -> Result<Vec<u8>, KeyStoreError>;
}

/// Pick the sealer for this platform.
///
/// Windows gets DPAPI. Other platforms have no equivalent primitive here and
/// refuse to run unless the caller opts into the plaintext fallback.
pub fn platform_sealer(allow_insecure: bool) -> Result<Box<dyn KeySealer>, KeyStoreError> {
    #[cfg(windows)]
    {
        let _ = allow_insecure;
        Ok(Box::new(DpapiSealer))
    }
    #[cfg(not(windows))]
    {
        if allow_insecure {
            tracing::warn!(
                "storing master key unsealed on disk (allow_insecure_keystore=true); \
                 this protects nothing and is meant for test environments"
            );
            Ok(Box::new(PlainSealer))
        } else {
            Err(KeyStoreError::SealingUnavailable)
        }
    }
}

/// Load the master key from `<app_data>/master.key`, generating and sealing a
/// fresh one on first use.
pub fn load_or_create(app_data: &Path, sealer: &dyn KeySealer) -> Result<MasterKey, KeyStoreError> {
    let path = app_data.join(KEY_FILE);

    if path.exists() {
        let blob = std::fs::read(&path).map_err(|source| KeyStoreError::Io {
            path: path.clone(),
            source,
        })?;
        let mut raw = sealer.unseal(&blob)?;
        if raw.len() != KEY_LEN {
            let got = raw.len();
            raw.zeroize();
            return Err(KeyStoreError::KeyFileCorrupt { path, got });
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&raw);
        raw.zeroize();
        return Ok(MasterKey(key));
    }

    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    let sealed = sealer.seal(&key)?;
    std::fs::write(&path, &sealed).map_err(|source| KeyStoreError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(MasterKey(key))
}

// ── Platform sealers ──────────────────────────────────────────────────────────

/// Windows DPAPI, user scope.
#[cfg(windows)]
pub struct DpapiSealer;

#[cfg(windows)]
impl KeySealer for DpapiSealer {
    fn seal(&self, key: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        dpapi::protect(key).map_err(|reason| KeyStoreError::UnsealFailed {
            path: PathBuf::from(KEY_FILE),
            reason,
        })
    }

    fn unseal(&self, blob: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        dpapi::unprotect(blob).map_err(|reason| KeyStoreError::UnsealFailed {
            path: PathBuf::from(KEY_FILE),
            reason,
        })
    }
}

/// No-op sealer for platforms without a data-protection primitive.
/// Only reachable through the explicit opt-in in [`platform_sealer`].
pub struct PlainSealer;

impl KeySealer for PlainSealer {
    fn seal(&self, key: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        Ok(key.to_vec())
    }

    fn unseal(&self, blob: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        Ok(blob.to_vec())
    }
}

/// Raw DPAPI bindings, user-scoped (`CryptProtectData` / `CryptUnprotectData`).
#[cfg(windows)]
pub(crate) mod dpapi {
    use std::ffi::c_void;
    use std::ptr::{null, null_mut};
    use windows_sys::Win32::Foundation::LocalFree;
    use windows_sys::Win32::Security::Cryptography::{
        CryptProtectData, CryptUnprotectData, CRYPT_INTEGER_BLOB,
    };

    fn take_blob(blob: CRYPT_INTEGER_BLOB) -> Vec<u8> {
        let out =
            unsafe { std::slice::from_raw_parts(blob.pbData, blob.cbData as usize) }.to_vec();
        unsafe { LocalFree(blob.pbData as *mut c_void) };
        out
    }

    pub fn protect(data: &[u8]) -> Result<Vec<u8>, String> {
        let input = CRYPT_INTEGER_BLOB {
            cbData: data.len() as u32,
            pbData: data.as_ptr() as *mut u8,
        };
        let mut output = CRYPT_INTEGER_BLOB {
            cbData: 0,
            pbData: null_mut(),
        };
        let ok = unsafe {
            CryptProtectData(&input, null(), null(), null_mut(), null(), 0, &mut output)
        };
        if ok == 0 {
            return Err("CryptProtectData failed".to_string());
        }
        Ok(take_blob(output))
    }

    pub fn unprotect(data: &[u8]) -> Result<Vec<u8>, String> {
        let input = CRYPT_INTEGER_BLOB {
            cbData: data.len() as u32,
            pbData: data.as_ptr() as *mut u8,
        };
        let mut output = CRYPT_INTEGER_BLOB {
            cbData: 0,
            pbData: null_mut(),
        };
        let ok = unsafe {
            CryptUnprotectData(
                &input,
                null_mut(),
                null(),
                null_mut(),
                null(),
                0,
                &mut output,
            )
        };
        if ok == 0 {
            return Err("CryptUnprotectData failed".to_string());
        }
        Ok(take_blob(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_use_generates_and_persists() {
        let dir = TempDir::new().unwrap();
        let sealer = PlainSealer;

        let key = load_or_create(dir.path(), &sealer).unwrap();
        assert!(dir.path().join(KEY_FILE).exists());

        // Second load returns the same key, not a fresh one
        let again = load_or_create(dir.path(), &sealer).unwrap();
        assert_eq!(key.as_bytes(), again.as_bytes());
    }

    #[test]
    fn test_corrupt_key_file_is_fatal_not_regenerated() {
        let dir = TempDir::new().unwrap();
        let sealer = PlainSealer;
        let path = dir.path().join(KEY_FILE);
        std::fs::write(&path, b"short").unwrap();

        let err = load_or_create(dir.path(), &sealer).unwrap_err();
        assert!(matches!(err, KeyStoreError::KeyFileCorrupt { .. }));

        // The damaged file must be left in place for the operator to inspect
        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_sealer_refuses_without_opt_in() {
        assert!(matches!(
            platform_sealer(false),
            Err(KeyStoreError::SealingUnavailable)
        ));
        assert!(platform_sealer(true).is_ok());
    }
}
