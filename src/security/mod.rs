pub mod crypto;
pub mod keystore;

pub use crypto::{ValueCipher, DECRYPTION_FAILED};
pub use keystore::{load_or_create, platform_sealer, KeySealer, KeyStoreError, MasterKey};
