use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::error::CryptoError;

/// Length of the AES-GCM nonce in bytes. The wire carries this value in the
/// clear alongside each message's `encryptedData` field.
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// AES-256-GCM encryption with a fresh, caller-supplied 96-bit IV. The
/// authentication tag is appended to the returned ciphertext, matching how
/// every `encryptedData` field on the wire is laid out.
pub fn encrypt(key: &[u8; 32], iv: &[u8; IV_LEN], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::Encrypt)
}

/// Decrypts and authenticates `ciphertext` (which includes the trailing
/// tag). Any tampering, including a wrong IV, fails the whole call — the
/// caller must reject the enclosing message rather than trust any partial
/// output.
pub fn decrypt(key: &[u8; 32], iv: &[u8; IV_LEN], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(iv), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::Decrypt)
}
