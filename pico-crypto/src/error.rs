#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("failed to parse key material: {0}")]
    KeyDecode(String),

    #[error("ECDH agreement failed: {0}")]
    Ecdh(String),

    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("AEAD encryption failed")]
    Encrypt,

    #[error("AEAD authentication tag mismatch")]
    Decrypt,

    #[error("signature generation failed: {0}")]
    Sign(String),

    #[error("signature verification failed")]
    Verify,
}

impl From<CryptoError> for pico_types::PicoError {
    fn from(e: CryptoError) -> Self {
        pico_types::PicoError::crypto(e.to_string())
    }
}
