#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("codec error: {0}")]
    Codec(#[from] pico_wire::CodecError),

    #[error("crypto error: {0}")]
    Crypto(#[from] pico_crypto::CryptoError),

    #[error("MAC verification failed")]
    MacMismatch,

    #[error("signature verification failed")]
    SignatureMismatch,

    #[error("service identity key does not match the one bound at pairing time")]
    ServiceIdentityMismatch,

    #[error("step attempted out of order: {0}")]
    NotInitializedYet(&'static str),

    #[error("reauth state has no wire encoding (INVALID is local-only)")]
    InvalidReauthState,
}

impl From<HandshakeError> for pico_types::PicoError {
    fn from(e: HandshakeError) -> Self {
        match e {
            HandshakeError::Codec(inner) => inner.into(),
            HandshakeError::Crypto(inner) => inner.into(),
            other => pico_types::PicoError::crypto(other.to_string()),
        }
    }
}
