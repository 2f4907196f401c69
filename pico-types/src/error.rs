/// The five error kinds named in the protocol's error-handling design: a
/// transport failure, a malformed wire message, a cryptographic failure, an
/// illegal protocol transition, or a failed authorization check. Every
/// fallible operation in the workspace returns a `Result` that converts into
/// this via `#[from]` on the narrower, crate-local error types.
#[derive(Debug, thiserror::Error)]
pub enum PicoError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("authorization error: {0}")]
    Authorization(String),
}

impl PicoError {
    pub fn codec(msg: impl Into<String>) -> Self {
        PicoError::Codec(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        PicoError::Crypto(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        PicoError::Protocol(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        PicoError::Authorization(msg.into())
    }
}
