#[derive(Debug, thiserror::Error)]
pub enum ContinuousError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("channel read timed out")]
    TimedOut,

    #[error("peer closed the channel")]
    Closed,

    #[error("handshake error: {0}")]
    Handshake(#[from] pico_handshake::HandshakeError),

    #[error("wire codec error: {0}")]
    Codec(#[from] pico_wire::CodecError),

    #[error("sequence number mismatch: expected {expected}, got {actual}")]
    SequenceMismatch { expected: u64, actual: u64 },

    #[error("authorization failed: Pico identity key is not registered")]
    Unauthorized,

    #[error("reauth state transition is illegal; session moved to ERROR")]
    IllegalTransition,
}

impl From<ContinuousError> for pico_types::PicoError {
    fn from(e: ContinuousError) -> Self {
        match e {
            ContinuousError::Transport(inner) => inner.into(),
            ContinuousError::Handshake(inner) => inner.into(),
            ContinuousError::Codec(inner) => inner.into(),
            ContinuousError::TimedOut | ContinuousError::Closed => {
                pico_types::PicoError::Transport(std::io::Error::new(std::io::ErrorKind::TimedOut, e.to_string()))
            }
            ContinuousError::SequenceMismatch { .. } | ContinuousError::IllegalTransition => {
                pico_types::PicoError::protocol(e.to_string())
            }
            ContinuousError::Unauthorized => pico_types::PicoError::authorization(e.to_string()),
        }
    }
}
