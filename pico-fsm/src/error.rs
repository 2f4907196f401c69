#[derive(Debug, thiserror::Error)]
pub enum FsmError {
    #[error("handshake error: {0}")]
    Handshake(#[from] pico_handshake::HandshakeError),

    #[error("wire codec error: {0}")]
    Codec(#[from] pico_wire::CodecError),

    #[error("event {event} is illegal in state {state}")]
    UnexpectedEvent { state: &'static str, event: &'static str },

    #[error("sequence number mismatch: expected {expected:?}, got {actual:?}")]
    SequenceMismatch { expected: u64, actual: u64 },

    #[error("authorization failed: Pico identity key is not registered")]
    Unauthorized,
}

impl From<FsmError> for pico_types::PicoError {
    fn from(e: FsmError) -> Self {
        match e {
            FsmError::Handshake(inner) => inner.into(),
            FsmError::Codec(inner) => inner.into(),
            FsmError::SequenceMismatch { .. } | FsmError::UnexpectedEvent { .. } => {
                pico_types::PicoError::protocol(e.to_string())
            }
            FsmError::Unauthorized => pico_types::PicoError::authorization(e.to_string()),
        }
    }
}
