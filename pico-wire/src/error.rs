#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 in field {field}: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("{leftover} trailing byte(s) after decoding inner payload")]
    TrailingBytes { leftover: usize },

    #[error("field {0} has unexpected length")]
    BadLength(&'static str),
}

impl From<CodecError> for pico_types::PicoError {
    fn from(e: CodecError) -> Self {
        pico_types::PicoError::codec(e.to_string())
    }
}
