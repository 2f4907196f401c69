use rand::RngCore;

/// Default nonce length used by both sides of the handshake, matching the
/// reference protocol.
pub const DEFAULT_NONCE_LEN: usize = 16;

/// A fresh random byte string generated once per handshake by each side
/// (`sNonce`, `pNonce`) and folded into the SIGMA-I transcript.
#[derive(Clone, PartialEq, Eq)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    pub fn generate() -> Self {
        Self::generate_with_len(DEFAULT_NONCE_LEN)
    }

    pub fn generate_with_len(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        Nonce(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Nonce(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({})", hex::encode(&self.0))
    }
}
