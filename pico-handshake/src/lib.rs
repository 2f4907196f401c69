mod context;
mod directory;
mod error;
mod handshake;
mod qr;
mod reauth;

pub use context::SharedContext;
pub use directory::{NoUserDirectory, UserDirectory};
pub use error::HandshakeError;
pub use handshake::{
    prover_build_pico_auth, prover_build_start, prover_process_service_auth, prover_process_status,
    verifier_build_service_auth, verifier_build_status, verifier_process_pico_auth, verifier_process_start,
    PicoAuthOutcome, PICO_PROTOCOL_VERSION,
};
pub use qr::build_key_pairing;
pub use reauth::{
    build_pico_reauth, build_service_reauth, parse_pico_reauth, parse_service_reauth,
};
