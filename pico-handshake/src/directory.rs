//! The verifier-only "users directory" interface (spec.md section 6):
//! looks up whether a Pico's long-term identity key belongs to an
//! authorized prover, and if so under what username. This is consumed by
//! the FSM and the blocking driver at the same point in the protocol — just
//! after `PicoAuth` is verified — so it lives here rather than in either
//! crate.

use pico_crypto::EcPublicKey;

/// Authorization lookup keyed on the Pico's long-term identity public key.
///
/// "If the directory is absent, authorization is unconditional (all
/// provers accepted)" (spec.md section 6) — that absent case is
/// [`NoUserDirectory`], not `Option::None` sprinkled through the FSM.
pub trait UserDirectory: Send + Sync {
    /// Returns the username bound to this identity key, if any.
    fn search_by_key(&self, pico_id_pub: &EcPublicKey) -> Option<String>;

    /// Returns a pre-shared symmetric key bound to this identity key, if
    /// the directory keeps one (used by deployments that layer an
    /// additional symmetric check on top of the asymmetric handshake).
    fn search_symmetric_key_by_key(&self, pico_id_pub: &EcPublicKey) -> Option<Vec<u8>> {
        let _ = pico_id_pub;
        None
    }
}

/// Accepts every prover unconditionally, under a fixed username. Used when
/// the embedder runs without a directory at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUserDirectory;

impl UserDirectory for NoUserDirectory {
    fn search_by_key(&self, _pico_id_pub: &EcPublicKey) -> Option<String> {
        Some("anonymous".to_string())
    }
}
