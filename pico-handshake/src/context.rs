use std::sync::Arc;

use pico_crypto::{DerivedKeys, EcPublicKey, KeyPair};
use pico_types::Nonce;
use zeroize::Zeroize;

/// Per-handshake key material, shared by the four SIGMA-I messages and
/// discarded once the handshake ends.
///
/// The handshake is symmetric (spec.md section 1: "a pair of symmetric
/// finite-state machines"), so this context is written from the point of
/// view of "this side" vs. "the peer" rather than hard-coding prover and
/// verifier roles: on the service it holds the service's own identity and
/// the Pico's identity public key; on the Pico it holds the reverse. Only
/// the long-term identity key is supplied by the embedder and merely
/// referenced here (`Arc`, not owned); ephemeral keys, nonces and derived
/// subkeys are created fresh per handshake and owned by this struct.
pub struct SharedContext {
    /// This side's own long-term identity key pair, if it has one to sign
    /// with (both sides do, in the full SIGMA-I handshake).
    local_identity: Option<Arc<KeyPair>>,
    /// The peer's long-term identity public key, once known.
    remote_identity_pub: Option<EcPublicKey>,

    local_ephemeral: Option<KeyPair>,
    remote_ephemeral_pub: Option<EcPublicKey>,

    local_nonce: Option<Nonce>,
    remote_nonce: Option<Nonce>,

    shared_secret: Option<[u8; 32]>,
    derived: Option<DerivedKeys>,
}

impl SharedContext {
    pub fn new() -> Self {
        SharedContext {
            local_identity: None,
            remote_identity_pub: None,
            local_ephemeral: None,
            remote_ephemeral_pub: None,
            local_nonce: None,
            remote_nonce: None,
            shared_secret: None,
            derived: None,
        }
    }

    pub fn set_local_identity(&mut self, identity: Arc<KeyPair>) {
        self.local_identity = Some(identity);
    }

    pub fn local_identity(&self) -> Option<&Arc<KeyPair>> {
        self.local_identity.as_ref()
    }

    pub fn set_remote_identity_pub(&mut self, pub_key: EcPublicKey) {
        self.remote_identity_pub = Some(pub_key);
    }

    pub fn remote_identity_pub(&self) -> Option<&EcPublicKey> {
        self.remote_identity_pub.as_ref()
    }

    pub fn set_local_ephemeral(&mut self, kp: KeyPair) {
        self.local_ephemeral = Some(kp);
    }

    pub fn local_ephemeral(&self) -> Option<&KeyPair> {
        self.local_ephemeral.as_ref()
    }

    pub fn set_remote_ephemeral_pub(&mut self, pub_key: EcPublicKey) {
        self.remote_ephemeral_pub = Some(pub_key);
    }

    pub fn remote_ephemeral_pub(&self) -> Option<&EcPublicKey> {
        self.remote_ephemeral_pub.as_ref()
    }

    pub fn set_local_nonce(&mut self, nonce: Nonce) {
        self.local_nonce = Some(nonce);
    }

    pub fn local_nonce(&self) -> Option<&Nonce> {
        self.local_nonce.as_ref()
    }

    pub fn set_remote_nonce(&mut self, nonce: Nonce) {
        self.remote_nonce = Some(nonce);
    }

    pub fn remote_nonce(&self) -> Option<&Nonce> {
        self.remote_nonce.as_ref()
    }

    pub fn set_shared_secret(&mut self, secret: [u8; 32]) {
        self.shared_secret = Some(secret);
    }

    pub fn shared_secret(&self) -> Option<&[u8; 32]> {
        self.shared_secret.as_ref()
    }

    pub fn set_derived(&mut self, derived: DerivedKeys) {
        self.derived = Some(derived);
    }

    pub fn derived(&self) -> Option<&DerivedKeys> {
        self.derived.as_ref()
    }

    /// Zeroes all secret material this context owns: the ephemeral key,
    /// nonces, raw shared secret and derived subkeys. The identity key is
    /// untouched — it isn't owned by this context and outlives the
    /// handshake.
    pub fn clear(&mut self) {
        self.local_ephemeral = None;
        if let Some(mut secret) = self.shared_secret.take() {
            secret.zeroize();
        }
        self.derived = None;
        self.local_nonce = None;
        self.remote_nonce = None;
    }
}

impl Default for SharedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SharedContext {
    fn drop(&mut self) {
        self.clear();
    }
}
