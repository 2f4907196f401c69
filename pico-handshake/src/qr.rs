//! Builds the QR-carried pairing payload (spec.md section 3,
//! KeyAuth/KeyPairing) that bootstraps a rendezvous session: the service
//! name, its identity public key, the rendezvous channel address, a fresh
//! session-id seed, and a signature over all of it. The embedder hands the
//! serialized JSON to its `QrSink` callback before any network activity —
//! returning `false` from that callback aborts before this payload's
//! signature is ever used.

use pico_crypto::{KeyPair, PicoCrypto};
use pico_wire::{KeyPairingMessage, PairingKind, B64};

use crate::error::HandshakeError;

/// Builds and signs a `KeyPairingMessage`. `kind` distinguishes a
/// first-time pairing from a previously-paired Pico revisiting the same
/// service (spec.md section 3).
pub fn build_key_pairing(
    crypto: &impl PicoCrypto,
    identity: &KeyPair,
    service_name: &str,
    rendezvous_address: &str,
    extra_data: &[u8],
    session_id_seed: [u8; 8],
    kind: PairingKind,
) -> Result<KeyPairingMessage, HandshakeError> {
    let spk = identity.get_public_der()?;

    let mut transcript = Vec::new();
    transcript.extend_from_slice(&spk);
    transcript.extend_from_slice(extra_data);
    transcript.extend_from_slice(rendezvous_address.as_bytes());
    transcript.extend_from_slice(&session_id_seed);
    transcript.push(kind as u8);

    let sig = crypto.sign(identity, &transcript)?;

    Ok(KeyPairingMessage {
        sn: service_name.to_string(),
        spk: B64::new(spk),
        sig: B64::new(sig),
        ed: B64::new(extra_data.to_vec()),
        sa: rendezvous_address.to_string(),
        td: B64::new(session_id_seed.to_vec()),
        t: kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pico_crypto::DefaultCrypto;

    #[test]
    fn signed_transcript_matches_what_was_signed() {
        let crypto = DefaultCrypto;
        let identity = KeyPair::generate();
        let msg = build_key_pairing(
            &crypto,
            &identity,
            "my-service",
            "wss://rendezvous.example/abc",
            b"hello",
            [1, 2, 3, 4, 5, 6, 7, 8],
            PairingKind::KeyPairing,
        )
        .unwrap();

        assert!(identity.verify(&msg.signed_transcript(), msg.sig.as_slice()).unwrap());
    }
}
