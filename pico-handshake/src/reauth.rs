//! Wire codec for the continuous-authentication ping-pong messages
//! (`PicoReauth`/`ServiceReauth`), reusing the derived keys a completed
//! handshake left in [`SharedContext`]. Shared by the blocking driver
//! (`pico-continuous`) and the event-driven FSMs (`pico-fsm`), since both
//! drive the exact same wire protocol.

use pico_crypto::PicoCrypto;
use pico_types::{ReauthState, SequenceNumber};
use pico_wire::{PicoReauth, PicoReauthInner, ServiceReauth, ServiceReauthInner, B64};

use crate::context::SharedContext;
use crate::error::HandshakeError;
use crate::handshake::{fresh_iv, parse_iv, session_aad};

pub fn build_pico_reauth(
    ctx: &SharedContext,
    crypto: &impl PicoCrypto,
    session_id: i64,
    state: ReauthState,
    sequence_number: SequenceNumber,
    extra_data: &[u8],
) -> Result<PicoReauth, HandshakeError> {
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?;
    let reauth_state_byte = state.to_wire_byte().ok_or(HandshakeError::InvalidReauthState)?;

    let inner = PicoReauthInner {
        reauth_state_byte,
        sequence_number,
        extra_data: extra_data.to_vec(),
    };

    let iv = fresh_iv(crypto);
    let aad = session_aad(session_id);
    let ciphertext = crypto.aead_encrypt(&derived.enc_key, &iv, &aad, &inner.to_bytes())?;

    Ok(PicoReauth {
        session_id,
        encrypted_data: B64::new(ciphertext),
        iv: B64::new(iv.to_vec()),
    })
}

pub fn parse_pico_reauth(ctx: &SharedContext, crypto: &impl PicoCrypto, msg: &PicoReauth) -> Result<PicoReauthInner, HandshakeError> {
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?;
    let iv = parse_iv(msg.iv.as_slice())?;
    let aad = session_aad(msg.session_id);
    let plaintext = crypto.aead_decrypt(&derived.enc_key, &iv, &aad, msg.encrypted_data.as_slice())?;
    Ok(PicoReauthInner::from_bytes(&plaintext)?)
}

pub fn build_service_reauth(
    ctx: &SharedContext,
    crypto: &impl PicoCrypto,
    session_id: i64,
    state: ReauthState,
    timeout_ms: i32,
    sequence_number: SequenceNumber,
    extra_data: &[u8],
) -> Result<ServiceReauth, HandshakeError> {
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?;
    let reauth_state_byte = state.to_wire_byte().ok_or(HandshakeError::InvalidReauthState)?;

    let inner = ServiceReauthInner {
        reauth_state_byte,
        timeout_ms,
        sequence_number,
        extra_data: extra_data.to_vec(),
    };

    let iv = fresh_iv(crypto);
    let aad = session_aad(session_id);
    let ciphertext = crypto.aead_encrypt(&derived.enc_key, &iv, &aad, &inner.to_bytes())?;

    Ok(ServiceReauth {
        session_id,
        encrypted_data: B64::new(ciphertext),
        iv: B64::new(iv.to_vec()),
    })
}

pub fn parse_service_reauth(ctx: &SharedContext, crypto: &impl PicoCrypto, msg: &ServiceReauth) -> Result<ServiceReauthInner, HandshakeError> {
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?;
    let iv = parse_iv(msg.iv.as_slice())?;
    let aad = session_aad(msg.session_id);
    let plaintext = crypto.aead_decrypt(&derived.enc_key, &iv, &aad, msg.encrypted_data.as_slice())?;
    Ok(ServiceReauthInner::from_bytes(&plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pico_crypto::{DefaultCrypto, KeyPair};

    fn paired_contexts() -> (SharedContext, SharedContext) {
        let crypto = DefaultCrypto;
        let mut prover_ctx = SharedContext::new();
        let mut verifier_ctx = SharedContext::new();

        let start = crate::handshake::prover_build_start(&mut prover_ctx, &crypto).unwrap();
        crate::handshake::verifier_process_start(&mut verifier_ctx, &crypto, &start).unwrap();
        verifier_ctx.set_local_identity(std::sync::Arc::new(KeyPair::generate()));
        let service_auth = crate::handshake::verifier_build_service_auth(&mut verifier_ctx, &crypto, 1).unwrap();
        crate::handshake::prover_process_service_auth(&mut prover_ctx, &crypto, &service_auth).unwrap();

        (prover_ctx, verifier_ctx)
    }

    #[test]
    fn pico_reauth_round_trips_through_derived_keys() {
        let (prover_ctx, verifier_ctx) = paired_contexts();
        let crypto = DefaultCrypto;
        let seq = SequenceNumber::random();

        let msg = build_pico_reauth(&prover_ctx, &crypto, 1, ReauthState::Continue, seq, b"extra").unwrap();
        let parsed = parse_pico_reauth(&verifier_ctx, &crypto, &msg).unwrap();

        assert_eq!(parsed.reauth_state(), Some(ReauthState::Continue));
        assert_eq!(parsed.sequence_number, seq);
        assert_eq!(parsed.extra_data, b"extra");
    }

    #[test]
    fn service_reauth_round_trips_through_derived_keys() {
        let (prover_ctx, verifier_ctx) = paired_contexts();
        let crypto = DefaultCrypto;
        let seq = SequenceNumber::random();

        let msg = build_service_reauth(&verifier_ctx, &crypto, 1, ReauthState::Pause, 50_000, seq, &[]).unwrap();
        let parsed = parse_service_reauth(&prover_ctx, &crypto, &msg).unwrap();

        assert_eq!(parsed.reauth_state(), Some(ReauthState::Pause));
        assert_eq!(parsed.timeout_ms, 50_000);
        assert_eq!(parsed.sequence_number, seq);
    }
}
