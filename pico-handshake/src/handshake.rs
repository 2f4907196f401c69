//! The four SIGMA-I handshake messages (C4), expressed as pure functions
//! over a [`SharedContext`]: each `*_build_*` produces the next outgoing
//! message and advances `ctx`; each `*_process_*` consumes an incoming
//! message, verifies it, and advances `ctx` the same way. The FSMs in
//! `pico-fsm` call these as the actions of their state transitions; the
//! blocking driver in `pico-continuous` calls the same functions linearly.

use pico_crypto::{EcPublicKey, PicoCrypto, CryptoError, IV_LEN};
use pico_types::{AuthStatus, Nonce};
use pico_wire::{
    PicoAuth, PicoAuthInner, ServiceAuth, ServiceAuthInner, Start, Status, StatusInner, B64,
};

use crate::context::SharedContext;
use crate::error::HandshakeError;

/// `picoVersion` advertised in `Start`. The reference protocol version.
pub const PICO_PROTOCOL_VERSION: u32 = 2;

pub(crate) fn fresh_iv(crypto: &impl PicoCrypto) -> [u8; IV_LEN] {
    let bytes = crypto.csprng(IV_LEN);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&bytes);
    iv
}

pub(crate) fn parse_iv(bytes: &[u8]) -> Result<[u8; IV_LEN], HandshakeError> {
    if bytes.len() != IV_LEN {
        return Err(HandshakeError::Crypto(CryptoError::KeyDecode(format!(
            "iv must be {IV_LEN} bytes, got {}",
            bytes.len()
        ))));
    }
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(bytes);
    Ok(iv)
}

/// Binds each message's ciphertext to the session it belongs to, so a
/// `ServiceAuth` recorded from one handshake can't be replayed as the
/// answer to a different one sharing the same derived keys.
pub(crate) fn session_aad(session_id: i64) -> [u8; 8] {
    session_id.to_be_bytes()
}

fn service_auth_transcript(s_ephem_der: &[u8], p_ephem_der: &[u8], p_nonce: &[u8]) -> Vec<u8> {
    let mut t = Vec::with_capacity(s_ephem_der.len() + p_ephem_der.len() + p_nonce.len());
    t.extend_from_slice(s_ephem_der);
    t.extend_from_slice(p_ephem_der);
    t.extend_from_slice(p_nonce);
    t
}

fn pico_auth_transcript(p_ephem_der: &[u8], s_ephem_der: &[u8], s_nonce: &[u8]) -> Vec<u8> {
    let mut t = Vec::with_capacity(p_ephem_der.len() + s_ephem_der.len() + s_nonce.len());
    t.extend_from_slice(p_ephem_der);
    t.extend_from_slice(s_ephem_der);
    t.extend_from_slice(s_nonce);
    t
}

/// Step 1 (P→V). The Pico generates its ephemeral key pair and nonce.
pub fn prover_build_start(ctx: &mut SharedContext, crypto: &impl PicoCrypto) -> Result<Start, HandshakeError> {
    let ephemeral = crypto.generate_keypair();
    let nonce = Nonce::generate();

    let start = Start {
        pico_ephemeral_public_key: ephemeral.get_public_pem()?,
        pico_nonce: B64::new(nonce.as_bytes().to_vec()),
        pico_version: PICO_PROTOCOL_VERSION,
    };

    ctx.set_local_nonce(nonce);
    ctx.set_local_ephemeral(ephemeral);
    Ok(start)
}

/// Step 1 (V side). The service records the Pico's ephemeral key and
/// nonce, then generates its own ephemeral key pair and nonce.
pub fn verifier_process_start(ctx: &mut SharedContext, crypto: &impl PicoCrypto, msg: &Start) -> Result<(), HandshakeError> {
    let pico_ephemeral_pub = EcPublicKey::from_pem(&msg.pico_ephemeral_public_key)?;
    ctx.set_remote_ephemeral_pub(pico_ephemeral_pub);
    ctx.set_remote_nonce(Nonce::from_bytes(msg.pico_nonce.as_slice().to_vec()));

    let ephemeral = crypto.generate_keypair();
    let nonce = Nonce::generate();
    ctx.set_local_nonce(nonce);
    ctx.set_local_ephemeral(ephemeral);
    Ok(())
}

/// Step 2 (V→P). The service derives the shared secret and the four
/// subkeys, signs the transcript `(sEphemPub, pEphemPub, pNonce)` with its
/// identity key, MACs the same transcript with `serviceAuthKey`, and
/// encrypts `sIdPub ‖ sNonce ‖ signature ‖ mac` under `encKey`.
pub fn verifier_build_service_auth(
    ctx: &mut SharedContext,
    crypto: &impl PicoCrypto,
    session_id: i64,
) -> Result<ServiceAuth, HandshakeError> {
    let local_ephemeral = ctx
        .local_ephemeral()
        .ok_or(HandshakeError::NotInitializedYet("local ephemeral"))?;
    let remote_ephemeral_pub = ctx
        .remote_ephemeral_pub()
        .ok_or(HandshakeError::NotInitializedYet("remote ephemeral public"))?;
    let remote_nonce = ctx
        .remote_nonce()
        .ok_or(HandshakeError::NotInitializedYet("remote nonce"))?;
    let local_nonce = ctx
        .local_nonce()
        .ok_or(HandshakeError::NotInitializedYet("local nonce"))?;
    let identity = ctx
        .local_identity()
        .ok_or(HandshakeError::NotInitializedYet("local identity"))?
        .clone();

    let shared_secret = crypto.ecdh_derive(local_ephemeral, remote_ephemeral_pub)?;
    let derived = crypto.derive_subkeys(&shared_secret)?;

    let s_ephem_der = local_ephemeral.get_public_der()?;
    let p_ephem_der = remote_ephemeral_pub.to_der()?;
    let transcript = service_auth_transcript(&s_ephem_der, &p_ephem_der, remote_nonce.as_bytes());

    let signature = crypto.sign(&identity, &transcript)?;
    let mac = crypto.mac(&derived.mac_key, &transcript);

    let inner = ServiceAuthInner {
        service_id_pub_der: identity.get_public_der()?,
        service_nonce: local_nonce.as_bytes().to_vec(),
        signature,
        mac: mac.to_vec(),
    };

    let iv = fresh_iv(crypto);
    let aad = session_aad(session_id);
    let ciphertext = crypto.aead_encrypt(&derived.enc_key, &iv, &aad, &inner.to_bytes())?;
    let service_ephem_public_key = local_ephemeral.get_public_pem()?;

    ctx.set_shared_secret(shared_secret);
    ctx.set_derived(derived);

    Ok(ServiceAuth {
        session_id,
        service_ephem_public_key,
        encrypted_data: B64::new(ciphertext),
        iv: B64::new(iv.to_vec()),
    })
}

/// Step 2 (P side). The Pico derives the same shared secret, decrypts the
/// service's bundle, checks that `sIdPub` matches the identity embedded in
/// the pairing QR (when one was supplied), and verifies the MAC and
/// signature before trusting any of it.
pub fn prover_process_service_auth(ctx: &mut SharedContext, crypto: &impl PicoCrypto, msg: &ServiceAuth) -> Result<(), HandshakeError> {
    let service_ephemeral_pub = EcPublicKey::from_pem(&msg.service_ephem_public_key)?;
    let local_ephemeral = ctx
        .local_ephemeral()
        .ok_or(HandshakeError::NotInitializedYet("local ephemeral"))?;
    let local_nonce = ctx
        .local_nonce()
        .ok_or(HandshakeError::NotInitializedYet("local nonce"))?;

    let shared_secret = crypto.ecdh_derive(local_ephemeral, &service_ephemeral_pub)?;
    let derived = crypto.derive_subkeys(&shared_secret)?;

    let iv = parse_iv(msg.iv.as_slice())?;
    let aad = session_aad(msg.session_id);
    let plaintext = crypto.aead_decrypt(&derived.enc_key, &iv, &aad, msg.encrypted_data.as_slice())?;
    let inner = ServiceAuthInner::from_bytes(&plaintext)?;

    let service_id_pub = EcPublicKey::from_der(&inner.service_id_pub_der)?;
    if let Some(expected) = ctx.remote_identity_pub() {
        if expected != &service_id_pub {
            return Err(HandshakeError::ServiceIdentityMismatch);
        }
    }

    let p_ephem_der = local_ephemeral.get_public_der()?;
    let s_ephem_der = service_ephemeral_pub.to_der()?;
    let transcript = service_auth_transcript(&s_ephem_der, &p_ephem_der, local_nonce.as_bytes());

    if !crypto.mac_verify(&derived.mac_key, &transcript, &inner.mac) {
        return Err(HandshakeError::MacMismatch);
    }
    if !crypto.verify(&service_id_pub, &transcript, &inner.signature)? {
        return Err(HandshakeError::SignatureMismatch);
    }

    ctx.set_remote_nonce(Nonce::from_bytes(inner.service_nonce));
    ctx.set_remote_ephemeral_pub(service_ephemeral_pub);
    ctx.set_remote_identity_pub(service_id_pub);
    ctx.set_shared_secret(shared_secret);
    ctx.set_derived(derived);
    Ok(())
}

/// Step 3 (P→V). Symmetric to [`verifier_build_service_auth`]: the Pico
/// signs `(pEphemPub, sEphemPub, sNonce)`, MACs with `picoAuthKey`, and
/// attaches the caller's `extraData`.
pub fn prover_build_pico_auth(
    ctx: &mut SharedContext,
    crypto: &impl PicoCrypto,
    session_id: i64,
    extra_data: &[u8],
) -> Result<PicoAuth, HandshakeError> {
    let local_ephemeral = ctx
        .local_ephemeral()
        .ok_or(HandshakeError::NotInitializedYet("local ephemeral"))?;
    let remote_ephemeral_pub = ctx
        .remote_ephemeral_pub()
        .ok_or(HandshakeError::NotInitializedYet("remote ephemeral public"))?;
    let remote_nonce = ctx
        .remote_nonce()
        .ok_or(HandshakeError::NotInitializedYet("remote nonce"))?;
    let identity = ctx
        .local_identity()
        .ok_or(HandshakeError::NotInitializedYet("local identity"))?
        .clone();
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?
        .clone();

    let p_ephem_der = local_ephemeral.get_public_der()?;
    let s_ephem_der = remote_ephemeral_pub.to_der()?;
    let transcript = pico_auth_transcript(&p_ephem_der, &s_ephem_der, remote_nonce.as_bytes());

    let signature = crypto.sign(&identity, &transcript)?;
    let mac = crypto.mac(&derived.pico_auth_key, &transcript);

    let inner = PicoAuthInner {
        pico_id_pub_der: identity.get_public_der()?,
        signature,
        mac: mac.to_vec(),
        extra_data: extra_data.to_vec(),
    };

    let iv = fresh_iv(crypto);
    let aad = session_aad(session_id);
    let ciphertext = crypto.aead_encrypt(&derived.enc_key, &iv, &aad, &inner.to_bytes())?;

    Ok(PicoAuth {
        session_id,
        encrypted_data: B64::new(ciphertext),
        iv: B64::new(iv.to_vec()),
    })
}

/// The verified contents of a `PicoAuth` message: the claimed identity key
/// and the caller-supplied extra data, for the FSM to run its user-directory
/// authorization check against before deciding OK_DONE/OK_CONTINUE/REJECTED.
pub struct PicoAuthOutcome {
    pub pico_id_pub: EcPublicKey,
    pub extra_data: Vec<u8>,
}

/// Step 3 (V side). Verifies the MAC and signature on `PicoAuth`; does
/// *not* perform the user-directory lookup (that's the FSM's job, since it
/// owns the `UserDirectory` callback).
pub fn verifier_process_pico_auth(ctx: &mut SharedContext, crypto: &impl PicoCrypto, msg: &PicoAuth) -> Result<PicoAuthOutcome, HandshakeError> {
    let local_ephemeral = ctx
        .local_ephemeral()
        .ok_or(HandshakeError::NotInitializedYet("local ephemeral"))?;
    let remote_ephemeral_pub = ctx
        .remote_ephemeral_pub()
        .ok_or(HandshakeError::NotInitializedYet("remote ephemeral public"))?;
    let local_nonce = ctx
        .local_nonce()
        .ok_or(HandshakeError::NotInitializedYet("local nonce"))?;
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?
        .clone();

    let iv = parse_iv(msg.iv.as_slice())?;
    let aad = session_aad(msg.session_id);
    let plaintext = crypto.aead_decrypt(&derived.enc_key, &iv, &aad, msg.encrypted_data.as_slice())?;
    let inner = PicoAuthInner::from_bytes(&plaintext)?;

    let pico_id_pub = EcPublicKey::from_der(&inner.pico_id_pub_der)?;

    let p_ephem_der = remote_ephemeral_pub.to_der()?;
    let s_ephem_der = local_ephemeral.get_public_der()?;
    let transcript = pico_auth_transcript(&p_ephem_der, &s_ephem_der, local_nonce.as_bytes());

    if !crypto.mac_verify(&derived.pico_auth_key, &transcript, &inner.mac) {
        return Err(HandshakeError::MacMismatch);
    }
    if !crypto.verify(&pico_id_pub, &transcript, &inner.signature)? {
        return Err(HandshakeError::SignatureMismatch);
    }

    ctx.set_remote_identity_pub(pico_id_pub.clone());

    Ok(PicoAuthOutcome {
        pico_id_pub,
        extra_data: inner.extra_data,
    })
}

/// Step 4 (V→P). A one-byte outcome plus optional extra data.
pub fn verifier_build_status(
    ctx: &SharedContext,
    crypto: &impl PicoCrypto,
    session_id: i64,
    status: AuthStatus,
    extra_data: &[u8],
) -> Result<Status, HandshakeError> {
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?;

    let inner = StatusInner {
        status_byte: status.to_wire_byte(),
        extra_data: extra_data.to_vec(),
    };

    let iv = fresh_iv(crypto);
    let aad = session_aad(session_id);
    let ciphertext = crypto.aead_encrypt(&derived.enc_key, &iv, &aad, &inner.to_bytes())?;

    Ok(Status {
        session_id,
        encrypted_data: B64::new(ciphertext),
        iv: B64::new(iv.to_vec()),
    })
}

/// Step 4 (P side). Decrypts the status byte and extra data.
pub fn prover_process_status(ctx: &SharedContext, crypto: &impl PicoCrypto, msg: &Status) -> Result<(AuthStatus, Vec<u8>), HandshakeError> {
    let derived = ctx
        .derived()
        .ok_or(HandshakeError::NotInitializedYet("derived keys"))?;

    let iv = parse_iv(msg.iv.as_slice())?;
    let aad = session_aad(msg.session_id);
    let plaintext = crypto.aead_decrypt(&derived.enc_key, &iv, &aad, msg.encrypted_data.as_slice())?;
    let inner = StatusInner::from_bytes(&plaintext)?;

    let status = AuthStatus::from_wire_byte(inner.status_byte)
        .ok_or_else(|| HandshakeError::Crypto(CryptoError::KeyDecode(format!("unknown status byte {}", inner.status_byte))))?;

    Ok((status, inner.extra_data))
}
