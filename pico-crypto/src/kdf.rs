use hkdf::Hkdf;
use hmac::{Hmac, Mac as HmacTrait};
use p256::ecdh::diffie_hellman;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::keys::{EcPublicKey, KeyPair};

/// Fixed info string mixed into the HKDF expansion that derives the four
/// handshake subkeys from the raw ECDH output. Both sides must agree on
/// this exactly or their derived keys will silently diverge and every
/// subsequent MAC/AEAD check will fail.
const HKDF_INFO: &[u8] = b"pico-sigma-i-v1 enc|mac|picoAuth|serviceAuth";

/// `ECDH(local_priv, peer_pub)` hashed with SHA-256, as the reference
/// protocol's `sharedSecret`. Hashing the raw agreement output (rather than
/// using the x-coordinate directly) avoids leaking curve-specific structure
/// into the subsequent HKDF.
pub fn ecdh_derive(local: &KeyPair, peer_public: &EcPublicKey) -> Result<[u8; 32], CryptoError> {
    let shared = diffie_hellman(
        local.secret().to_nonzero_scalar(),
        peer_public.inner().as_affine(),
    );

    let mut hasher = Sha256::new();
    hasher.update(shared.raw_secret_bytes().as_slice());
    let digest = hasher.finalize();

    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}

/// The four subkeys derived once per handshake and reused by the message
/// codec for the rest of the session.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKeys {
    pub enc_key: [u8; 32],
    pub mac_key: [u8; 32],
    pub pico_auth_key: [u8; 32],
    pub service_auth_key: [u8; 32],
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DerivedKeys {{ .. }}")
    }
}

pub fn derive_subkeys(shared_secret: &[u8; 32]) -> Result<DerivedKeys, CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);
    let mut okm = [0u8; 128];
    hkdf.expand(HKDF_INFO, &mut okm)
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;

    let mut enc_key = [0u8; 32];
    let mut mac_key = [0u8; 32];
    let mut pico_auth_key = [0u8; 32];
    let mut service_auth_key = [0u8; 32];
    enc_key.copy_from_slice(&okm[0..32]);
    mac_key.copy_from_slice(&okm[32..64]);
    pico_auth_key.copy_from_slice(&okm[64..96]);
    service_auth_key.copy_from_slice(&okm[96..128]);
    okm.zeroize();

    Ok(DerivedKeys {
        enc_key,
        mac_key,
        pico_auth_key,
        service_auth_key,
    })
}

/// HMAC-SHA256 over `data` keyed by `key`, used to authenticate the
/// handshake transcript inside `ServiceAuth`/`PicoAuth`'s encrypted payload.
pub fn mac(key: &[u8; 32], data: &[u8]) -> [u8; 32] {
    let mut hmac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
    hmac.update(data);
    let result = hmac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

pub fn mac_verify(key: &[u8; 32], data: &[u8], tag: &[u8]) -> bool {
    let mut hmac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
    hmac.update(data);
    hmac.verify_slice(tag).is_ok()
}
