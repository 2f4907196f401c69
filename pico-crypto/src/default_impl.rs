use rand::RngCore;

use crate::aead;
use crate::error::CryptoError;
use crate::kdf::{self, DerivedKeys};
use crate::keys::{EcPublicKey, KeyPair};

/// Isolates the concrete crypto backend behind a trait so the protocol
/// engine (`pico-handshake`, `pico-fsm`) never names `p256`/`aes-gcm`
/// directly. Tests can substitute a deterministic implementation; a future
/// FIPS-certified backend could replace [`DefaultCrypto`] without touching
/// any protocol code.
pub trait PicoCrypto {
    fn generate_keypair(&self) -> KeyPair;
    fn ecdh_derive(&self, local: &KeyPair, peer_public: &EcPublicKey) -> Result<[u8; 32], CryptoError>;
    fn derive_subkeys(&self, shared_secret: &[u8; 32]) -> Result<DerivedKeys, CryptoError>;
    fn aead_encrypt(&self, key: &[u8; 32], iv: &[u8; aead::IV_LEN], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn aead_decrypt(&self, key: &[u8; 32], iv: &[u8; aead::IV_LEN], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn mac(&self, key: &[u8; 32], data: &[u8]) -> [u8; 32];
    fn mac_verify(&self, key: &[u8; 32], data: &[u8], tag: &[u8]) -> bool;
    fn sign(&self, key: &KeyPair, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn verify(&self, public: &EcPublicKey, data: &[u8], sig: &[u8]) -> Result<bool, CryptoError>;
    fn csprng(&self, n: usize) -> Vec<u8>;
}

/// The production crypto backend: P-256 ECDH/ECDSA, AES-256-GCM, HKDF-SHA256
/// and the system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCrypto;

impl PicoCrypto for DefaultCrypto {
    fn generate_keypair(&self) -> KeyPair {
        KeyPair::generate()
    }

    fn ecdh_derive(&self, local: &KeyPair, peer_public: &EcPublicKey) -> Result<[u8; 32], CryptoError> {
        kdf::ecdh_derive(local, peer_public)
    }

    fn derive_subkeys(&self, shared_secret: &[u8; 32]) -> Result<DerivedKeys, CryptoError> {
        kdf::derive_subkeys(shared_secret)
    }

    fn aead_encrypt(&self, key: &[u8; 32], iv: &[u8; aead::IV_LEN], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::encrypt(key, iv, aad, plaintext)
    }

    fn aead_decrypt(&self, key: &[u8; 32], iv: &[u8; aead::IV_LEN], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::decrypt(key, iv, aad, ciphertext)
    }

    fn mac(&self, key: &[u8; 32], data: &[u8]) -> [u8; 32] {
        kdf::mac(key, data)
    }

    fn mac_verify(&self, key: &[u8; 32], data: &[u8], tag: &[u8]) -> bool {
        kdf::mac_verify(key, data, tag)
    }

    fn sign(&self, key: &KeyPair, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        key.sign(data)
    }

    fn verify(&self, public: &EcPublicKey, data: &[u8], sig: &[u8]) -> Result<bool, CryptoError> {
        public.verify(data, sig)
    }

    fn csprng(&self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        rand::thread_rng().fill_bytes(&mut buf);
        buf
    }
}
