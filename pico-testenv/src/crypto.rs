#![cfg(feature = "testing")]

use std::sync::Mutex;

use pico_crypto::{DefaultCrypto, DerivedKeys, EcPublicKey, KeyPair, PicoCrypto, IV_LEN};
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

/// A [`PicoCrypto`] backend that derives key material and nonces from a
/// fixed-seed CSPRNG instead of the system one, so a test can assert on
/// exact wire bytes or simply re-run a scenario byte-for-byte. Everything
/// that doesn't consume randomness (AEAD, HKDF, signing, verification) is
/// delegated straight to [`DefaultCrypto`] — only key generation and raw
/// `csprng` draws are intercepted.
pub struct DeterministicCrypto {
    rng: Mutex<ChaCha8Rng>,
    inner: DefaultCrypto,
}

impl DeterministicCrypto {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        DeterministicCrypto { rng: Mutex::new(ChaCha8Rng::from_seed(seed)), inner: DefaultCrypto }
    }
}

impl PicoCrypto for DeterministicCrypto {
    fn generate_keypair(&self) -> KeyPair {
        let mut rng = self.rng.lock().expect("rng mutex poisoned");
        KeyPair::from_rng(&mut *rng)
    }

    fn ecdh_derive(&self, local: &KeyPair, peer_public: &EcPublicKey) -> Result<[u8; 32], pico_crypto::CryptoError> {
        self.inner.ecdh_derive(local, peer_public)
    }

    fn derive_subkeys(&self, shared_secret: &[u8; 32]) -> Result<DerivedKeys, pico_crypto::CryptoError> {
        self.inner.derive_subkeys(shared_secret)
    }

    fn aead_encrypt(&self, key: &[u8; 32], iv: &[u8; IV_LEN], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, pico_crypto::CryptoError> {
        self.inner.aead_encrypt(key, iv, aad, plaintext)
    }

    fn aead_decrypt(&self, key: &[u8; 32], iv: &[u8; IV_LEN], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, pico_crypto::CryptoError> {
        self.inner.aead_decrypt(key, iv, aad, ciphertext)
    }

    fn mac(&self, key: &[u8; 32], data: &[u8]) -> [u8; 32] {
        self.inner.mac(key, data)
    }

    fn mac_verify(&self, key: &[u8; 32], data: &[u8], tag: &[u8]) -> bool {
        self.inner.mac_verify(key, data, tag)
    }

    fn sign(&self, key: &KeyPair, data: &[u8]) -> Result<Vec<u8>, pico_crypto::CryptoError> {
        self.inner.sign(key, data)
    }

    fn verify(&self, public: &EcPublicKey, data: &[u8], sig: &[u8]) -> Result<bool, pico_crypto::CryptoError> {
        self.inner.verify(public, data, sig)
    }

    fn csprng(&self, n: usize) -> Vec<u8> {
        let mut rng = self.rng.lock().expect("rng mutex poisoned");
        let mut buf = vec![0u8; n];
        rng.fill_bytes(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_reproduces_the_same_keypair() {
        let a = DeterministicCrypto::from_seed([7u8; 32]);
        let b = DeterministicCrypto::from_seed([7u8; 32]);
        let kp_a = a.generate_keypair();
        let kp_b = b.generate_keypair();
        assert_eq!(kp_a.public(), kp_b.public());
    }

    #[test]
    fn different_seeds_diverge() {
        let a = DeterministicCrypto::from_seed([1u8; 32]);
        let b = DeterministicCrypto::from_seed([2u8; 32]);
        assert_ne!(a.generate_keypair().public(), b.generate_keypair().public());
    }
}
