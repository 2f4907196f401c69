use elliptic_curve::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::{PublicKey, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// An ECDH/ECDSA key pair over NIST P-256, as used for both the long-term
/// service/Pico identity keys and the per-handshake ephemeral keys. The same
/// scalar serves both the ECDH agreement and the ECDSA signature, mirroring
/// how the reference `KeyPair` type is used interchangeably for both roles.
#[derive(Clone, ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)]
    secret: SecretKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        KeyPair {
            secret: SecretKey::random(&mut rand_core::OsRng),
        }
    }

    /// Generates from a caller-supplied CSPRNG instead of the system one.
    /// Used by deterministic test backends that need byte-reproducible
    /// keys; production code should use [`KeyPair::generate`].
    pub fn from_rng(rng: &mut (impl rand_core::RngCore + rand_core::CryptoRng)) -> Self {
        KeyPair { secret: SecretKey::random(rng) }
    }

    pub fn from_secret(secret: SecretKey) -> Self {
        KeyPair { secret }
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public(&self) -> EcPublicKey {
        EcPublicKey(self.secret.public_key())
    }

    pub fn get_public_der(&self) -> Result<Vec<u8>, CryptoError> {
        self.public().to_der()
    }

    pub fn get_public_pem(&self) -> Result<String, CryptoError> {
        self.public().to_pem()
    }

    pub fn sign(&self, buf: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let signing_key = SigningKey::from(&self.secret);
        let signature: Signature = signing_key.sign(buf);
        Ok(signature.to_bytes().to_vec())
    }

    pub fn verify(&self, buf: &[u8], sig: &[u8]) -> Result<bool, CryptoError> {
        self.public().verify(buf, sig)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ public: {:?} }}", self.public())
    }
}

/// The public half of a [`KeyPair`], carried on the wire as DER or PEM
/// depending on the message (see `pico_wire`).
#[derive(Clone, PartialEq, Eq)]
pub struct EcPublicKey(PublicKey);

impl EcPublicKey {
    pub fn inner(&self) -> &PublicKey {
        &self.0
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self, CryptoError> {
        PublicKey::from_public_key_der(bytes)
            .map(EcPublicKey)
            .map_err(|e| CryptoError::KeyDecode(e.to_string()))
    }

    pub fn to_der(&self) -> Result<Vec<u8>, CryptoError> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::KeyDecode(e.to_string()))
    }

    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        PublicKey::from_public_key_pem(pem)
            .map(EcPublicKey)
            .map_err(|e| CryptoError::KeyDecode(e.to_string()))
    }

    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyDecode(e.to_string()))
    }

    pub fn verify(&self, buf: &[u8], sig: &[u8]) -> Result<bool, CryptoError> {
        let verifying_key = VerifyingKey::from(&self.0);
        let signature = Signature::from_slice(sig).map_err(|e| CryptoError::KeyDecode(e.to_string()))?;
        Ok(verifying_key.verify(buf, &signature).is_ok())
    }
}

impl std::fmt::Debug for EcPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_der() {
            Ok(der) => write!(f, "EcPublicKey({})", hex::encode(der)),
            Err(_) => write!(f, "EcPublicKey(<undecodable>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn der_round_trips() {
        let kp = KeyPair::generate();
        let der = kp.get_public_der().unwrap();
        let parsed = EcPublicKey::from_der(&der).unwrap();
        assert_eq!(parsed, kp.public());
    }

    #[test]
    fn pem_round_trips() {
        let kp = KeyPair::generate();
        let pem = kp.get_public_pem().unwrap();
        let parsed = EcPublicKey::from_pem(&pem).unwrap();
        assert_eq!(parsed, kp.public());
    }

    #[test]
    fn sign_then_verify_succeeds() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"transcript bytes").unwrap();
        assert!(kp.verify(b"transcript bytes", &sig).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"transcript bytes").unwrap();
        assert!(!kp.verify(b"different bytes", &sig).unwrap());
    }
}
