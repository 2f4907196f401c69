//! Cryptographic primitives for the Pico protocol, isolated behind the
//! [`PicoCrypto`] trait so the protocol engine never names a concrete
//! backend crate directly.

mod aead;
mod default_impl;
mod error;
mod kdf;
mod keys;

pub use aead::{IV_LEN, TAG_LEN};
pub use default_impl::{DefaultCrypto, PicoCrypto};
pub use error::CryptoError;
pub use kdf::DerivedKeys;
pub use keys::{EcPublicKey, KeyPair};
