//! The seven wire messages of spec.md section 3, serialized as JSON with
//! base64-encoded binary fields. Field names are exact matches of the
//! table in spec.md so the wire format is interoperable with any other
//! conforming implementation.

use serde::{Deserialize, Serialize};

use crate::b64::B64;
use crate::error::CodecError;

fn to_json<T: Serialize>(value: &T) -> Vec<u8> {
    // `serde_json::to_vec` only fails on a handful of unrepresentable
    // inputs (NaN floats, non-string map keys) that never occur in these
    // plain structs, so failure here would be a programmer error.
    serde_json::to_vec(value).expect("wire message must serialize")
}

fn from_json<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// P→V: the Pico's ephemeral public key, nonce, and protocol version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Start {
    pub pico_ephemeral_public_key: String,
    pub pico_nonce: B64,
    pub pico_version: u32,
}

impl Start {
    pub fn to_bytes(&self) -> Vec<u8> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_json(bytes)
    }
}

/// V→P: the service's ephemeral public key plus the encrypted proof of its
/// identity ([`crate::inner::ServiceAuthInner`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAuth {
    pub session_id: i64,
    pub service_ephem_public_key: String,
    pub encrypted_data: B64,
    pub iv: B64,
}

impl ServiceAuth {
    pub fn to_bytes(&self) -> Vec<u8> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_json(bytes)
    }
}

/// P→V: the Pico's encrypted proof of identity
/// ([`crate::inner::PicoAuthInner`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicoAuth {
    pub session_id: i64,
    pub encrypted_data: B64,
    pub iv: B64,
}

impl PicoAuth {
    pub fn to_bytes(&self) -> Vec<u8> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_json(bytes)
    }
}

/// V→P: the handshake outcome ([`crate::inner::StatusInner`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub session_id: i64,
    pub encrypted_data: B64,
    pub iv: B64,
}

impl Status {
    pub fn to_bytes(&self) -> Vec<u8> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_json(bytes)
    }
}

/// P→V: one leg of the continuous-auth ping-pong
/// ([`crate::inner::PicoReauthInner`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicoReauth {
    pub session_id: i64,
    pub encrypted_data: B64,
    pub iv: B64,
}

impl PicoReauth {
    pub fn to_bytes(&self) -> Vec<u8> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_json(bytes)
    }
}

/// V→P: the other leg of the continuous-auth ping-pong
/// ([`crate::inner::ServiceReauthInner`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReauth {
    pub session_id: i64,
    pub encrypted_data: B64,
    pub iv: B64,
}

impl ServiceReauth {
    pub fn to_bytes(&self) -> Vec<u8> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_json(bytes)
    }
}

/// The QR-carried pairing payload, signed by the service's long-term
/// identity key. `t` distinguishes a first-time pairing (`KeyPairing`) from
/// a previously-paired Pico revisiting the same service (`KeyAuth`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PairingKind {
    KeyPairing = 0,
    KeyAuth = 1,
}

impl Serialize for PairingKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for PairingKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(PairingKind::KeyPairing),
            1 => Ok(PairingKind::KeyAuth),
            other => Err(serde::de::Error::custom(format!("unknown pairing kind discriminant {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPairingMessage {
    /// Service display name.
    pub sn: String,
    /// Service long-term identity public key, DER.
    pub spk: B64,
    /// ECDSA signature over `spk ‖ ed ‖ sa ‖ td ‖ t` by the service's
    /// identity key.
    pub sig: B64,
    /// Extra data the embedder wants bound into the pairing.
    pub ed: B64,
    /// Rendezvous channel URL the prover should dial.
    pub sa: String,
    /// 8-byte session identifier seed.
    pub td: B64,
    /// Pairing kind discriminant.
    pub t: PairingKind,
}

impl KeyPairingMessage {
    /// The exact byte sequence the signature in `sig` is computed over.
    pub fn signed_transcript(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.spk.as_slice());
        buf.extend_from_slice(self.ed.as_slice());
        buf.extend_from_slice(self.sa.as_bytes());
        buf.extend_from_slice(self.td.as_slice());
        buf.push(self.t as u8);
        buf
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_json(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_round_trips() {
        let start = Start {
            pico_ephemeral_public_key: "-----BEGIN PUBLIC KEY-----\n".to_string(),
            pico_nonce: B64::new(vec![1, 2, 3, 4]),
            pico_version: 2,
        };
        let bytes = start.to_bytes();
        let parsed = Start::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.pico_version, 2);
        assert_eq!(parsed.pico_nonce.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn field_names_are_exact_camel_case() {
        let start = Start {
            pico_ephemeral_public_key: "pem".to_string(),
            pico_nonce: B64::new(vec![]),
            pico_version: 2,
        };
        let json = String::from_utf8(start.to_bytes()).unwrap();
        assert!(json.contains("\"picoEphemeralPublicKey\""));
        assert!(json.contains("\"picoNonce\""));
        assert!(json.contains("\"picoVersion\""));
    }

    #[test]
    fn key_pairing_round_trips() {
        let msg = KeyPairingMessage {
            sn: "service".to_string(),
            spk: B64::new(vec![1; 4]),
            sig: B64::new(vec![2; 4]),
            ed: B64::new(vec![]),
            sa: "wss://rendezvous.example/abc".to_string(),
            td: B64::new(vec![0; 8]),
            t: PairingKind::KeyPairing,
        };
        let bytes = msg.to_bytes();
        let parsed = KeyPairingMessage::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.sa, msg.sa);
        assert_eq!(parsed.t, PairingKind::KeyPairing);
    }
}
