//! Plaintext layouts carried inside each message's `encryptedData` field,
//! per spec.md section 3's "Inner (after decrypt)" column. Each `to_bytes`
//! is the exact plaintext handed to AEAD encryption; each `from_bytes` must
//! consume the decrypted plaintext exactly, via [`FrameReader::finish`].

use pico_types::{ReauthState, SequenceNumber};

use crate::error::CodecError;
use crate::framing::{FrameReader, FrameWriter};

/// `sId_pub ‖ serviceNonce ‖ signature ‖ mac_over_handshake_transcript`
/// (`ServiceAuth`'s inner payload, per spec.md section 4.4 step 2 — the
/// abbreviated section 3 table omits the signature field present in the
/// detailed description, and `serviceNonce` has no other carrier on the
/// wire but is required for the Pico to reproduce the `PicoAuth` transcript
/// in step 3, so it travels here under the same AEAD envelope).
#[derive(Debug, Clone)]
pub struct ServiceAuthInner {
    pub service_id_pub_der: Vec<u8>,
    pub service_nonce: Vec<u8>,
    pub signature: Vec<u8>,
    pub mac: Vec<u8>,
}

impl ServiceAuthInner {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = FrameWriter::new();
        w.write_field(&self.service_id_pub_der);
        w.write_field(&self.service_nonce);
        w.write_field(&self.signature);
        w.write_field(&self.mac);
        w.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = FrameReader::new(bytes);
        let service_id_pub_der = r.read_field()?.to_vec();
        let service_nonce = r.read_field()?.to_vec();
        let signature = r.read_field()?.to_vec();
        let mac = r.read_field()?.to_vec();
        r.finish()?;
        Ok(ServiceAuthInner { service_id_pub_der, service_nonce, signature, mac })
    }
}

/// `pId_pub ‖ signature ‖ mac ‖ lenprefixed(extraData)` (`PicoAuth`'s inner
/// payload, symmetric counterpart of [`ServiceAuthInner`]).
#[derive(Debug, Clone)]
pub struct PicoAuthInner {
    pub pico_id_pub_der: Vec<u8>,
    pub signature: Vec<u8>,
    pub mac: Vec<u8>,
    pub extra_data: Vec<u8>,
}

impl PicoAuthInner {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = FrameWriter::new();
        w.write_field(&self.pico_id_pub_der);
        w.write_field(&self.signature);
        w.write_field(&self.mac);
        w.write_field(&self.extra_data);
        w.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = FrameReader::new(bytes);
        let pico_id_pub_der = r.read_field()?.to_vec();
        let signature = r.read_field()?.to_vec();
        let mac = r.read_field()?.to_vec();
        let extra_data = r.read_field()?.to_vec();
        r.finish()?;
        Ok(PicoAuthInner { pico_id_pub_der, signature, mac, extra_data })
    }
}

/// `status_byte ‖ lenprefixed(extraData)` (`Status`'s inner payload). The
/// status byte is decoded as a signed 8-bit integer (`OK_DONE=0,
/// OK_CONTINUE=1, REJECTED=-1, ERROR=-2`).
#[derive(Debug, Clone)]
pub struct StatusInner {
    pub status_byte: i8,
    pub extra_data: Vec<u8>,
}

impl StatusInner {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = FrameWriter::new();
        w.write_i8(self.status_byte);
        w.write_field(&self.extra_data);
        w.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = FrameReader::new(bytes);
        let status_byte = r.read_i8()?;
        let extra_data = r.read_field()?.to_vec();
        r.finish()?;
        Ok(StatusInner { status_byte, extra_data })
    }
}

/// `reauthState ‖ lp(seqNum) ‖ lp(extraData)` (`PicoReauth`'s inner payload).
#[derive(Debug, Clone)]
pub struct PicoReauthInner {
    pub reauth_state_byte: i8,
    pub sequence_number: SequenceNumber,
    pub extra_data: Vec<u8>,
}

impl PicoReauthInner {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = FrameWriter::new();
        w.write_i8(self.reauth_state_byte);
        w.write_sequence(&self.sequence_number);
        w.write_field(&self.extra_data);
        w.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = FrameReader::new(bytes);
        let reauth_state_byte = r.read_i8()?;
        let sequence_number = r.read_sequence()?;
        let extra_data = r.read_field()?.to_vec();
        r.finish()?;
        Ok(PicoReauthInner { reauth_state_byte, sequence_number, extra_data })
    }

    pub fn reauth_state(&self) -> Option<ReauthState> {
        ReauthState::from_wire_byte(self.reauth_state_byte)
    }
}

/// `reauthState ‖ int32_timeout ‖ lp(seqNum) ‖ lp(extraData)`
/// (`ServiceReauth`'s inner payload).
#[derive(Debug, Clone)]
pub struct ServiceReauthInner {
    pub reauth_state_byte: i8,
    pub timeout_ms: i32,
    pub sequence_number: SequenceNumber,
    pub extra_data: Vec<u8>,
}

impl ServiceReauthInner {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = FrameWriter::new();
        w.write_i8(self.reauth_state_byte);
        w.write_i32(self.timeout_ms);
        w.write_sequence(&self.sequence_number);
        w.write_field(&self.extra_data);
        w.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = FrameReader::new(bytes);
        let reauth_state_byte = r.read_i8()?;
        let timeout_ms = r.read_i32()?;
        let sequence_number = r.read_sequence()?;
        let extra_data = r.read_field()?.to_vec();
        r.finish()?;
        Ok(ServiceReauthInner { reauth_state_byte, timeout_ms, sequence_number, extra_data })
    }

    pub fn reauth_state(&self) -> Option<ReauthState> {
        ReauthState::from_wire_byte(self.reauth_state_byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_auth_inner_round_trips() {
        let inner = ServiceAuthInner {
            service_id_pub_der: vec![1, 2, 3],
            service_nonce: vec![5; 16],
            signature: vec![9; 64],
            mac: vec![4; 32],
        };
        let bytes = inner.to_bytes();
        let parsed = ServiceAuthInner::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.service_id_pub_der, inner.service_id_pub_der);
        assert_eq!(parsed.service_nonce, inner.service_nonce);
        assert_eq!(parsed.signature, inner.signature);
        assert_eq!(parsed.mac, inner.mac);
    }

    #[test]
    fn pico_reauth_inner_round_trips() {
        let inner = PicoReauthInner {
            reauth_state_byte: ReauthState::Continue.to_wire_byte().unwrap(),
            sequence_number: SequenceNumber::from_be_bytes([0, 0, 0, 0, 0, 0, 0, 42]),
            extra_data: vec![],
        };
        let bytes = inner.to_bytes();
        let parsed = PicoReauthInner::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.reauth_state(), Some(ReauthState::Continue));
        assert_eq!(parsed.sequence_number, inner.sequence_number);
    }

    #[test]
    fn service_reauth_inner_round_trips_with_extra_data() {
        let inner = ServiceReauthInner {
            reauth_state_byte: ReauthState::Pause.to_wire_byte().unwrap(),
            timeout_ms: 50_000,
            sequence_number: SequenceNumber::random(),
            extra_data: vec![0xde, 0xad],
        };
        let bytes = inner.to_bytes();
        let parsed = ServiceReauthInner::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.reauth_state(), Some(ReauthState::Pause));
        assert_eq!(parsed.timeout_ms, 50_000);
        assert_eq!(parsed.extra_data, vec![0xde, 0xad]);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let inner = StatusInner { status_byte: 0, extra_data: vec![] };
        let mut bytes = inner.to_bytes();
        bytes.push(0x01);
        assert!(StatusInner::from_bytes(&bytes).is_err());
    }
}
