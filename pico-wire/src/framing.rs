use byteorder::{BigEndian, ByteOrder};
use pico_types::SequenceNumber;

use crate::error::CodecError;

const LEN_HEADER_SIZE: usize = 2;

/// Builds an inner message payload as a sequence of `len_u16_be ‖ bytes`
/// fields. Single-byte and four-byte fixed fields (status bytes, reauth
/// states, the `ServiceReauth` timeout) are written without a length header
/// since their width is implicit in the message shape.
#[derive(Default)]
pub struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    pub fn new() -> Self {
        FrameWriter { buf: Vec::new() }
    }

    /// Writes `bytes` prefixed by its 2-byte big-endian length.
    pub fn write_field(&mut self, bytes: &[u8]) -> &mut Self {
        let mut header = [0u8; LEN_HEADER_SIZE];
        BigEndian::write_u16(&mut header, bytes.len() as u16);
        self.buf.extend_from_slice(&header);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Writes a [`SequenceNumber`] length-prefixed even though its 8-byte
    /// width is fixed, preserving wire compatibility with the source
    /// protocol's framing.
    pub fn write_sequence(&mut self, seq: &SequenceNumber) -> &mut Self {
        self.write_field(&seq.to_be_bytes())
    }

    pub fn write_i8(&mut self, v: i8) -> &mut Self {
        self.buf.push(v as u8);
        self
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        let mut bytes = [0u8; 4];
        BigEndian::write_i32(&mut bytes, v);
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads a [`FrameWriter`]-encoded payload back out, failing if the caller
/// doesn't consume the buffer exactly ([`FrameReader::finish`]).
pub struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        FrameReader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() - self.pos < n {
            return Err(CodecError::Truncated {
                expected: n,
                actual: self.buf.len() - self.pos,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_field(&mut self) -> Result<&'a [u8], CodecError> {
        let header = self.take(LEN_HEADER_SIZE)?;
        let len = BigEndian::read_u16(header) as usize;
        self.take(len)
    }

    pub fn read_sequence(&mut self) -> Result<SequenceNumber, CodecError> {
        let field = self.read_field()?;
        if field.len() != SequenceNumber::SIZE {
            return Err(CodecError::BadLength("sequenceNumber"));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(field);
        Ok(SequenceNumber::from_be_bytes(bytes))
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    /// Confirms every byte of the payload was consumed. Every inner
    /// decoder must call this: trailing bytes after a decrypt are a
    /// protocol violation, not silently ignorable padding.
    pub fn finish(self) -> Result<(), CodecError> {
        let leftover = self.buf.len() - self.pos;
        if leftover != 0 {
            return Err(CodecError::TrailingBytes { leftover });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_round_trips() {
        let mut w = FrameWriter::new();
        w.write_field(b"hello").write_field(b"world");
        let bytes = w.finish();

        let mut r = FrameReader::new(&bytes);
        assert_eq!(r.read_field().unwrap(), b"hello");
        assert_eq!(r.read_field().unwrap(), b"world");
        r.finish().unwrap();
    }

    #[test]
    fn sequence_round_trips_length_prefixed() {
        let seq = SequenceNumber::from_be_bytes([1, 2, 3, 4, 5, 6, 7, 8]);
        let mut w = FrameWriter::new();
        w.write_sequence(&seq);
        let bytes = w.finish();
        assert_eq!(bytes.len(), 2 + 8);

        let mut r = FrameReader::new(&bytes);
        assert_eq!(r.read_sequence().unwrap(), seq);
        r.finish().unwrap();
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut w = FrameWriter::new();
        w.write_field(b"hello");
        let mut bytes = w.finish();
        bytes.push(0xff);

        let mut r = FrameReader::new(&bytes);
        let _ = r.read_field().unwrap();
        assert!(r.finish().is_err());
    }

    #[test]
    fn truncated_field_is_rejected() {
        let bytes = [0x00, 0x05, b'h', b'i'];
        let mut r = FrameReader::new(&bytes);
        assert!(r.read_field().is_err());
    }
}
