//! Little-endian byte primitives shared by every packet schema
//!
//! Each packet struct decodes and encodes itself directly against a
//! [`bytes::Buf`]/[`bytes::BufMut`] cursor using the helpers below, rather
//! than going through a declarative schema DSL — there is no Rust
//! equivalent of `construct`'s `Struct(...)` that the original protocol used,
//! so the struct definition and its wire layout are expressed side by side.

use crate::codec::cp1250;
use crate::error::CodecError;
use bytes::{Buf, BufMut};

/// Read a length-prefixed (one byte) code page 1250 string.
pub fn read_pstring(buf: &mut impl Buf, event: &'static str) -> Result<String, CodecError> {
    let len = read_u8(buf, event)? as usize;
    let bytes = read_n(buf, len, event)?;
    Ok(cp1250::decode(&bytes))
}

/// Write a length-prefixed (one byte) code page 1250 string.
///
/// Fails if the encoded text does not fit in a one-byte length prefix.
pub fn write_pstring(buf: &mut impl BufMut, text: &str, event: &'static str) -> Result<(), CodecError> {
    let bytes = cp1250::encode(text);
    if bytes.len() > u8::MAX as usize {
        return Err(CodecError::encode(event, "string too long for a one-byte length prefix"));
    }
    buf.put_u8(bytes.len() as u8);
    buf.put_slice(&bytes);
    Ok(())
}

/// Read a NUL-terminated code page 1250 string.
pub fn read_cstring(buf: &mut impl Buf, event: &'static str) -> Result<String, CodecError> {
    let mut bytes = Vec::new();
    loop {
        let byte = read_u8(buf, event)?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    Ok(cp1250::decode(&bytes))
}

/// Write a NUL-terminated code page 1250 string.
pub fn write_cstring(buf: &mut impl BufMut, text: &str) {
    buf.put_slice(&cp1250::encode(text));
    buf.put_u8(0);
}

/// Read a fixed-width, space-padded ASCII string.
pub fn read_padded_string<const N: usize>(buf: &mut impl Buf, event: &'static str) -> Result<String, CodecError> {
    let bytes = read_n(buf, N, event)?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

/// Write a fixed-width, space-padded ASCII string.
pub fn write_padded_string<const N: usize>(buf: &mut impl BufMut, text: &str, event: &'static str) -> Result<(), CodecError> {
    if text.len() > N {
        return Err(CodecError::encode(event, "string too long for the fixed-width field"));
    }
    buf.put_slice(text.as_bytes());
    for _ in text.len()..N {
        buf.put_u8(b' ');
    }
    Ok(())
}

/// Read a single byte, surfacing end-of-buffer as a typed [`CodecError`].
pub fn read_u8(buf: &mut impl Buf, event: &'static str) -> Result<u8, CodecError> {
    if !buf.has_remaining() {
        return Err(CodecError::decode(event, "unexpected end of frame"));
    }
    Ok(buf.get_u8())
}

/// Read `n` bytes, surfacing a short buffer as a typed [`CodecError`].
pub fn read_n(buf: &mut impl Buf, n: usize, event: &'static str) -> Result<Vec<u8>, CodecError> {
    if buf.remaining() < n {
        return Err(CodecError::decode(event, "unexpected end of frame"));
    }
    let mut out = vec![0u8; n];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Read a fixed-size byte array.
pub fn read_array<const N: usize>(buf: &mut impl Buf, event: &'static str) -> Result<[u8; N], CodecError> {
    if buf.remaining() < N {
        return Err(CodecError::decode(event, "unexpected end of frame"));
    }
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Read the remainder of the frame.
pub fn read_greedy(buf: &mut impl Buf) -> Vec<u8> {
    let mut out = vec![0u8; buf.remaining()];
    buf.copy_to_slice(&mut out);
    out
}

/// MSB-first bit reader over a fixed run of whole bytes, used by the
/// irregular `bitstruct` fields (`PlusDetails.plus_data`, `GameState.state`).
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BitReader { bytes, bit: 0 }
    }

    /// Read `n` bits (MSB-first) as an unsigned value.
    pub fn take(&mut self, n: usize) -> u32 {
        let mut value: u32 = 0;
        for _ in 0..n {
            let byte = self.bytes[self.bit / 8];
            let shift = 7 - (self.bit % 8);
            let bit = (byte >> shift) & 1;
            value = (value << 1) | bit as u32;
            self.bit += 1;
        }
        value
    }
}

/// MSB-first bit writer, the counterpart to [`BitReader`].
pub struct BitWriter {
    bytes: Vec<u8>,
    bit: usize,
}

impl BitWriter {
    pub fn new(total_bytes: usize) -> Self {
        BitWriter { bytes: vec![0u8; total_bytes], bit: 0 }
    }

    /// Write the low `n` bits of `value` (MSB-first).
    pub fn put(&mut self, value: u32, n: usize) {
        for i in (0..n).rev() {
            let bit = (value >> i) & 1;
            let byte = self.bit / 8;
            let shift = 7 - (self.bit % 8);
            self.bytes[byte] |= (bit as u8) << shift;
            self.bit += 1;
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn pstring_round_trips() {
        let mut buf = BytesMut::new();
        write_pstring(&mut buf, "deathpit", "test").unwrap();
        let mut cursor = &buf[..];
        assert_eq!("deathpit", read_pstring(&mut cursor, "test").unwrap());
    }

    #[test]
    fn cstring_round_trips() {
        let mut buf = BytesMut::new();
        write_cstring(&mut buf, "Spaz");
        let mut cursor = &buf[..];
        assert_eq!("Spaz", read_cstring(&mut cursor, "test").unwrap());
    }

    #[test]
    fn padded_string_round_trips() {
        let mut buf = BytesMut::new();
        write_padded_string::<4>(&mut buf, "24", "test").unwrap();
        assert_eq!(&buf[..], b"24  ");
        let mut cursor = &buf[..];
        assert_eq!("24", read_padded_string::<4>(&mut cursor, "test").unwrap());
    }

    #[test]
    fn bit_reader_writer_round_trip() {
        let mut writer = BitWriter::new(1);
        writer.put(0, 4); // padding
        writer.put(1, 1);
        writer.put(0, 1);
        writer.put(1, 1);
        writer.put(1, 1);
        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.take(4), 0);
        assert_eq!(reader.take(1), 1);
        assert_eq!(reader.take(1), 0);
        assert_eq!(reader.take(1), 1);
        assert_eq!(reader.take(1), 1);
    }
}
