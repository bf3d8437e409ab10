//! # Byte Encodings
//!
//! Hex helpers and the fixed-width writer/reader pair used by every wire
//! format in the workspace (issuer public keys, credentials, proofs,
//! ownership proofs).
//!
//! Integers are big-endian. Length prefixes are `u16` unless a layout says
//! otherwise. [`ByteReader::finish()`] must be called once decoding is
//! complete; it rejects trailing bytes so that two distinct byte strings
//! never decode to the same object.

use crate::error::EncodingError;

/// Lowercase hex encoding.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string (either case, no prefix).
pub fn from_hex(s: &str) -> Result<Vec<u8>, EncodingError> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(EncodingError::InvalidHex(format!(
            "odd length ({} characters)",
            s.len()
        )));
    }
    if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(EncodingError::InvalidHex(format!("non-hex character {c:?}")));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| EncodingError::InvalidHex(format!("bad digit pair at offset {i}")))
        })
        .collect()
}

/// Append-only buffer for protocol layouts.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Raw bytes with no length prefix (fixed-width fields).
    pub fn put_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// A `u16`-length-prefixed byte string.
    pub fn put_bytes_u16(&mut self, field: &'static str, bytes: &[u8]) -> Result<(), EncodingError> {
        let len = u16::try_from(bytes.len()).map_err(|_| EncodingError::LengthOverflow {
            field,
            len: bytes.len(),
            max: u16::MAX as usize,
        })?;
        self.put_u16(len);
        self.put_fixed(bytes);
        Ok(())
    }

    /// A `u32`-length-prefixed byte string.
    pub fn put_bytes_u32(&mut self, field: &'static str, bytes: &[u8]) -> Result<(), EncodingError> {
        let len = u32::try_from(bytes.len()).map_err(|_| EncodingError::LengthOverflow {
            field,
            len: bytes.len(),
            max: u32::MAX as usize,
        })?;
        self.put_u32(len);
        self.put_fixed(bytes);
        Ok(())
    }

    /// A `u16` element count.
    pub fn put_count(&mut self, field: &'static str, count: usize) -> Result<(), EncodingError> {
        let n = u16::try_from(count).map_err(|_| EncodingError::LengthOverflow {
            field,
            len: count,
            max: u16::MAX as usize,
        })?;
        self.put_u16(n);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], EncodingError> {
        if self.remaining() < n {
            return Err(EncodingError::Truncated {
                field,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, EncodingError> {
        Ok(self.take(field, 1)?[0])
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, EncodingError> {
        let arr: [u8; 2] = self.read_array(field)?;
        Ok(u16::from_be_bytes(arr))
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, EncodingError> {
        let arr: [u8; 4] = self.read_array(field)?;
        Ok(u32::from_be_bytes(arr))
    }

    /// A fixed-width field.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], EncodingError> {
        let slice = self.take(field, N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(slice);
        Ok(arr)
    }

    pub fn read_bytes_u16(&mut self, field: &'static str) -> Result<&'a [u8], EncodingError> {
        let len = self.read_u16(field)? as usize;
        self.take(field, len)
    }

    pub fn read_bytes_u32(&mut self, field: &'static str) -> Result<&'a [u8], EncodingError> {
        let len = self.read_u32(field)? as usize;
        self.take(field, len)
    }

    pub fn read_string_u16(&mut self, field: &'static str) -> Result<String, EncodingError> {
        let bytes = self.read_bytes_u16(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| EncodingError::InvalidUtf8(field))
    }

    pub fn read_string_u32(&mut self, field: &'static str) -> Result<String, EncodingError> {
        let bytes = self.read_bytes_u32(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| EncodingError::InvalidUtf8(field))
    }

    /// Consume the reader, failing if any bytes are left over.
    pub fn finish(self) -> Result<(), EncodingError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(EncodingError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_and_case() {
        assert_eq!(to_hex(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(from_hex("00ABff").unwrap(), vec![0x00, 0xab, 0xff]);
        assert!(from_hex("abc").is_err());
        assert!(from_hex("zz").is_err());
        assert_eq!(from_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn writer_reader_layout() {
        let mut w = ByteWriter::new();
        w.put_u8(1);
        w.put_u16(0x0203);
        w.put_fixed(&[9, 9, 9]);
        w.put_bytes_u16("name", b"m3").unwrap();
        w.put_bytes_u32("value", b"student").unwrap();
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..3], &[1, 2, 3]);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u8("tag").unwrap(), 1);
        assert_eq!(r.read_u16("n").unwrap(), 0x0203);
        assert_eq!(r.read_array::<3>("fixed").unwrap(), [9, 9, 9]);
        assert_eq!(r.read_string_u16("name").unwrap(), "m3");
        assert_eq!(r.read_string_u32("value").unwrap(), "student");
        r.finish().unwrap();
    }

    #[test]
    fn truncated_input_is_reported() {
        let mut r = ByteReader::new(&[0x00, 0x05, b'a']);
        match r.read_bytes_u16("nonce") {
            Err(EncodingError::Truncated { field, needed, remaining }) => {
                assert_eq!(field, "nonce");
                assert_eq!(needed, 5);
                assert_eq!(remaining, 1);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut r = ByteReader::new(&[7, 8]);
        r.read_u8("first").unwrap();
        assert_eq!(r.finish(), Err(EncodingError::TrailingBytes(1)));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut w = ByteWriter::new();
        w.put_bytes_u16("name", &[0xff, 0xfe]).unwrap();
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_string_u16("name"), Err(EncodingError::InvalidUtf8("name")));
    }

    #[test]
    fn oversized_u16_prefix_is_an_error() {
        let big = vec![0u8; u16::MAX as usize + 1];
        let mut w = ByteWriter::new();
        assert!(matches!(
            w.put_bytes_u16("blob", &big),
            Err(EncodingError::LengthOverflow { .. })
        ));
    }
}
