//! Variable-length integers
//!
//! Name and value lengths inside name-value pairs are written in one of two
//! forms:
//!
//! ```text
//! 0 ..= 127          0xxxxxxx                              (1 byte)
//! 128 ..= 0x7FFFFFFF 1xxxxxxx xxxxxxxx xxxxxxxx xxxxxxxx   (4 bytes, big-endian)
//! ```
//!
//! A decoded value keeps the raw form it arrived in, so a four-byte encoding of
//! a small number is written back as the same four bytes.

use std::io::{ErrorKind, Read};

use bytes::BufMut;

use crate::error::{FcgiError, Result};

/// Largest value a variable length can carry
pub const MAX_VALUE: u32 = 0x7FFF_FFFF;

/// Largest value stored in the one-byte form
pub const MAX_SINGLE_BYTE: u32 = 0x7F;

/// High bit marking the four-byte form
const LONG_FORM_MARKER: u32 = 0x8000_0000;

/// A length as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableLength(Repr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Repr {
    /// Raw byte, high bit clear
    OneByte(u8),
    /// Raw big-endian word, high bit set
    FourByte(u32),
}

impl VariableLength {
    /// Encode `n` in its shortest form.
    ///
    /// Fails with [`FcgiError::Overflow`] above [`MAX_VALUE`].
    pub fn new(n: u32) -> Result<Self> {
        Self::from_u64(u64::from(n))
    }

    /// Encode the length of a byte sequence.
    pub fn from_len(len: usize) -> Result<Self> {
        Self::from_u64(len as u64)
    }

    fn from_u64(n: u64) -> Result<Self> {
        if n > u64::from(MAX_VALUE) {
            return Err(FcgiError::Overflow(n));
        }

        let n = n as u32;
        if n <= MAX_SINGLE_BYTE {
            Ok(Self(Repr::OneByte(n as u8)))
        } else {
            Ok(Self(Repr::FourByte(n | LONG_FORM_MARKER)))
        }
    }

    /// Read one variable length from a stream.
    ///
    /// Fails with [`FcgiError::UnexpectedEnd`] if the stream runs dry part way.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut first = [0u8; 1];
        read_exact_or_end(reader, &mut first, "variable length")?;

        if first[0] & 0x80 == 0 {
            return Ok(Self(Repr::OneByte(first[0])));
        }

        let mut raw = [first[0], 0, 0, 0];
        read_exact_or_end(reader, &mut raw[1..], "four-byte variable length")?;
        Ok(Self(Repr::FourByte(u32::from_be_bytes(raw))))
    }

    /// Decode from the front of a slice
    ///
    /// Returns the value and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = bytes;
        let length = Self::read_from(&mut cursor)?;
        Ok((length, length.size()))
    }

    /// The integer this length stands for
    pub fn value(&self) -> u32 {
        match self.0 {
            Repr::OneByte(b) => u32::from(b),
            Repr::FourByte(raw) => raw & MAX_VALUE,
        }
    }

    /// Number of raw bytes (1 or 4)
    pub fn size(&self) -> usize {
        match self.0 {
            Repr::OneByte(_) => 1,
            Repr::FourByte(_) => 4,
        }
    }

    pub fn is_long_form(&self) -> bool {
        matches!(self.0, Repr::FourByte(_))
    }

    /// False for a four-byte encoding of a value that fits in one byte.
    pub fn is_canonical(&self) -> bool {
        !(self.is_long_form() && self.value() <= MAX_SINGLE_BYTE)
    }

    /// Append the raw form to a buffer.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        match self.0 {
            Repr::OneByte(b) => buf.put_u8(b),
            Repr::FourByte(raw) => buf.put_u32(raw),
        }
    }

    /// The raw form as bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        self.encode_into(&mut bytes);
        bytes
    }
}

/// `read_exact` that reports a short stream as [`FcgiError::UnexpectedEnd`].
pub(crate) fn read_exact_or_end<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<()> {
    let needed = buf.len();
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            FcgiError::UnexpectedEnd(format!("{}: needed {} bytes", what, needed))
        }
        _ => FcgiError::ConnectionFailure(e),
    })
}
