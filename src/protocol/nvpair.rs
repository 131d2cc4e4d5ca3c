//! Name-value pairs
//!
//! Parameters and management variables travel as length-prefixed pairs:
//!
//! ```text
//! ┌───────────┬────────────┬────────────┬─────────────┐
//! │ NameLen   │ ValueLen   │ Name bytes │ Value bytes │
//! │ (1 or 4)  │ (1 or 4)   │            │             │
//! └───────────┴────────────┴────────────┴─────────────┘
//! ```

use std::fmt;
use std::io::Read;

use bytes::{BufMut, Bytes};

use super::varint::VariableLength;
use crate::error::{FcgiError, Result};

/// A single name-value pair
#[derive(Clone, PartialEq, Eq)]
pub struct NameValuePair {
    name_length: VariableLength,
    value_length: VariableLength,
    name: Bytes,
    value: Bytes,
}

impl NameValuePair {
    /// Build a pair, encoding both lengths in their shortest form.
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        let value = value.into();

        Ok(Self {
            name_length: VariableLength::from_len(name.len())?,
            value_length: VariableLength::from_len(value.len())?,
            name,
            value,
        })
    }

    /// Read one pair from a stream.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let name_length = VariableLength::read_from(reader)?;
        let value_length = VariableLength::read_from(reader)?;

        let name = read_bytes(reader, name_length.value() as usize, "name")?;
        let value = read_bytes(reader, value_length.value() as usize, "value")?;

        Ok(Self {
            name_length,
            value_length,
            name,
            value,
        })
    }

    /// Decode from the front of a slice
    ///
    /// Returns the pair and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = bytes;
        let pair = Self::read_from(&mut cursor)?;
        let consumed = pair.measure();
        Ok((pair, consumed))
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Name as UTF-8, if it is
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name).ok()
    }

    /// Value as UTF-8, if it is
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    pub fn name_length(&self) -> VariableLength {
        self.name_length
    }

    pub fn value_length(&self) -> VariableLength {
        self.value_length
    }

    /// Serialized size in bytes
    pub fn measure(&self) -> usize {
        self.name_length.size() + self.value_length.size() + self.name.len() + self.value.len()
    }

    /// Append the wire form to a buffer.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        self.name_length.encode_into(buf);
        self.value_length.encode_into(buf);
        buf.put_slice(&self.name);
        buf.put_slice(&self.value);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.measure());
        self.encode_into(&mut bytes);
        bytes
    }
}

impl fmt::Debug for NameValuePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameValuePair")
            .field("name", &String::from_utf8_lossy(&self.name))
            .field("value", &String::from_utf8_lossy(&self.value))
            .finish()
    }
}

/// Total serialized size of a set of pairs
pub fn measure_pairs(pairs: &[NameValuePair]) -> usize {
    pairs.iter().map(NameValuePair::measure).sum()
}

/// Read exactly `len` bytes without trusting `len` for the allocation.
fn read_bytes<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Bytes> {
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;

    if buf.len() < len {
        return Err(FcgiError::UnexpectedEnd(format!(
            "{}: expected {} bytes, got {}",
            what,
            len,
            buf.len()
        )));
    }

    Ok(Bytes::from(buf))
}
