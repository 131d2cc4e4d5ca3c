//! Record framing
//!
//! Every message on the wire is one record: a fixed 8-byte header, the
//! content, then zero padding that aligns the frame to 8 bytes.
//!
//! ```text
//! ┌─────────┬──────┬───────────┬───────────────┬────────────┬──────────┐
//! │ Ver (1) │ Type │ ReqId (2) │ ContentLen (2)│ PadLen (1) │ Rsvd (1) │
//! └─────────┴──────┴───────────┴───────────────┴────────────┴──────────┘
//! ┌──────────────────────────────┬───────────────────┐
//! │ Content (ContentLen bytes)   │ Padding (PadLen)  │
//! └──────────────────────────────┴───────────────────┘
//! ```

use std::io::{self, ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::nvpair::NameValuePair;
use crate::error::{FcgiError, Result};

/// Header size in bytes
pub const HEADER_LEN: usize = 8;

/// The only protocol version
pub const VERSION_1: u8 = 1;

/// Request id of management records
pub const NULL_REQUEST_ID: u16 = 0;

/// Largest content a single record can carry
pub const MAX_CONTENT_LEN: usize = u16::MAX as usize;

/// Record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    BeginRequest,
    AbortRequest,
    EndRequest,
    Params,
    StdIn,
    StdOut,
    StdErr,
    Data,
    GetValues,
    GetValuesResult,
    UnknownType,

    /// A type code outside 1..=11, kept so it can be reported back
    Unrecognized(u8),
}

impl RecordType {
    /// Wire code of this type
    pub fn code(self) -> u8 {
        match self {
            RecordType::BeginRequest => 1,
            RecordType::AbortRequest => 2,
            RecordType::EndRequest => 3,
            RecordType::Params => 4,
            RecordType::StdIn => 5,
            RecordType::StdOut => 6,
            RecordType::StdErr => 7,
            RecordType::Data => 8,
            RecordType::GetValues => 9,
            RecordType::GetValuesResult => 10,
            RecordType::UnknownType => 11,
            RecordType::Unrecognized(code) => code,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => RecordType::BeginRequest,
            2 => RecordType::AbortRequest,
            3 => RecordType::EndRequest,
            4 => RecordType::Params,
            5 => RecordType::StdIn,
            6 => RecordType::StdOut,
            7 => RecordType::StdErr,
            8 => RecordType::Data,
            9 => RecordType::GetValues,
            10 => RecordType::GetValuesResult,
            11 => RecordType::UnknownType,
            other => RecordType::Unrecognized(other),
        }
    }

    /// Types addressed to the connection rather than a request
    pub fn is_management(self) -> bool {
        matches!(
            self,
            RecordType::GetValues | RecordType::GetValuesResult | RecordType::UnknownType
        )
    }

    /// Raw byte channels
    pub fn is_byte_stream(self) -> bool {
        matches!(
            self,
            RecordType::StdIn | RecordType::StdOut | RecordType::StdErr | RecordType::Data
        )
    }

    /// Types whose content is a sequence of name-value pairs
    pub fn carries_pairs(self) -> bool {
        matches!(
            self,
            RecordType::Params | RecordType::GetValues | RecordType::GetValuesResult
        )
    }

    /// Types that form a stream closed by an empty record
    pub fn is_stream(self) -> bool {
        self.is_byte_stream() || self == RecordType::Params
    }
}

impl From<u8> for RecordType {
    fn from(code: u8) -> Self {
        RecordType::from_code(code)
    }
}

impl From<RecordType> for u8 {
    fn from(record_type: RecordType) -> Self {
        record_type.code()
    }
}

/// Padding that aligns `content_len` to a multiple of 8
pub fn calculate_padding(content_len: usize) -> u8 {
    ((8 - content_len % 8) % 8) as u8
}

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub record_type: RecordType,
    pub request_id: u16,
    pub content_length: u16,
    pub padding_length: u8,
}

impl Header {
    /// Append the 8 header bytes; the reserved byte is always 0.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.version);
        buf.put_u8(self.record_type.code());
        buf.put_u16(self.request_id);
        buf.put_u16(self.content_length);
        buf.put_u8(self.padding_length);
        buf.put_u8(0);
    }

    /// Parse 8 header bytes; the reserved byte is ignored.
    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Self {
        Self {
            version: bytes[0],
            record_type: RecordType::from_code(bytes[1]),
            request_id: u16::from_be_bytes([bytes[2], bytes[3]]),
            content_length: u16::from_be_bytes([bytes[4], bytes[5]]),
            padding_length: bytes[6],
        }
    }
}

/// One framed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    version: u8,
    record_type: RecordType,
    request_id: u16,
    padding_length: u8,
    content: Bytes,
}

impl Record {
    /// Build a record, padding the content to an 8-byte boundary.
    ///
    /// Fails with [`FcgiError::CapacityExceeded`] above 65535 content bytes.
    pub fn new(record_type: RecordType, request_id: u16, content: impl Into<Bytes>) -> Result<Self> {
        let content = content.into();
        if content.len() > MAX_CONTENT_LEN {
            return Err(FcgiError::CapacityExceeded {
                what: "record content",
                size: content.len(),
                limit: MAX_CONTENT_LEN,
            });
        }

        Ok(Self {
            version: VERSION_1,
            record_type,
            request_id,
            padding_length: calculate_padding(content.len()),
            content,
        })
    }

    /// A content-less record (stream terminator, abort)
    pub fn empty(record_type: RecordType, request_id: u16) -> Self {
        Self {
            version: VERSION_1,
            record_type,
            request_id,
            padding_length: 0,
            content: Bytes::new(),
        }
    }

    /// Build a record from a fixed 8-byte body.
    pub(crate) fn with_body(record_type: RecordType, request_id: u16, body: [u8; 8]) -> Self {
        Self {
            version: VERSION_1,
            record_type,
            request_id,
            padding_length: 0,
            content: Bytes::copy_from_slice(&body),
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Shared handle to the content
    pub fn content_bytes(&self) -> Bytes {
        self.content.clone()
    }

    pub fn content_length(&self) -> u16 {
        self.content.len() as u16
    }

    pub fn padding_length(&self) -> u8 {
        self.padding_length
    }

    pub fn header(&self) -> Header {
        Header {
            version: self.version,
            record_type: self.record_type,
            request_id: self.request_id,
            content_length: self.content_length(),
            padding_length: self.padding_length,
        }
    }

    pub fn is_management(&self) -> bool {
        self.request_id == NULL_REQUEST_ID
    }

    /// Empty record of a stream type: closes that channel
    pub fn is_end_of_stream(&self) -> bool {
        self.record_type.is_stream() && self.content.is_empty()
    }

    /// Size of the whole frame on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.content.len() + self.padding_length as usize
    }

    /// Append header, content and zero padding to a buffer.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        self.header().encode_into(buf);
        buf.put_slice(&self.content);
        buf.put_bytes(0, self.padding_length as usize);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Read one record from a stream.
    ///
    /// End of stream before the first header byte means the peer hung up and
    /// is reported as a connection failure; end of stream anywhere later is a
    /// truncated frame and a protocol violation. Padding is consumed, never
    /// checked.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; HEADER_LEN];
        read_first_byte(reader, &mut raw[..1])?;
        read_frame_part(reader, &mut raw[1..], "record header")?;
        let header = Header::decode(&raw);

        let mut content = vec![0u8; header.content_length as usize];
        read_frame_part(reader, &mut content, "record content")?;

        let mut padding = [0u8; 255];
        read_frame_part(
            reader,
            &mut padding[..header.padding_length as usize],
            "record padding",
        )?;

        Ok(Self {
            version: header.version,
            record_type: header.record_type,
            request_id: header.request_id,
            padding_length: header.padding_length,
            content: Bytes::from(content),
        })
    }

    /// Decode one record from the front of a slice
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.is_empty() {
            return Err(FcgiError::protocol("empty input: expected a record header"));
        }
        let mut cursor = bytes;
        let record = Self::read_from(&mut cursor)?;
        let consumed = record.encoded_len();
        Ok((record, consumed))
    }

    /// Parse the content as a sequence of name-value pairs.
    ///
    /// Consumes exactly `content_length` bytes; a pair that would run past
    /// the end of the content is a protocol violation.
    pub fn parse_content_as_pairs(&self) -> Result<Vec<NameValuePair>> {
        let mut pairs = Vec::new();
        let mut rest = &self.content[..];

        while !rest.is_empty() {
            let (pair, used) = NameValuePair::decode(rest).map_err(|e| match e {
                FcgiError::UnexpectedEnd(msg) => FcgiError::protocol(format!(
                    "name-value pair overruns record content: {}",
                    msg
                )),
                other => other,
            })?;
            rest = &rest[used..];
            pairs.push(pair);
        }

        Ok(pairs)
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete record from a stream
///
/// Blocks until a complete record is received or an error occurs
pub fn read_record<R: Read>(reader: &mut R) -> Result<Record> {
    Record::read_from(reader)
}

/// Write a record to a stream and flush it
pub fn write_record<W: Write>(writer: &mut W, record: &Record) -> Result<()> {
    writer.write_all(&record.to_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Concatenate records into one outbound buffer.
pub fn encode_records(records: &[Record]) -> Bytes {
    let total = records.iter().map(Record::encoded_len).sum();
    let mut buf = BytesMut::with_capacity(total);
    for record in records {
        record.encode_into(&mut buf);
    }
    buf.freeze()
}

fn read_first_byte<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    loop {
        match reader.read(buf) {
            Ok(0) => {
                return Err(FcgiError::ConnectionFailure(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "connection closed before record header",
                )))
            }
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_frame_part<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    let needed = buf.len();
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            FcgiError::protocol(format!("truncated {}: expected {} bytes", what, needed))
        }
        _ => FcgiError::ConnectionFailure(e),
    })
}
