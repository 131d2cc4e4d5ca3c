//! Message definitions
//!
//! Typed view of every record kind, with conversion to and from [`Record`].

use bytes::{Bytes, BytesMut};

use super::body::{BeginRequestBody, EndRequestBody, ProtocolStatus, Role, UnknownTypeBody};
use super::nvpair::{measure_pairs, NameValuePair};
use super::record::{Record, RecordType, MAX_CONTENT_LEN, NULL_REQUEST_ID};
use crate::error::{FcgiError, Result};

/// A typed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Opens a request
    BeginRequest { request_id: u16, body: BeginRequestBody },

    /// Asks the application server to abandon a request
    AbortRequest { request_id: u16 },

    /// Closes a request
    EndRequest { request_id: u16, body: EndRequestBody },

    /// Request parameters (empty = end of parameters)
    Params { request_id: u16, pairs: Vec<NameValuePair> },

    StdIn { request_id: u16, data: Bytes },
    StdOut { request_id: u16, data: Bytes },
    StdErr { request_id: u16, data: Bytes },
    Data { request_id: u16, data: Bytes },

    /// Management query for server variables
    GetValues { pairs: Vec<NameValuePair> },

    /// Management answer to a query
    GetValuesResult { pairs: Vec<NameValuePair> },

    /// Management reply naming a record type the sender does not support
    UnknownType { body: UnknownTypeBody },
}

impl Message {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn begin_request(request_id: u16, role: Role, flags: u8) -> Self {
        Message::BeginRequest {
            request_id,
            body: BeginRequestBody::new(role, flags),
        }
    }

    pub fn abort_request(request_id: u16) -> Self {
        Message::AbortRequest { request_id }
    }

    pub fn end_request(request_id: u16, app_status: u32, protocol_status: ProtocolStatus) -> Self {
        Message::EndRequest {
            request_id,
            body: EndRequestBody::new(app_status, protocol_status),
        }
    }

    pub fn params(request_id: u16, pairs: Vec<NameValuePair>) -> Self {
        Message::Params { request_id, pairs }
    }

    pub fn stdin(request_id: u16, data: impl Into<Bytes>) -> Self {
        Message::StdIn {
            request_id,
            data: data.into(),
        }
    }

    pub fn stdout(request_id: u16, data: impl Into<Bytes>) -> Self {
        Message::StdOut {
            request_id,
            data: data.into(),
        }
    }

    pub fn stderr(request_id: u16, data: impl Into<Bytes>) -> Self {
        Message::StdErr {
            request_id,
            data: data.into(),
        }
    }

    pub fn data(request_id: u16, data: impl Into<Bytes>) -> Self {
        Message::Data {
            request_id,
            data: data.into(),
        }
    }

    pub fn get_values(pairs: Vec<NameValuePair>) -> Self {
        Message::GetValues { pairs }
    }

    pub fn get_values_result(pairs: Vec<NameValuePair>) -> Self {
        Message::GetValuesResult { pairs }
    }

    pub fn unknown_type(record_type: u8) -> Self {
        Message::UnknownType {
            body: UnknownTypeBody::new(record_type),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn record_type(&self) -> RecordType {
        match self {
            Message::BeginRequest { .. } => RecordType::BeginRequest,
            Message::AbortRequest { .. } => RecordType::AbortRequest,
            Message::EndRequest { .. } => RecordType::EndRequest,
            Message::Params { .. } => RecordType::Params,
            Message::StdIn { .. } => RecordType::StdIn,
            Message::StdOut { .. } => RecordType::StdOut,
            Message::StdErr { .. } => RecordType::StdErr,
            Message::Data { .. } => RecordType::Data,
            Message::GetValues { .. } => RecordType::GetValues,
            Message::GetValuesResult { .. } => RecordType::GetValuesResult,
            Message::UnknownType { .. } => RecordType::UnknownType,
        }
    }

    /// Request id; management messages always use 0
    pub fn request_id(&self) -> u16 {
        match self {
            Message::BeginRequest { request_id, .. }
            | Message::AbortRequest { request_id }
            | Message::EndRequest { request_id, .. }
            | Message::Params { request_id, .. }
            | Message::StdIn { request_id, .. }
            | Message::StdOut { request_id, .. }
            | Message::StdErr { request_id, .. }
            | Message::Data { request_id, .. } => *request_id,
            Message::GetValues { .. }
            | Message::GetValuesResult { .. }
            | Message::UnknownType { .. } => NULL_REQUEST_ID,
        }
    }

    // =========================================================================
    // Encoding / Decoding
    // =========================================================================

    /// Frame this message as a record.
    ///
    /// Fails with [`FcgiError::CapacityExceeded`] when the content does not
    /// fit into one record.
    pub fn to_record(&self) -> Result<Record> {
        let record_type = self.record_type();
        let request_id = self.request_id();

        match self {
            Message::BeginRequest { body, .. } => {
                Ok(Record::with_body(record_type, request_id, body.to_bytes()))
            }
            Message::EndRequest { body, .. } => {
                Ok(Record::with_body(record_type, request_id, body.to_bytes()))
            }
            Message::UnknownType { body } => {
                Ok(Record::with_body(record_type, request_id, body.to_bytes()))
            }
            Message::AbortRequest { .. } => Ok(Record::empty(record_type, request_id)),
            Message::Params { pairs, .. }
            | Message::GetValues { pairs }
            | Message::GetValuesResult { pairs } => values_record(record_type, request_id, pairs),
            Message::StdIn { data, .. }
            | Message::StdOut { data, .. }
            | Message::StdErr { data, .. }
            | Message::Data { data, .. } => byte_stream_record(record_type, request_id, data.clone()),
        }
    }

    /// Frame and serialize this message.
    pub fn encode(&self) -> Result<Bytes> {
        Ok(self.to_record()?.to_bytes())
    }

    /// Interpret a received record.
    pub fn from_record(record: &Record) -> Result<Self> {
        let request_id = record.request_id();

        match record.record_type() {
            RecordType::BeginRequest => Ok(Message::BeginRequest {
                request_id,
                body: BeginRequestBody::decode(record.content())?,
            }),
            RecordType::AbortRequest => Ok(Message::AbortRequest { request_id }),
            RecordType::EndRequest => Ok(Message::EndRequest {
                request_id,
                body: EndRequestBody::decode(record.content())?,
            }),
            RecordType::Params => Ok(Message::Params {
                request_id,
                pairs: record.parse_content_as_pairs()?,
            }),
            RecordType::StdIn => Ok(Message::StdIn {
                request_id,
                data: record.content_bytes(),
            }),
            RecordType::StdOut => Ok(Message::StdOut {
                request_id,
                data: record.content_bytes(),
            }),
            RecordType::StdErr => Ok(Message::StdErr {
                request_id,
                data: record.content_bytes(),
            }),
            RecordType::Data => Ok(Message::Data {
                request_id,
                data: record.content_bytes(),
            }),
            RecordType::GetValues => Ok(Message::GetValues {
                pairs: record.parse_content_as_pairs()?,
            }),
            RecordType::GetValuesResult => Ok(Message::GetValuesResult {
                pairs: record.parse_content_as_pairs()?,
            }),
            RecordType::UnknownType => Ok(Message::UnknownType {
                body: UnknownTypeBody::decode(record.content())?,
            }),
            RecordType::Unrecognized(code) => Err(FcgiError::protocol(format!(
                "Unknown record type: 0x{:02x}",
                code
            ))),
        }
    }
}

impl TryFrom<&Record> for Message {
    type Error = FcgiError;

    fn try_from(record: &Record) -> Result<Self> {
        Message::from_record(record)
    }
}

/// Build a Params / GetValues / GetValuesResult record.
///
/// An empty `pairs` yields the end-of-parameters marker.
pub fn values_record(
    record_type: RecordType,
    request_id: u16,
    pairs: &[NameValuePair],
) -> Result<Record> {
    if !record_type.carries_pairs() {
        return Err(FcgiError::protocol(format!(
            "{:?} does not carry name-value pairs",
            record_type
        )));
    }

    let content_len = measure_pairs(pairs);
    if content_len > MAX_CONTENT_LEN {
        return Err(FcgiError::CapacityExceeded {
            what: "name-value pairs",
            size: content_len,
            limit: MAX_CONTENT_LEN,
        });
    }

    let mut content = BytesMut::with_capacity(content_len);
    for pair in pairs {
        pair.encode_into(&mut content);
    }

    Record::new(record_type, request_id, content.freeze())
}

/// Build a StdIn / StdOut / StdErr / Data record.
///
/// An empty `data` yields the end-of-stream marker for that channel.
pub fn byte_stream_record(record_type: RecordType, request_id: u16, data: Bytes) -> Result<Record> {
    if data.len() > MAX_CONTENT_LEN {
        return Err(FcgiError::CapacityExceeded {
            what: "byte stream content",
            size: data.len(),
            limit: MAX_CONTENT_LEN,
        });
    }

    Record::new(record_type, request_id, data)
}
