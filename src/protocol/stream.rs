//! Stream utilities
//!
//! Helpers over sequences of records: picking one request's records out of a
//! response, joining a byte channel back together, and cutting a byte channel
//! into records.

use bytes::{Bytes, BytesMut};

use super::message::byte_stream_record;
use super::record::{Record, RecordType, MAX_CONTENT_LEN};
use crate::error::{FcgiError, Result};

/// Records addressed to `request_id`, in their original order
pub fn filter_by_request_id(records: &[Record], request_id: u16) -> Vec<Record> {
    records
        .iter()
        .filter(|record| record.request_id() == request_id)
        .cloned()
        .collect()
}

/// Concatenated content of every record of `record_type`, in order
pub fn contents_by_type(records: &[Record], record_type: RecordType) -> Bytes {
    let mut matching = records
        .iter()
        .filter(|record| record.record_type() == record_type);

    // A single record needs no copy
    let first = match matching.next() {
        Some(record) => record,
        None => return Bytes::new(),
    };
    let rest: Vec<&Record> = matching.collect();
    if rest.is_empty() {
        return first.content_bytes();
    }

    let total = first.content().len() + rest.iter().map(|r| r.content().len()).sum::<usize>();
    let mut buf = BytesMut::with_capacity(total);
    buf.extend_from_slice(first.content());
    for record in rest {
        buf.extend_from_slice(record.content());
    }
    buf.freeze()
}

/// Everything the script wrote to its output stream
pub fn stdout_of(records: &[Record]) -> Bytes {
    contents_by_type(records, RecordType::StdOut)
}

/// Everything the script wrote to its error stream
pub fn stderr_of(records: &[Record]) -> Bytes {
    contents_by_type(records, RecordType::StdErr)
}

/// Cut a byte channel into records of at most 65535 bytes, followed by the
/// empty end-of-stream record.
///
/// Empty `data` produces only the end-of-stream record.
pub fn split_byte_stream(record_type: RecordType, request_id: u16, data: &Bytes) -> Result<Vec<Record>> {
    if !record_type.is_byte_stream() {
        return Err(FcgiError::protocol(format!(
            "{:?} is not a byte stream type",
            record_type
        )));
    }

    let mut records = Vec::with_capacity(data.len() / MAX_CONTENT_LEN + 2);
    let mut offset = 0;
    while offset < data.len() {
        let end = usize::min(offset + MAX_CONTENT_LEN, data.len());
        records.push(byte_stream_record(record_type, request_id, data.slice(offset..end))?);
        offset = end;
    }
    records.push(Record::empty(record_type, request_id));

    Ok(records)
}
