//! Protocol Module
//!
//! Defines the FastCGI wire format used between the client and an
//! application server.
//!
//! ## Record Format
//! ```text
//! ┌─────────┬──────────┬───────────┬────────────┬──────────┬──────────┐
//! │ Ver (1) │ Type (1) │ ReqId (2) │ CLen (2)   │ PLen (1) │ Rsvd (1) │
//! └─────────┴──────────┴───────────┴────────────┴──────────┴──────────┘
//! followed by CLen content bytes and PLen zero bytes
//! ```
//!
//! ### Record Types
//! - 0x01: BEGIN_REQUEST      - Body: role (2) + flags (1) + reserved (5)
//! - 0x02: ABORT_REQUEST      - Body: empty
//! - 0x03: END_REQUEST        - Body: app status (4) + protocol status (1) + reserved (3)
//! - 0x04: PARAMS             - Body: name-value pairs
//! - 0x05: STDIN              - Body: bytes
//! - 0x06: STDOUT             - Body: bytes
//! - 0x07: STDERR             - Body: bytes
//! - 0x08: DATA               - Body: bytes
//! - 0x09: GET_VALUES         - Body: name-value pairs (request id 0)
//! - 0x0A: GET_VALUES_RESULT  - Body: name-value pairs (request id 0)
//! - 0x0B: UNKNOWN_TYPE       - Body: type (1) + reserved (7) (request id 0)
//!
//! An empty PARAMS, STDIN, STDOUT, STDERR or DATA record ends that stream.

mod body;
mod message;
mod nvpair;
mod record;
mod varint;

pub mod params;
pub mod stream;

pub use body::{
    BeginRequestBody, EndRequestBody, ProtocolStatus, Role, UnknownTypeBody, BODY_LEN, KEEP_CONN,
};
pub use message::{byte_stream_record, values_record, Message};
pub use nvpair::{measure_pairs, NameValuePair};
pub use record::{
    calculate_padding, encode_records, read_record, write_record, Header, Record, RecordType,
    HEADER_LEN, MAX_CONTENT_LEN, NULL_REQUEST_ID, VERSION_1,
};
pub use varint::{VariableLength, MAX_SINGLE_BYTE, MAX_VALUE};
