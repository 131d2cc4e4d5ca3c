//! Message Tests
//!
//! Tests for the typed builders and record interpretation.

use bytes::Bytes;
use fcgi_client::protocol::params::SCRIPT_FILENAME;
use fcgi_client::protocol::{
    values_record, BeginRequestBody, EndRequestBody, Message, NameValuePair, ProtocolStatus,
    Record, RecordType, Role, KEEP_CONN,
};
use fcgi_client::FcgiError;

// =============================================================================
// Builder Encoding Tests
// =============================================================================

#[test]
fn test_begin_request_bytes() {
    let bytes = Message::begin_request(1, Role::Responder, KEEP_CONN)
        .encode()
        .unwrap();
    assert_eq!(
        bytes.to_vec(),
        vec![1, 1, 0, 1, 0, 8, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0]
    );
}

#[test]
fn test_begin_request_roles() {
    let bytes = Message::begin_request(0x0203, Role::Filter, 0).encode().unwrap();
    assert_eq!(&bytes[..4], &[1, 1, 2, 3]);
    assert_eq!(&bytes[8..11], &[0, 3, 0]);
}

#[test]
fn test_end_request_bytes() {
    let bytes = Message::end_request(1, 0x0102_0304, ProtocolStatus::Overloaded)
        .encode()
        .unwrap();
    assert_eq!(
        bytes.to_vec(),
        vec![1, 3, 0, 1, 0, 8, 0, 0, 1, 2, 3, 4, 2, 0, 0, 0]
    );
}

#[test]
fn test_unknown_type_bytes() {
    let bytes = Message::unknown_type(0x42).encode().unwrap();
    assert_eq!(
        bytes.to_vec(),
        vec![1, 11, 0, 0, 0, 8, 0, 0, 0x42, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn test_abort_request_bytes() {
    let bytes = Message::abort_request(9).encode().unwrap();
    assert_eq!(bytes.to_vec(), vec![1, 2, 0, 9, 0, 0, 0, 0]);
}

#[test]
fn test_params_record() {
    let pair = NameValuePair::new(SCRIPT_FILENAME, "X").unwrap();
    let bytes = Message::params(1, vec![pair]).encode().unwrap();

    // 8 header + 18 content + 6 padding
    assert_eq!(bytes.len(), 32);
    assert_eq!(&bytes[..8], &[1, 4, 0, 1, 0, 18, 6, 0]);
    assert_eq!(&bytes[8..10], &[15, 1]);
    assert_eq!(&bytes[10..25], SCRIPT_FILENAME.as_bytes());
    assert_eq!(bytes[25], b'X');
    assert!(bytes[26..].iter().all(|b| *b == 0));
}

#[test]
fn test_empty_params_terminator() {
    let bytes = Message::params(4, Vec::new()).encode().unwrap();
    assert_eq!(bytes.to_vec(), vec![1, 4, 0, 4, 0, 0, 0, 0]);
}

#[test]
fn test_management_messages_use_request_id_zero() {
    let query = Message::get_values(vec![NameValuePair::new("FCGI_MAX_CONNS", "").unwrap()]);
    assert_eq!(query.request_id(), 0);

    let record = query.to_record().unwrap();
    assert_eq!(record.record_type(), RecordType::GetValues);
    assert_eq!(record.request_id(), 0);
    assert!(record.is_management());
}

#[test]
fn test_byte_stream_builders() {
    let cases = [
        (Message::stdin(5, "in"), RecordType::StdIn),
        (Message::stdout(5, "out"), RecordType::StdOut),
        (Message::stderr(5, "err"), RecordType::StdErr),
        (Message::data(5, "data"), RecordType::Data),
    ];

    for (message, record_type) in cases {
        let record = message.to_record().unwrap();
        assert_eq!(record.record_type(), record_type);
        assert_eq!(record.request_id(), 5);
    }
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_stream_content_capacity() {
    let fits = Message::stdin(1, vec![b'a'; 65535]).to_record().unwrap();
    assert_eq!(fits.content_length(), 65535);

    let err = Message::stdout(1, vec![b'a'; 65536]).to_record().unwrap_err();
    assert!(matches!(err, FcgiError::CapacityExceeded { size: 65536, .. }));
}

#[test]
fn test_params_capacity() {
    // 1 + 4 + 1 + 65529 = 65535 bytes: fits exactly
    let fits = NameValuePair::new("N", vec![b'v'; 65529]).unwrap();
    let record = values_record(RecordType::Params, 1, &[fits]).unwrap();
    assert_eq!(record.content_length(), 65535);

    let over = NameValuePair::new("N", vec![b'v'; 65530]).unwrap();
    let err = Message::params(1, vec![over]).to_record().unwrap_err();
    assert!(err.is_capacity());
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_from_record_round_trip() {
    let messages = vec![
        Message::begin_request(3, Role::Authorizer, 0),
        Message::abort_request(3),
        Message::end_request(3, 7, ProtocolStatus::UnknownRole),
        Message::params(3, vec![NameValuePair::new("K", "V").unwrap()]),
        Message::stdout(3, "body"),
        Message::get_values_result(vec![NameValuePair::new("FCGI_MAX_REQS", "10").unwrap()]),
        Message::unknown_type(9),
    ];

    for message in messages {
        let record = message.to_record().unwrap();
        assert_eq!(Message::try_from(&record).unwrap(), message);
    }
}

#[test]
fn test_decode_end_request_body() {
    let record = Message::end_request(2, 1, ProtocolStatus::CantMultiplexConnection)
        .to_record()
        .unwrap();

    match Message::from_record(&record).unwrap() {
        Message::EndRequest { request_id, body } => {
            assert_eq!(request_id, 2);
            assert_eq!(
                body,
                EndRequestBody::new(1, ProtocolStatus::CantMultiplexConnection)
            );
        }
        other => panic!("Expected EndRequest, got {:?}", other),
    }
}

#[test]
fn test_bad_fixed_bodies() {
    // Short body
    let short = Record::new(RecordType::EndRequest, 1, vec![0u8; 5]).unwrap();
    assert!(matches!(
        Message::from_record(&short),
        Err(FcgiError::ProtocolViolation(_))
    ));

    // Protocol status 9 does not exist
    let status = Record::new(RecordType::EndRequest, 1, vec![0u8, 0, 0, 0, 9, 0, 0, 0]).unwrap();
    assert!(Message::from_record(&status).is_err());

    // Role 0 does not exist
    assert!(BeginRequestBody::decode(&[0, 0, 0, 0, 0, 0, 0, 0]).is_err());
}

#[test]
fn test_unrecognized_type_is_reported() {
    let record = Record::new(RecordType::Unrecognized(0x42), 1, Bytes::new()).unwrap();
    match Message::from_record(&record) {
        Err(FcgiError::ProtocolViolation(msg)) => assert!(msg.contains("0x42")),
        other => panic!("Expected ProtocolViolation, got {:?}", other),
    }
}

#[test]
fn test_keep_conn_flag() {
    assert!(BeginRequestBody::new(Role::Responder, KEEP_CONN).keep_conn());
    assert!(!BeginRequestBody::new(Role::Responder, 0).keep_conn());
}

#[test]
fn test_values_record_types() {
    let pairs = vec![NameValuePair::new("K", "V").unwrap()];
    for record_type in [RecordType::Params, RecordType::GetValues, RecordType::GetValuesResult] {
        assert!(values_record(record_type, 0, &pairs).is_ok());
    }

    assert!(matches!(
        values_record(RecordType::StdIn, 1, &pairs),
        Err(FcgiError::ProtocolViolation(_))
    ));
}
