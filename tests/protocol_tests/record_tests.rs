//! Record Tests
//!
//! Tests for record framing, padding, and frame-level decode errors.

use std::io::Cursor;

use fcgi_client::protocol::{
    calculate_padding, encode_records, read_record, write_record, Header, NameValuePair, Record,
    RecordType, HEADER_LEN, MAX_CONTENT_LEN, VERSION_1,
};
use fcgi_client::FcgiError;

// =============================================================================
// Padding / Header Tests
// =============================================================================

#[test]
fn test_padding_aligns_to_eight() {
    for (len, padding) in [(0, 0), (1, 7), (3, 5), (8, 0), (9, 7), (16, 0), (65535, 1)] {
        assert_eq!(calculate_padding(len), padding, "content of {} bytes", len);
        assert_eq!((len + padding as usize) % 8, 0);
    }
}

#[test]
fn test_record_type_codes() {
    for code in 1u8..=11 {
        let record_type = RecordType::from_code(code);
        assert_ne!(record_type, RecordType::Unrecognized(code));
        assert_eq!(record_type.code(), code);
    }
    assert_eq!(RecordType::from_code(0), RecordType::Unrecognized(0));
    assert_eq!(u8::from(RecordType::from(0x42u8)), 0x42);
}

#[test]
fn test_header_layout() {
    let header = Header {
        version: VERSION_1,
        record_type: RecordType::Params,
        request_id: 0x0102,
        content_length: 0x0304,
        padding_length: 4,
    };

    let mut buf = Vec::new();
    header.encode_into(&mut buf);
    assert_eq!(buf, vec![1, 4, 0x01, 0x02, 0x03, 0x04, 4, 0]);

    let raw: [u8; HEADER_LEN] = buf.try_into().unwrap();
    assert_eq!(Header::decode(&raw), header);
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_stdout_record() {
    let record = Record::new(RecordType::StdOut, 1, "hello").unwrap();

    assert_eq!(record.content_length(), 5);
    assert_eq!(record.padding_length(), 3);
    assert_eq!(record.encoded_len(), 16);
    assert_eq!(
        record.to_bytes().to_vec(),
        vec![1, 6, 0, 1, 0, 5, 3, 0, b'h', b'e', b'l', b'l', b'o', 0, 0, 0]
    );
}

#[test]
fn test_encode_empty_record() {
    let record = Record::empty(RecordType::StdIn, 7);
    assert!(record.is_end_of_stream());
    assert_eq!(record.to_bytes().to_vec(), vec![1, 5, 0, 7, 0, 0, 0, 0]);
}

#[test]
fn test_content_capacity() {
    let record = Record::new(RecordType::StdIn, 1, vec![0u8; MAX_CONTENT_LEN]).unwrap();
    assert_eq!(record.content_length(), 65535);
    assert_eq!(record.encoded_len(), HEADER_LEN + 65535 + 1);

    match Record::new(RecordType::StdIn, 1, vec![0u8; MAX_CONTENT_LEN + 1]) {
        Err(FcgiError::CapacityExceeded { size, limit, .. }) => {
            assert_eq!(size, 65536);
            assert_eq!(limit, 65535);
        }
        other => panic!("Expected CapacityExceeded, got {:?}", other),
    }
}

#[test]
fn test_write_then_read_stream() {
    let records = vec![
        Record::new(RecordType::StdOut, 3, "first").unwrap(),
        Record::new(RecordType::StdErr, 3, "second!!").unwrap(),
        Record::empty(RecordType::StdOut, 3),
    ];

    let mut buf = Vec::new();
    for record in &records {
        write_record(&mut buf, record).unwrap();
    }
    assert_eq!(buf, encode_records(&records).to_vec());

    let mut cursor = Cursor::new(buf);
    for expected in &records {
        assert_eq!(&read_record(&mut cursor).unwrap(), expected);
    }
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_reports_consumed_length() {
    let mut bytes = Record::new(RecordType::Data, 2, "abc").unwrap().to_bytes().to_vec();
    bytes.extend_from_slice(&[0xDE, 0xAD]);

    let (record, used) = Record::decode(&bytes).unwrap();
    assert_eq!(used, 16);
    assert_eq!(record.record_type(), RecordType::Data);
    assert_eq!(record.request_id(), 2);
    assert_eq!(record.content(), b"abc");
}

#[test]
fn test_decode_keeps_header_fields_as_sent() {
    // Version 2, oversized padding, nonzero reserved and padding bytes
    let bytes = [2, 6, 0, 1, 0, 1, 9, 0xFF, b'z', 1, 2, 3, 4, 5, 6, 7, 8, 9];
    let (record, used) = Record::decode(&bytes).unwrap();

    assert_eq!(used, bytes.len());
    assert_eq!(record.version(), 2);
    assert_eq!(record.padding_length(), 9);
    assert_eq!(record.content(), b"z");
}

#[test]
fn test_decode_unrecognized_type() {
    let bytes = [1u8, 0x42, 0, 0, 0, 0, 0, 0];
    let (record, _) = Record::decode(&bytes).unwrap();
    assert_eq!(record.record_type(), RecordType::Unrecognized(0x42));
    assert!(record.is_management());
}

#[test]
fn test_empty_input() {
    assert!(matches!(
        Record::decode(&[]),
        Err(FcgiError::ProtocolViolation(_))
    ));

    // On a stream, nothing at all means the peer hung up
    let mut cursor = Cursor::new(Vec::<u8>::new());
    assert!(matches!(
        read_record(&mut cursor),
        Err(FcgiError::ConnectionFailure(_))
    ));
}

#[test]
fn test_truncated_frames() {
    let full = Record::new(RecordType::StdOut, 1, "hello").unwrap().to_bytes();

    // Inside the header, the content, and the padding
    for cut in [3, 10, 14] {
        match Record::decode(&full[..cut]) {
            Err(FcgiError::ProtocolViolation(msg)) => assert!(msg.contains("truncated")),
            other => panic!("Expected ProtocolViolation at {}, got {:?}", cut, other),
        }
    }
}

// =============================================================================
// Content-as-Pairs Tests
// =============================================================================

#[test]
fn test_parse_content_as_pairs() {
    let mut content = NameValuePair::new("A", "1").unwrap().to_bytes();
    content.extend(NameValuePair::new("B", "22").unwrap().to_bytes());
    let record = Record::new(RecordType::Params, 1, content).unwrap();

    let pairs = record.parse_content_as_pairs().unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[1].value(), b"22");

    assert!(Record::empty(RecordType::Params, 1)
        .parse_content_as_pairs()
        .unwrap()
        .is_empty());
}

#[test]
fn test_pair_overrunning_content() {
    // Pair claims a 10-byte value inside 4 bytes of content
    let record = Record::new(RecordType::GetValuesResult, 0, vec![1, 10, b'N', b'v']).unwrap();
    match record.parse_content_as_pairs() {
        Err(FcgiError::ProtocolViolation(msg)) => assert!(msg.contains("overruns")),
        other => panic!("Expected ProtocolViolation, got {:?}", other),
    }
}
