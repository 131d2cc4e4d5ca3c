//! Name-Value Pair Tests

use std::io::Cursor;

use fcgi_client::protocol::{measure_pairs, NameValuePair};
use fcgi_client::FcgiError;

#[test]
fn test_encode_short_pair() {
    let pair = NameValuePair::new("A", "BCD").unwrap();
    assert_eq!(pair.to_bytes(), vec![1, 3, b'A', b'B', b'C', b'D']);
    assert_eq!(pair.measure(), 6);
}

#[test]
fn test_length_forms_follow_size() {
    for (len, prefix) in [(0usize, 1usize), (1, 1), (127, 1), (128, 4), (300, 4)] {
        let value = vec![b'x'; len];
        let pair = NameValuePair::new("N", value).unwrap();

        assert_eq!(pair.value_length().size(), prefix, "value of {} bytes", len);
        assert_eq!(pair.value_length().value() as usize, len);
        assert_eq!(pair.measure(), 1 + prefix + 1 + len);
        assert_eq!(pair.to_bytes().len(), pair.measure());
    }
}

#[test]
fn test_round_trip_length_grid() {
    let lengths = [0usize, 1, 127, 128];

    for name_len in lengths {
        for value_len in lengths {
            let pair = NameValuePair::new(vec![b'n'; name_len], vec![b'v'; value_len]).unwrap();
            let encoded = pair.to_bytes();

            let (decoded, used) = NameValuePair::decode(&encoded).unwrap();
            assert_eq!(decoded, pair, "name {} / value {}", name_len, value_len);
            assert_eq!(used, encoded.len());
            assert_eq!(decoded.measure(), encoded.len());
            assert_eq!(decoded.name().len(), name_len);
            assert_eq!(decoded.value().len(), value_len);
        }
    }
}

#[test]
fn test_encode_long_value() {
    let pair = NameValuePair::new("K", vec![b'v'; 128]).unwrap();
    let bytes = pair.to_bytes();

    assert_eq!(&bytes[..6], &[1, 0x80, 0, 0, 0x80, b'K']);
    assert_eq!(bytes.len(), 1 + 4 + 1 + 128);
}

#[test]
fn test_decode_pair() {
    let bytes = [3, 2, b'F', b'O', b'O', b'h', b'i', 0xEE];
    let (pair, used) = NameValuePair::decode(&bytes).unwrap();

    assert_eq!(used, 7);
    assert_eq!(pair.name(), b"FOO");
    assert_eq!(pair.value(), b"hi");
    assert_eq!(pair.name_str(), Some("FOO"));
    assert_eq!(pair.value_str(), Some("hi"));
}

#[test]
fn test_decode_long_form_prefixes_preserved() {
    // Both lengths in four-byte form although they fit in one byte
    let bytes = [0x80, 0, 0, 1, 0x80, 0, 0, 2, b'N', b'v', b'w'];
    let (pair, used) = NameValuePair::decode(&bytes).unwrap();

    assert_eq!(used, 11);
    assert_eq!(pair.measure(), 11);
    assert!(!pair.name_length().is_canonical());
    assert_eq!(pair.to_bytes(), bytes.to_vec());
    assert_ne!(pair, NameValuePair::new("N", "vw").unwrap());
}

#[test]
fn test_read_consecutive_pairs() {
    let mut buf = NameValuePair::new("A", "1").unwrap().to_bytes();
    buf.extend(NameValuePair::new("BB", "").unwrap().to_bytes());

    let mut cursor = Cursor::new(buf);
    let first = NameValuePair::read_from(&mut cursor).unwrap();
    let second = NameValuePair::read_from(&mut cursor).unwrap();

    assert_eq!(first.name(), b"A");
    assert_eq!(second.name(), b"BB");
    assert!(second.value().is_empty());
}

#[test]
fn test_binary_values() {
    let pair = NameValuePair::new(&b"\xff\x00"[..], &b"\x01"[..]).unwrap();
    assert_eq!(pair.name_str(), None);

    let (decoded, _) = NameValuePair::decode(&pair.to_bytes()).unwrap();
    assert_eq!(decoded, pair);
}

#[test]
fn test_measure_pairs() {
    let pairs = vec![
        NameValuePair::new("SCRIPT_FILENAME", "X").unwrap(),
        NameValuePair::new("A", "BCD").unwrap(),
    ];
    assert_eq!(measure_pairs(&pairs), 18 + 6);
    assert_eq!(measure_pairs(&[]), 0);
}

#[test]
fn test_truncated_pair() {
    // Declares a 5-byte value, carries 2
    let bytes = [1, 5, b'N', b'a', b'b'];
    assert!(matches!(
        NameValuePair::decode(&bytes),
        Err(FcgiError::UnexpectedEnd(_))
    ));

    // Value length missing entirely
    assert!(matches!(
        NameValuePair::decode(&[1]),
        Err(FcgiError::UnexpectedEnd(_))
    ));
}
