use bytes::Bytes;
use proptest::prelude::*;

use super::*;

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
    assert_eq!(decode(b"i-42e").unwrap(), Value::Integer(-42));
    assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
}

#[test]
fn test_decode_integer_invalid() {
    assert!(decode(b"i-0e").is_err());
    assert!(decode(b"i03e").is_err());
    assert!(decode(b"ie").is_err());
    assert!(decode(b"i+3e").is_err());
    assert!(decode(b"i99999999999999999999e").is_err());
}

#[test]
fn test_decode_bytes() {
    assert_eq!(
        decode(b"4:spam").unwrap(),
        Value::Bytes(Bytes::from_static(b"spam"))
    );
    assert_eq!(
        decode(b"0:").unwrap(),
        Value::Bytes(Bytes::from_static(b""))
    );
}

#[test]
fn test_decode_bad_length_prefix() {
    assert!(matches!(
        decode(b"-4:spam"),
        Err(BencodeError::InvalidStringLength)
    ));
    assert!(matches!(
        decode(b"4x:spam"),
        Err(BencodeError::InvalidStringLength)
    ));
}

#[test]
fn test_decode_length_exceeds_input() {
    assert!(matches!(decode(b"10:spam"), Err(BencodeError::UnexpectedEof)));
    // Would overflow a naive `pos + len` check.
    assert!(matches!(
        decode(b"18446744073709551615:x"),
        Err(BencodeError::UnexpectedEof)
    ));
}

#[test]
fn test_decode_list() {
    let result = decode(b"l4:spami42ee").unwrap();
    match result {
        Value::List(l) => {
            assert_eq!(l.len(), 2);
            assert_eq!(l[0], Value::Bytes(Bytes::from_static(b"spam")));
            assert_eq!(l[1], Value::Integer(42));
        }
        _ => panic!("expected list"),
    }
}

#[test]
fn test_decode_dict_keeps_source_order() {
    let result = decode(b"d4:spam4:eggs3:cow3:mooe").unwrap();
    let dict = result.as_dict().unwrap();
    let keys: Vec<&[u8]> = dict.keys().map(|k| k.as_ref()).collect();
    assert_eq!(keys, vec![b"spam".as_slice(), b"cow".as_slice()]);
    assert_eq!(
        dict.get(b"cow".as_slice()),
        Some(&Value::Bytes(Bytes::from_static(b"moo")))
    );
}

#[test]
fn test_decode_unterminated() {
    assert!(matches!(decode(b"l4:spam"), Err(BencodeError::UnexpectedEof)));
    assert!(matches!(decode(b"d3:cow3:moo"), Err(BencodeError::UnexpectedEof)));
    assert!(matches!(decode(b"i42"), Err(BencodeError::UnexpectedEof)));
}

#[test]
fn test_decode_dict_key_errors() {
    assert!(matches!(
        decode(b"di1e3:mooe"),
        Err(BencodeError::NonStringKey)
    ));
    assert!(matches!(
        decode(b"d3:cowi1e3:cowi2ee"),
        Err(BencodeError::DuplicateKey(k)) if k == "cow"
    ));
}

#[test]
fn test_nesting_limit() {
    let mut deep = vec![b'l'; 100];
    deep.extend(std::iter::repeat(b'e').take(100));
    assert!(matches!(decode(&deep), Err(BencodeError::NestingTooDeep)));
}

#[test]
fn test_encode_integer() {
    assert_eq!(encode(&Value::Integer(42)).unwrap(), b"i42e");
    assert_eq!(encode(&Value::Integer(-42)).unwrap(), b"i-42e");
    assert_eq!(encode(&Value::Integer(0)).unwrap(), b"i0e");
}

#[test]
fn test_encode_list() {
    let list = Value::List(vec![
        Value::Bytes(Bytes::from_static(b"spam")),
        Value::Integer(42),
    ]);
    assert_eq!(encode(&list).unwrap(), b"l4:spami42ee");
}

#[test]
fn test_encode_sorts_dict_keys() {
    let value = Value::dict([
        ("zebra", Value::Integer(1)),
        ("apple", Value::Integer(2)),
        ("mango", Value::dict([("b", Value::Integer(3)), ("a", Value::Integer(4))])),
    ]);
    assert_eq!(
        encode(&value).unwrap(),
        b"d5:applei2e5:mangod1:ai4e1:bi3ee5:zebrai1ee"
    );
}

#[test]
fn test_canonical_roundtrip() {
    let original = b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";
    let decoded = decode(original).unwrap();
    let encoded = encode(&decoded).unwrap();
    assert_eq!(encoded, original);
}

#[test]
fn test_unsorted_input_normalizes() {
    let unsorted = b"d4:infod12:piece lengthi16384e4:name4:teste8:announce15:http://test.come";
    let sorted = b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";

    let a = decode(unsorted).unwrap();
    let b = decode(sorted).unwrap();
    assert_eq!(a, b);
    assert_eq!(encode(&a).unwrap(), sorted);
}

#[test]
fn test_trailing_data_error() {
    assert!(matches!(
        decode(b"i42eextra"),
        Err(BencodeError::TrailingData(5))
    ));
}

#[test]
fn test_value_accessors() {
    let value = Value::Integer(42);
    assert_eq!(value.as_integer(), Some(42));
    assert!(value.as_bytes().is_none());

    let value = Value::Bytes(Bytes::from_static(b"test"));
    assert_eq!(value.as_str(), Some("test"));
    assert!(value.as_integer().is_none());

    let value = Value::List(vec![]);
    assert!(value.as_list().is_some());
    assert!(value.as_dict().is_none());
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::vec((prop::collection::vec(any::<u8>(), 0..8), inner), 0..6)
                .prop_map(|pairs| {
                    Value::Dict(
                        pairs
                            .into_iter()
                            .map(|(k, v)| (Bytes::from(k), v))
                            .collect(),
                    )
                }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_decode_encode_roundtrip(value in arb_value()) {
        let encoded = encode(&value).unwrap();
        let decoded = decode(&encoded).unwrap();
        prop_assert_eq!(&decoded, &value);

        // Canonical output is a fixed point.
        prop_assert_eq!(encode(&decoded).unwrap(), encoded);
    }
}
