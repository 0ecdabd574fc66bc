use super::error::BencodeError;
use super::value::Value;
use std::io::Write;

/// Encodes a bencode value to a byte vector in canonical form.
///
/// - Integers: `i<number>e` (shortest form)
/// - Byte strings: `<length>:<data>`
/// - Lists: `l<items>e`
/// - Dictionaries: `d<key><value>...e`, keys sorted by raw bytes regardless
///   of the order they were inserted or decoded in
///
/// Canonical output is what makes the info hash independent of how the
/// source file happened to order its keys.
///
/// # Examples
///
/// ```
/// use nx::bencode::{decode, encode, Value};
///
/// assert_eq!(encode(&Value::Integer(42)).unwrap(), b"i42e");
/// assert_eq!(encode(&Value::string("hello")).unwrap(), b"5:hello");
///
/// let unsorted = decode(b"d1:bi2e1:ai1ee").unwrap();
/// assert_eq!(encode(&unsorted).unwrap(), b"d1:ai1e1:bi2ee");
/// ```
pub fn encode(value: &Value) -> Result<Vec<u8>, BencodeError> {
    let mut buf = Vec::new();
    encode_value(value, &mut buf)?;
    Ok(buf)
}

fn encode_value<W: Write>(value: &Value, writer: &mut W) -> Result<(), BencodeError> {
    match value {
        Value::Integer(i) => {
            write!(writer, "i{}e", i)?;
        }
        Value::Bytes(b) => {
            write!(writer, "{}:", b.len())?;
            writer.write_all(b)?;
        }
        Value::List(l) => {
            writer.write_all(b"l")?;
            for item in l {
                encode_value(item, writer)?;
            }
            writer.write_all(b"e")?;
        }
        Value::Dict(d) => {
            let mut pairs: Vec<_> = d.iter().collect();
            pairs.sort_unstable_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()));

            writer.write_all(b"d")?;
            for (key, val) in pairs {
                write!(writer, "{}:", key.len())?;
                writer.write_all(key)?;
                encode_value(val, writer)?;
            }
            writer.write_all(b"e")?;
        }
    }
    Ok(())
}
