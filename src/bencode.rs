//! Bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format of `.torrent` files. The decoder keeps
//! dictionary keys in the order they appear in the input; the encoder always
//! produces the canonical form (keys sorted by raw bytes, shortest-form
//! integers), so re-encoding a decoded info dictionary yields stable bytes for
//! the info hash.
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! # Examples
//!
//! ```
//! use nx::bencode::{decode, encode, Value};
//!
//! let value = decode(b"d4:spaml1:a1:bee").unwrap();
//! let list = value.get(b"spam").and_then(Value::as_list).unwrap();
//! assert_eq!(list.len(), 2);
//!
//! assert_eq!(encode(&value).unwrap(), b"d4:spaml1:a1:bee");
//! ```
//!
//! # Error Handling
//!
//! - [`BencodeError::UnexpectedEof`] - Input ended unexpectedly, including a
//!   string whose declared length runs past the end of the input
//! - [`BencodeError::InvalidInteger`] - Malformed integer (e.g., leading zeros)
//! - [`BencodeError::InvalidStringLength`] - Non-numeric or negative length prefix
//! - [`BencodeError::NestingTooDeep`] - Recursion limit exceeded (max 64 levels)
//! - [`BencodeError::TrailingData`] - Extra data after the value
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod value;

pub use decode::decode;
pub use encode::encode;
pub use error::BencodeError;
pub use value::{Dict, Value};

#[cfg(test)]
mod tests;
