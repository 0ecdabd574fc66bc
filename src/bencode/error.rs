use thiserror::Error;

/// A malformed bencode stream.
#[derive(Debug, Error)]
pub enum BencodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    #[error("invalid string length")]
    InvalidStringLength,

    #[error("unexpected character: {0:?}")]
    UnexpectedChar(char),

    #[error("dictionary key is not a byte string")]
    NonStringKey,

    #[error("duplicate dictionary key: {0}")]
    DuplicateKey(String),

    #[error("{0} bytes of trailing data after value")]
    TrailingData(usize),

    #[error("nesting too deep")]
    NestingTooDeep,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
