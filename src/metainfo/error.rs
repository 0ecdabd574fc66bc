use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors that can occur when parsing or building torrent files.
#[derive(Debug, Error)]
pub enum MetainfoError {
    /// The torrent file contains invalid bencode.
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    /// A required field is missing from the torrent file.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field has an invalid value or type.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// The number of piece hashes does not cover the declared content.
    #[error("piece count mismatch: {total_length} bytes need {expected} pieces, found {actual}")]
    PieceCountMismatch {
        total_length: u64,
        expected: u64,
        actual: u64,
    },

    /// A file path component is empty, relative (`.`/`..`), or contains a separator.
    #[error("invalid path component: {0:?}")]
    InvalidPath(String),

    /// The value is not a 20-byte (40 hex character) info hash.
    #[error("invalid info hash: {0}")]
    InvalidInfoHash(String),
}
