use std::path::PathBuf;

use thiserror::Error;

use super::entry::EntryKind;
use crate::metainfo::InfoHash;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the store magic marker.
    #[error("not an nx store: invalid magic marker")]
    InvalidMagic,

    /// The file is not a well-formed store document.
    #[error("malformed store: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("store checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("invalid entry {id}: {reason}")]
    InvalidEntry { id: InfoHash, reason: String },

    #[error("duplicate entry: {0}")]
    DuplicateEntry(InfoHash),

    #[error("cannot change type of entry {id} from {existing} to {new}")]
    EntryTypeChanged {
        id: InfoHash,
        existing: EntryKind,
        new: EntryKind,
    },

    #[error("no entry matches {0:?}")]
    NotFound(String),

    #[error("identifier {prefix:?} is ambiguous, matches {} entries", .candidates.len())]
    Ambiguous {
        prefix: String,
        candidates: Vec<InfoHash>,
    },

    #[error("store directory does not exist: {}", .0.display())]
    MissingParent(PathBuf),
}

impl StoreError {
    /// Returns `true` for errors that mean the store file itself is damaged.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidMagic
                | StoreError::Malformed(_)
                | StoreError::ChecksumMismatch { .. }
                | StoreError::InvalidEntry { .. }
                | StoreError::DuplicateEntry(_)
        )
    }
}
