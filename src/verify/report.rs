use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metainfo::InfoHash;

/// Outcome for a piece, a file, or a whole torrent.
///
/// Variants are ordered from best to worst, so aggregating is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Match,
    Mismatch,
    /// The data could not be read: a file is absent, not a regular file, or too short.
    MissingData,
}

impl Status {
    pub fn worst(self, other: Status) -> Status {
        self.max(other)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Match => f.write_str("match"),
            Status::Mismatch => f.write_str("mismatch"),
            Status::MissingData => f.write_str("missing data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Path as recorded in the torrent.
    pub path: PathBuf,
    pub disk_path: PathBuf,
    pub length: u64,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub id: InfoHash,
    pub status: Status,
    /// Status of every piece, by index.
    pub pieces: Vec<Status>,
    /// Non-padding files in torrent order.
    pub files: Vec<FileReport>,
    pub bad_pieces: Vec<usize>,
    /// Bytes covered by pieces that did not match.
    pub bad_bytes: u64,
    pub total_bytes: u64,
    /// Truncated to whole seconds, the precision the store keeps.
    pub checked_at: DateTime<Utc>,
}

impl VerificationReport {
    pub fn is_match(&self) -> bool {
        self.status == Status::Match
    }

    pub fn count(&self, status: Status) -> usize {
        self.pieces.iter().filter(|&&s| s == status).count()
    }

    pub fn file_status(&self, path: impl AsRef<std::path::Path>) -> Option<Status> {
        let path = path.as_ref();
        self.files.iter().find(|f| f.path == path).map(|f| f.status)
    }
}
