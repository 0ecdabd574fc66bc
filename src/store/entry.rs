use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::INTERNAL_META_KEY;
use crate::metainfo::{InfoHash, Metainfo, MetainfoError};
use crate::verify::{Status, VerificationReport};

/// A store entry.
///
/// The `type` tag is explicit in the file format; new kinds of entries are
/// added as new variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Torrent(TorrentEntry),
}

/// The `type` tag of an [`Entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Torrent,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Torrent => f.write_str("torrent"),
        }
    }
}

impl Entry {
    pub fn id(&self) -> InfoHash {
        match self {
            Entry::Torrent(t) => t.id,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Torrent(_) => EntryKind::Torrent,
        }
    }

    pub fn nx(&self) -> &NxMeta {
        match self {
            Entry::Torrent(t) => &t.nx,
        }
    }

    pub fn nx_mut(&mut self) -> &mut NxMeta {
        match self {
            Entry::Torrent(t) => &mut t.nx,
        }
    }

    pub fn as_torrent(&self) -> Option<&TorrentEntry> {
        match self {
            Entry::Torrent(t) => Some(t),
        }
    }

    pub fn as_torrent_mut(&mut self) -> Option<&mut TorrentEntry> {
        match self {
            Entry::Torrent(t) => Some(t),
        }
    }

    /// Checks that the id is the info hash of the stored torrent bytes and
    /// that custom metadata stays out of the reserved key.
    pub(super) fn validate(&self) -> Result<(), String> {
        if self.nx().custom.contains_key(INTERNAL_META_KEY) {
            return Err(format!("custom metadata uses reserved key {INTERNAL_META_KEY}"));
        }

        match self {
            Entry::Torrent(t) => {
                let metainfo = t.metainfo().map_err(|e| e.to_string())?;
                if metainfo.info_hash != t.id {
                    return Err(format!("torrent hashes to {}", metainfo.info_hash));
                }
                Ok(())
            }
        }
    }
}

impl From<TorrentEntry> for Entry {
    fn from(entry: TorrentEntry) -> Self {
        Entry::Torrent(entry)
    }
}

/// One torrent and the metadata nx keeps about it.
///
/// The torrent bytes are kept exactly as they were added, never re-encoded,
/// so the original `.torrent` file can be exported byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TorrentEntry {
    id: InfoHash,
    #[serde(with = "base64_bytes")]
    torrent: Bytes,
    pub nx: NxMeta,
}

impl TorrentEntry {
    /// Parses `torrent` and wraps it with fresh metadata.
    pub fn from_torrent_bytes(
        torrent: impl Into<Bytes>,
        strip_components: usize,
    ) -> Result<Self, MetainfoError> {
        let torrent = torrent.into();
        let metainfo = Metainfo::from_bytes(&torrent)?;
        Ok(Self::new(&metainfo, torrent, strip_components))
    }

    /// Wraps already parsed torrent bytes. `torrent` must be the bytes `metainfo`
    /// was parsed from.
    pub fn new(metainfo: &Metainfo, torrent: Bytes, strip_components: usize) -> Self {
        Self {
            id: metainfo.info_hash,
            torrent,
            nx: NxMeta {
                internal: NxInternal {
                    strip_components,
                    ..NxInternal::default()
                },
                custom: BTreeMap::new(),
            },
        }
    }

    pub fn id(&self) -> InfoHash {
        self.id
    }

    /// The original torrent file, unmodified.
    pub fn torrent_bytes(&self) -> &Bytes {
        &self.torrent
    }

    pub fn metainfo(&self) -> Result<Metainfo, MetainfoError> {
        Metainfo::from_bytes(&self.torrent)
    }

    pub fn strip_components(&self) -> usize {
        self.nx.internal.strip_components
    }

    pub fn is_ready(&self) -> bool {
        self.nx.internal.ready
    }

    /// Stores the outcome of a verification in the internal block.
    ///
    /// `ready` follows the latest result: it is set on a full match and
    /// cleared otherwise.
    pub fn record_verification(&mut self, report: &VerificationReport) {
        self.nx.internal.last_verified = Some(LastVerified {
            timestamp: report.checked_at,
            status: report.status,
        });
        self.nx.internal.ready = report.status == Status::Match;
    }
}

/// The `nx` block of an entry.
///
/// `@internal` belongs to this crate. Every other key is user data that is
/// preserved but never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NxMeta {
    #[serde(rename = "@internal")]
    pub internal: NxInternal,
    #[serde(flatten)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NxInternal {
    /// Leading path components dropped from torrent paths when locating files.
    pub strip_components: usize,
    /// Set once the on-disk data has fully matched the torrent.
    pub ready: bool,
    pub last_verified: Option<LastVerified>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LastVerified {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub status: Status,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
