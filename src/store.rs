//! Persisted, checksummed collections of torrent entries.
//!
//! A store lives in a `.nx_store` file next to (or inside) the release it
//! describes. The file is compact JSON:
//!
//! ```text
//! {"magic":"AF42…","entries":[{"type":"torrent","id":"<HEX>","torrent":"<base64>",
//!   "nx":{"@internal":{"strip_components":1,"ready":true,"last_verified":null}}}],
//!  "checksum":"<HEX>"}
//! ```
//!
//! The checksum is the uppercase SHA-1 of the same document with an empty
//! checksum field. Loading rejects a wrong magic marker, a checksum mismatch,
//! duplicate ids, and entries whose id is not the info hash of their torrent;
//! nothing is ever repaired. Saving writes a temporary file in the same
//! directory and renames it over the old one.
//!
//! # Examples
//!
//! ```
//! use nx::metainfo::TorrentBuilder;
//! use nx::store::{Store, TorrentEntry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join(".nx_store");
//!
//! let torrent = TorrentBuilder::new("a.bin").add_file("a.bin", vec![1; 10]).build()?;
//! let entry = TorrentEntry::from_torrent_bytes(torrent, 0)?;
//! let id = entry.id();
//!
//! let mut store = Store::open_or_default(&path)?;
//! store.upsert(entry)?;
//! store.save(&path)?;
//!
//! let loaded = Store::load(&path)?;
//! assert_eq!(loaded, store);
//! assert_eq!(loaded.find(&id.to_hex()[..6])?.id(), id);
//! # Ok(())
//! # }
//! ```

mod collection;
mod entry;
mod error;
mod persist;

pub use collection::{Store, Upsert};
pub use entry::{Entry, EntryKind, LastVerified, NxInternal, NxMeta, TorrentEntry};
pub use error::StoreError;
