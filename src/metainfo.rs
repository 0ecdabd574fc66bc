//! Torrent metainfo handling ([BEP-3]).
//!
//! A torrent file (`.torrent`) contains metadata about files to be shared:
//! - File names, sizes, and directory structure
//! - Piece hashes for data integrity verification
//! - Tracker URLs
//!
//! [`Metainfo`] is the parsed view. Its [`InfoHash`] is the SHA-1 of the
//! *canonical* re-encoding of the `info` dictionary, so two files that only
//! differ in key order or in the surrounding announce data share an id.
//!
//! # Examples
//!
//! ```
//! use nx::metainfo::{parse_torrent, compute_info_hash, TorrentBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = TorrentBuilder::new("example.txt")
//!     .piece_length(32)
//!     .add_file("example.txt", vec![7u8; 100])
//!     .add_tracker("http://tracker.example.com/announce")
//!     .build()?;
//!
//! let torrent = parse_torrent(&data)?;
//! assert_eq!(torrent.info.piece_count(), 4);
//! assert_eq!(compute_info_hash(&torrent), torrent.info_hash);
//!
//! for tracker in torrent.trackers() {
//!     println!("Tracker: {}", tracker);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Torrent Structure
//!
//! - **info** - Core torrent metadata (hashed to create the info hash)
//!   - `name` - Suggested file/directory name
//!   - `piece length` - Size of each piece in bytes
//!   - `pieces` - Concatenated SHA1 hashes of each piece
//!   - `length` - Total size (single-file) OR `files` list (multi-file)
//! - **announce** - Primary tracker URL
//! - **announce-list** - Additional tracker tiers (BEP-12)
//! - **creation date**, **comment**, **created by** - Optional descriptive fields
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod builder;
mod error;
mod info_hash;
mod torrent;

pub use builder::{TorrentBuilder, DEFAULT_PIECE_LENGTH};
pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use torrent::{compute_info_hash, parse_torrent, Announce, File, Info, Layout, Metainfo};
