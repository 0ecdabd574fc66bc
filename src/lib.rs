//! nx - sidecar torrent metadata stores
//!
//! This library keeps a small checksummed store (`.nx_store`) next to a
//! downloaded release. The store records the torrents that produced the
//! release and lets the files be re-verified later against the torrents'
//! piece hashes.
//!
//! # Modules
//!
//! - [`bencode`] - Bencode decoding and canonical encoding
//! - [`metainfo`] - Torrent metainfo, info hashes, and a torrent builder
//! - [`store`] - The persisted, checksummed entry collection
//! - [`placement`] - Where a store goes relative to a release, and its strip depth
//! - [`verify`] - Piece-level verification of on-disk data
//! - [`repo`] - The add and verify workflows
//! - [`config`] - Explicit configuration for the workflows

pub mod bencode;
pub mod config;
pub mod constants;
pub mod metainfo;
pub mod placement;
pub mod repo;
pub mod store;
pub mod verify;

pub use bencode::{decode, encode, BencodeError, Value};
pub use config::Config;
pub use metainfo::{
    compute_info_hash, parse_torrent, File, Info, InfoHash, Metainfo, MetainfoError,
    TorrentBuilder,
};
pub use placement::{resolve_placement, Placement, PlacementError, PlacementOptions};
pub use store::{Entry, Store, StoreError, TorrentEntry};
pub use verify::{Status, VerificationReport, VerifyError};
