//! Piece-level verification of on-disk data.
//!
//! A torrent's content is the concatenation of its files, cut into pieces
//! of `piece length` bytes. Pieces do not respect file boundaries, so a
//! piece can need the tail of one file and the head of the next. The
//! [`FileMap`] turns a piece's byte range into per-file spans using a
//! prefix sum over file lengths; the verifier streams those spans, in file
//! order, through SHA-1 and compares against the stored hash.
//!
//! Outcomes are data, not errors: each piece and file gets a [`Status`], and
//! only failures that stop the scan (a file that exists but cannot be read,
//! an I/O error mid-read) surface as [`VerifyError`].
//!
//! # Examples
//!
//! ```
//! use nx::config::Config;
//! use nx::metainfo::{Metainfo, TorrentBuilder};
//! use nx::verify::{verify_torrent, Status};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("a.bin"), [7u8; 50])?;
//!
//! let data = TorrentBuilder::new("a.bin")
//!     .piece_length(16)
//!     .add_file("a.bin", vec![7u8; 50])
//!     .build()?;
//! let metainfo = Metainfo::from_bytes(&data)?;
//!
//! let report = verify_torrent(&metainfo, dir.path(), 0, &Config::default()).await?;
//! assert_eq!(report.status, Status::Match);
//! assert_eq!(report.pieces.len(), 4);
//! # Ok(())
//! # }
//! ```

mod error;
mod file_map;
mod reader;
mod report;
mod verifier;

pub use error::VerifyError;
pub use file_map::{match_files, FileMap, FileMatch, FileSpan, MappedFile};
pub use report::{FileReport, Status, VerificationReport};
pub use verifier::{verify, verify_torrent};
