use super::error::MetainfoError;
use super::info_hash::InfoHash;
use crate::bencode::{decode, encode, Value};
use crate::constants::PADDING_FILE_DIR;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

/// How the info dictionary describes its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// A top-level `length`; the content is one file named after the torrent.
    SingleFile,
    /// A `files` list; every path lives under a root directory named after the torrent.
    MultiFile,
}

/// A tracker URL and the announce tier it was listed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announce {
    pub url: String,
    pub tier: usize,
}

/// A parsed torrent file.
///
/// # Examples
///
/// ```
/// use nx::metainfo::{Metainfo, TorrentBuilder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let data = TorrentBuilder::new("release")
///     .piece_length(16)
///     .add_file("a.txt", b"hello world, this is a".to_vec())
///     .add_file("b.txt", b"second file".to_vec())
///     .build()?;
///
/// let metainfo = Metainfo::from_bytes(&data)?;
/// assert_eq!(metainfo.info.name, "release");
/// assert_eq!(metainfo.info.total_length, 33);
/// assert_eq!(metainfo.info.piece_count(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Metainfo {
    /// The info dictionary containing file and piece information.
    pub info: Info,
    /// SHA-1 of the canonical info dictionary.
    pub info_hash: InfoHash,
    /// Tracker URLs from `announce` and `announce-list`, deduplicated, in order.
    pub announce: Vec<Announce>,
    /// Unix timestamp when the torrent was created.
    pub creation_date: Option<i64>,
    pub comment: Option<String>,
    /// Name/version of the program that created the torrent.
    pub created_by: Option<String>,
    raw_info: Bytes,
}

/// The info dictionary from a torrent file.
#[derive(Debug, Clone)]
pub struct Info {
    /// Suggested name for the file or directory.
    pub name: String,
    /// Number of bytes per piece.
    pub piece_length: u64,
    /// SHA1 hash of each piece (20 bytes each).
    pub pieces: Vec<[u8; 20]>,
    /// Files in the order they appear in the piece stream.
    pub files: Vec<File>,
    /// Total size of all files combined.
    pub total_length: u64,
    pub private: bool,
    pub layout: Layout,
}

/// A file within a torrent.
///
/// For single-file torrents, there is one file with the torrent name.
/// For multi-file torrents, the path starts with the torrent's root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Path to the file as recorded by the torrent, root directory included.
    pub path: PathBuf,
    /// Size of the file in bytes.
    pub length: u64,
    /// Byte offset within the torrent's piece data.
    pub offset: u64,
    /// BEP-47 padding file: its bytes are zeros and it is never stored on disk.
    pub padding: bool,
}

impl File {
    pub fn byte_range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.length
    }
}

/// Parses a torrent file. Alias of [`Metainfo::from_bytes`].
pub fn parse_torrent(data: &[u8]) -> Result<Metainfo, MetainfoError> {
    Metainfo::from_bytes(data)
}

/// Recomputes the info hash from the canonical encoding of the info dictionary.
pub fn compute_info_hash(metainfo: &Metainfo) -> InfoHash {
    InfoHash::from_info_bytes(&metainfo.raw_info)
}

impl Metainfo {
    /// Parses a torrent file from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The data is not valid bencode
    /// - Required fields are missing (info, name, piece length, pieces, length/files)
    /// - The pieces field length is not a multiple of 20
    /// - The number of pieces does not match the total content length
    /// - A file path contains an unsafe component
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        let value = decode(data)?;
        let dict = value.as_dict().ok_or(MetainfoError::InvalidField("root"))?;

        let info_value = dict
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?;

        let raw_info = Bytes::from(encode(info_value)?);
        let info_hash = InfoHash::from_info_bytes(&raw_info);
        let info = parse_info(info_value)?;

        let mut announce: Vec<Announce> = Vec::new();
        let mut push_tracker = |url: &str, tier: usize| {
            if !announce.iter().any(|a| a.url == url) {
                announce.push(Announce {
                    url: url.to_string(),
                    tier,
                });
            }
        };

        if let Some(url) = dict.get(b"announce".as_slice()).and_then(|v| v.as_str()) {
            push_tracker(url, 0);
        }

        if let Some(tiers) = dict
            .get(b"announce-list".as_slice())
            .and_then(|v| v.as_list())
        {
            for (tier, urls) in tiers.iter().enumerate() {
                for url in urls.as_list().into_iter().flatten() {
                    if let Some(url) = url.as_str() {
                        push_tracker(url, tier);
                    }
                }
            }
        }

        let creation_date = dict
            .get(b"creation date".as_slice())
            .and_then(|v| v.as_integer());

        let comment = dict
            .get(b"comment".as_slice())
            .and_then(|v| v.as_str())
            .map(String::from);

        let created_by = dict
            .get(b"created by".as_slice())
            .and_then(|v| v.as_str())
            .map(String::from);

        tracing::debug!(
            name = %info.name,
            info_hash = %info_hash,
            files = info.files.len(),
            pieces = info.pieces.len(),
            trackers = announce.len(),
            "parsed torrent"
        );

        Ok(Self {
            info,
            info_hash,
            announce,
            creation_date,
            comment,
            created_by,
            raw_info,
        })
    }

    /// Returns the canonical bencoded info dictionary.
    pub fn raw_info(&self) -> &Bytes {
        &self.raw_info
    }

    /// Returns the tracker URLs in announce order.
    pub fn trackers(&self) -> impl Iterator<Item = &str> {
        self.announce.iter().map(|a| a.url.as_str())
    }

    pub fn is_multi_file(&self) -> bool {
        self.info.layout == Layout::MultiFile
    }

    /// Returns the first path component shared by every file, if any.
    ///
    /// Single-file torrents have no root directory to strip, so this is
    /// `None` for them; so is a torrent whose files disagree on the root.
    pub fn common_root(&self) -> Option<&str> {
        let mut root: Option<&str> = None;
        for file in &self.info.files {
            let mut components = file.path.components();
            let first = match components.next() {
                Some(Component::Normal(c)) => c.to_str()?,
                _ => return None,
            };
            components.next()?;

            match root {
                None => root = Some(first),
                Some(r) if r != first => {
                    tracing::debug!(id = %self.info_hash, "multiple root components");
                    return None;
                }
                Some(_) => {}
            }
        }
        root
    }
}

impl Info {
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Returns the size of a piece; only the final piece may be short.
    pub fn piece_size(&self, index: usize) -> u64 {
        let start = index as u64 * self.piece_length;
        if start >= self.total_length {
            return 0;
        }
        (self.total_length - start).min(self.piece_length)
    }

    /// Returns the byte range a piece covers in the concatenated content.
    pub fn piece_range(&self, index: usize) -> std::ops::Range<u64> {
        let start = index as u64 * self.piece_length;
        start..start + self.piece_size(index)
    }
}

fn parse_info(value: &Value) -> Result<Info, MetainfoError> {
    let dict = value.as_dict().ok_or(MetainfoError::InvalidField("info"))?;

    let name = dict
        .get(b"name".as_slice())
        .and_then(|v| v.as_str())
        .ok_or(MetainfoError::MissingField("name"))?
        .to_string();
    validate_component(&name)?;

    let piece_length = dict
        .get(b"piece length".as_slice())
        .and_then(|v| v.as_integer())
        .ok_or(MetainfoError::MissingField("piece length"))?;
    if piece_length <= 0 {
        return Err(MetainfoError::InvalidField("piece length"));
    }
    let piece_length = piece_length as u64;

    let pieces_bytes = dict
        .get(b"pieces".as_slice())
        .and_then(|v| v.as_bytes())
        .ok_or(MetainfoError::MissingField("pieces"))?;

    if pieces_bytes.len() % 20 != 0 {
        return Err(MetainfoError::InvalidField("pieces"));
    }

    let pieces: Vec<[u8; 20]> = pieces_bytes
        .chunks_exact(20)
        .map(|chunk| {
            let mut arr = [0u8; 20];
            arr.copy_from_slice(chunk);
            arr
        })
        .collect();

    let private = dict
        .get(b"private".as_slice())
        .and_then(|v| v.as_integer())
        .map(|v| v == 1)
        .unwrap_or(false);

    let (files, total_length, layout) =
        if let Some(files_list) = dict.get(b"files".as_slice()).and_then(|v| v.as_list()) {
            let files = parse_files(&name, files_list)?;
            let total = files.last().map(|f| f.offset + f.length).unwrap_or(0);
            (files, total, Layout::MultiFile)
        } else if let Some(length) = dict.get(b"length".as_slice()).and_then(|v| v.as_integer()) {
            let length = non_negative(length, "length")?;
            let file = File {
                path: PathBuf::from(&name),
                length,
                offset: 0,
                padding: false,
            };
            (vec![file], length, Layout::SingleFile)
        } else {
            return Err(MetainfoError::MissingField("length or files"));
        };

    let expected = total_length.div_ceil(piece_length);
    if expected != pieces.len() as u64 {
        return Err(MetainfoError::PieceCountMismatch {
            total_length,
            expected,
            actual: pieces.len() as u64,
        });
    }

    Ok(Info {
        name,
        piece_length,
        pieces,
        files,
        total_length,
        private,
        layout,
    })
}

fn parse_files(name: &str, files_list: &[Value]) -> Result<Vec<File>, MetainfoError> {
    let mut files = Vec::with_capacity(files_list.len());
    let mut offset = 0u64;

    for file_value in files_list {
        let file_dict = file_value
            .as_dict()
            .ok_or(MetainfoError::InvalidField("files"))?;

        let length = file_dict
            .get(b"length".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or(MetainfoError::MissingField("file length"))?;
        let length = non_negative(length, "file length")?;

        let path_list = file_dict
            .get(b"path".as_slice())
            .and_then(|v| v.as_list())
            .ok_or(MetainfoError::MissingField("file path"))?;

        if path_list.is_empty() {
            return Err(MetainfoError::InvalidField("file path"));
        }

        let mut path = PathBuf::from(name);
        for component in path_list {
            let component = component
                .as_str()
                .ok_or(MetainfoError::InvalidField("file path"))?;
            validate_component(component)?;
            path.push(component);
        }

        let attr_padding = file_dict
            .get(b"attr".as_slice())
            .and_then(|v| v.as_str())
            .is_some_and(|attr| attr.contains('p'));
        let dir_padding = path_list
            .first()
            .and_then(|v| v.as_str())
            .is_some_and(|first| first == PADDING_FILE_DIR);

        files.push(File {
            path,
            length,
            offset,
            padding: attr_padding || dir_padding,
        });

        offset = offset
            .checked_add(length)
            .ok_or(MetainfoError::InvalidField("file length"))?;
    }

    Ok(files)
}

fn non_negative(value: i64, field: &'static str) -> Result<u64, MetainfoError> {
    u64::try_from(value).map_err(|_| MetainfoError::InvalidField(field))
}

fn validate_component(component: &str) -> Result<(), MetainfoError> {
    let mut components = Path::new(component).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == component => Ok(()),
        _ => Err(MetainfoError::InvalidPath(component.to_string())),
    }
}
