//! Builder for v1 torrent files.
//!
//! Produces canonical bencoded torrent bytes from in-memory file data. The
//! result parses back through [`Metainfo::from_bytes`](super::Metainfo::from_bytes)
//! and describes content that [`verify`](crate::verify::verify) can check.

use std::path::Path;

use sha1::{Digest, Sha1};

use super::error::MetainfoError;
use crate::bencode::{encode, Dict, Value};

/// Default piece length (256 KiB).
pub const DEFAULT_PIECE_LENGTH: u64 = 262144;

#[derive(Debug, Clone)]
struct BuilderFile {
    /// Path components for the file (relative to torrent root).
    path: Vec<String>,
    data: Vec<u8>,
}

/// Builder for creating torrent files.
///
/// A single file with a one-component path produces a single-file torrent
/// named after the builder; anything else produces a multi-file torrent whose
/// root directory is the builder's name.
#[derive(Debug)]
pub struct TorrentBuilder {
    name: String,
    files: Vec<BuilderFile>,
    piece_length: u64,
    announce: Option<String>,
    announce_list: Vec<Vec<String>>,
    private: bool,
    comment: Option<String>,
    created_by: Option<String>,
    creation_date: Option<i64>,
}

impl TorrentBuilder {
    /// Creates a new torrent builder with the given name.
    ///
    /// The name is used as:
    /// - The filename for single-file torrents
    /// - The root directory name for multi-file torrents
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            piece_length: DEFAULT_PIECE_LENGTH,
            announce: None,
            announce_list: Vec::new(),
            private: false,
            comment: None,
            created_by: Some(format!("nx/{}", env!("CARGO_PKG_VERSION"))),
            creation_date: None,
        }
    }

    pub fn piece_length(mut self, length: u64) -> Self {
        self.piece_length = length;
        self
    }

    /// Adds a file with raw data.
    ///
    /// The path is relative to the torrent root directory.
    pub fn add_file(mut self, path: impl AsRef<Path>, data: Vec<u8>) -> Self {
        let path_components: Vec<String> = path
            .as_ref()
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(s) => s.to_str().map(String::from),
                _ => None,
            })
            .collect();

        self.files.push(BuilderFile {
            path: path_components,
            data,
        });
        self
    }

    /// Sets the primary tracker URL, or appends a new tier once one is set.
    pub fn add_tracker(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if self.announce.is_none() {
            self.announce = Some(url);
        } else {
            self.announce_list.push(vec![url]);
        }
        self
    }

    pub fn add_tracker_tier(mut self, urls: Vec<String>) -> Self {
        self.announce_list.push(urls);
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Sets the creation date (Unix timestamp).
    pub fn creation_date(mut self, timestamp: i64) -> Self {
        self.creation_date = Some(timestamp);
        self
    }

    /// Builds the torrent file and returns the bencoded bytes.
    pub fn build(self) -> Result<Vec<u8>, MetainfoError> {
        self.validate()?;

        let mut root = Dict::new();
        root.insert("info".into(), self.build_info());

        if let Some(ref announce) = self.announce {
            root.insert("announce".into(), Value::string(announce));
        }

        if !self.announce_list.is_empty() {
            let list: Vec<Value> = self
                .announce_list
                .iter()
                .map(|tier| Value::List(tier.iter().map(|url| Value::string(url)).collect()))
                .collect();
            root.insert("announce-list".into(), Value::List(list));
        }

        if let Some(ref comment) = self.comment {
            root.insert("comment".into(), Value::string(comment));
        }

        if let Some(ref created_by) = self.created_by {
            root.insert("created by".into(), Value::string(created_by));
        }

        if let Some(date) = self.creation_date {
            root.insert("creation date".into(), Value::Integer(date));
        }

        Ok(encode(&Value::Dict(root))?)
    }

    fn validate(&self) -> Result<(), MetainfoError> {
        if self.name.is_empty() {
            return Err(MetainfoError::MissingField("name"));
        }

        if self.files.is_empty() {
            return Err(MetainfoError::MissingField("files"));
        }

        if self.piece_length == 0 {
            return Err(MetainfoError::InvalidField("piece length"));
        }

        for file in &self.files {
            if file.path.is_empty() {
                return Err(MetainfoError::InvalidField("file path"));
            }
        }

        Ok(())
    }

    fn is_single_file(&self) -> bool {
        self.files.len() == 1 && self.files[0].path.len() == 1
    }

    fn build_info(&self) -> Value {
        let mut info = Dict::new();
        info.insert("name".into(), Value::string(&self.name));
        info.insert(
            "piece length".into(),
            Value::Integer(self.piece_length as i64),
        );

        if self.private {
            info.insert("private".into(), Value::Integer(1));
        }

        let pieces: Vec<u8> = self.compute_pieces().into_iter().flatten().collect();
        info.insert("pieces".into(), Value::from(pieces));

        if self.is_single_file() {
            info.insert(
                "length".into(),
                Value::Integer(self.files[0].data.len() as i64),
            );
        } else {
            let files: Vec<Value> = self
                .files
                .iter()
                .map(|file| {
                    let path = file.path.iter().map(|c| Value::string(c)).collect();
                    Value::dict([
                        ("length", Value::Integer(file.data.len() as i64)),
                        ("path", Value::List(path)),
                    ])
                })
                .collect();
            info.insert("files".into(), Value::List(files));
        }

        Value::Dict(info)
    }

    /// Hashes the concatenated file data piece by piece without joining it.
    fn compute_pieces(&self) -> Vec<[u8; 20]> {
        let piece_length = self.piece_length as usize;
        let mut pieces = Vec::new();
        let mut hasher = Sha1::new();
        let mut filled = 0usize;

        for file in &self.files {
            let mut data = file.data.as_slice();
            while !data.is_empty() {
                let take = (piece_length - filled).min(data.len());
                hasher.update(&data[..take]);
                filled += take;
                data = &data[take..];

                if filled == piece_length {
                    pieces.push(hasher.finalize_reset().into());
                    filled = 0;
                }
            }
        }

        if filled > 0 {
            pieces.push(hasher.finalize().into());
        }

        pieces
    }
}
